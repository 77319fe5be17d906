//! Events the renderer pushes without a matching request.

use serde::{Deserialize, Serialize};
use tessera_common::{CallbackId, WidgetHandle, WindowId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// A widget with a registered callback id was activated.
    Callback {
        callback_id: CallbackId,
        widget_id: WidgetHandle,
    },
    WindowResized {
        window_id: WindowId,
        width: u32,
        height: u32,
    },
    WindowClosed {
        window_id: WindowId,
    },
}
