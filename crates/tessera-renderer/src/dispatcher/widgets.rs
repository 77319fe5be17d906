//! Widget construction and per-widget state.

use std::sync::Arc;

use tessera_common::{CallbackId, WidgetHandle, WidgetKind};
use tessera_protocol::{BridgeEvent, Reply, RpcError};
use tracing::debug;

use super::Dispatcher;
use crate::registry::Released;
use crate::toolkit::WidgetParams;

impl Dispatcher {
    // =========================================================================
    // Construction
    // =========================================================================

    fn create(
        &self,
        handle: WidgetHandle,
        kind: WidgetKind,
        params: WidgetParams,
        callback: Option<CallbackId>,
        resource: Option<String>,
    ) -> Result<Reply, RpcError> {
        self.registry.ensure_fresh(&handle)?;
        let toolkit = self.toolkit.clone();
        let native = self.on_ui(move || toolkit.create_widget(kind, &params))?;
        if let Err(e) = self.registry.insert_widget(
            handle.clone(),
            kind,
            native.clone(),
            callback,
            resource,
        ) {
            // Lost a race for the same id.
            self.release(vec![Released { handle, native }]);
            return Err(e.into());
        }
        debug!(widget_id = %handle, kind = %kind, "widget created");
        Ok(Reply::Ack)
    }

    pub(super) fn create_label(&self, handle: WidgetHandle, text: String) -> Result<Reply, RpcError> {
        let params = WidgetParams {
            text: Some(text),
            ..Default::default()
        };
        self.create(handle, WidgetKind::Label, params, None, None)
    }

    pub(super) fn create_button(
        &self,
        handle: WidgetHandle,
        text: String,
        callback: Option<CallbackId>,
    ) -> Result<Reply, RpcError> {
        let params = WidgetParams {
            text: Some(text),
            ..Default::default()
        };
        self.create(handle, WidgetKind::Button, params, callback, None)
    }

    pub(super) fn create_box(&self, handle: WidgetHandle, kind: WidgetKind) -> Result<Reply, RpcError> {
        self.create(handle, kind, WidgetParams::default(), None, None)
    }

    pub(super) fn create_grid(&self, handle: WidgetHandle, columns: u32) -> Result<Reply, RpcError> {
        if columns == 0 {
            return Err(RpcError::invalid_request("grid needs at least one column"));
        }
        let params = WidgetParams {
            columns: Some(columns),
            ..Default::default()
        };
        self.create(handle, WidgetKind::Grid, params, None, None)
    }

    /// Image bytes come from a named resource (with scope fallback) or
    /// inline data; a named resource wins when both are given.
    pub(super) fn create_image(
        &self,
        handle: WidgetHandle,
        resource: Option<String>,
        data: Option<Vec<u8>>,
        width: Option<u32>,
        height: Option<u32>,
        callback: Option<CallbackId>,
    ) -> Result<Reply, RpcError> {
        let image = self.image_source(resource.as_deref(), data)?;
        let params = WidgetParams {
            image,
            width,
            height,
            ..Default::default()
        };
        self.create(handle, WidgetKind::Image, params, callback, resource)
    }

    fn image_source(
        &self,
        resource: Option<&str>,
        data: Option<Vec<u8>>,
    ) -> Result<Option<Arc<Vec<u8>>>, RpcError> {
        match (resource, data) {
            (Some(name), _) => Ok(Some(self.registry.resolve_resource(name)?)),
            (None, Some(bytes)) => Ok(Some(Arc::new(bytes))),
            (None, None) => Ok(None),
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    pub(super) fn set_visible(&self, handle: &WidgetHandle, visible: bool) -> Result<Reply, RpcError> {
        let widget = self.registry.widget(handle)?;
        self.on_ui(move || {
            widget.native.set_visible(visible);
            Ok(())
        })?;
        Ok(Reply::Ack)
    }

    pub(super) fn set_enabled(&self, handle: &WidgetHandle, enabled: bool) -> Result<Reply, RpcError> {
        let widget = self.registry.widget(handle)?;
        self.on_ui(move || {
            widget.native.set_enabled(enabled);
            Ok(())
        })?;
        Ok(Reply::Ack)
    }

    pub(super) fn set_text(&self, handle: &WidgetHandle, text: String) -> Result<Reply, RpcError> {
        let widget = self.registry.widget(handle)?;
        self.on_ui(move || widget.native.set_text(&text))?;
        Ok(Reply::Ack)
    }

    pub(super) fn update_image(
        &self,
        handle: &WidgetHandle,
        resource: Option<String>,
        data: Option<Vec<u8>>,
    ) -> Result<Reply, RpcError> {
        let widget = self.registry.widget(handle)?;
        let Some(image) = self.image_source(resource.as_deref(), data)? else {
            return Err(RpcError::invalid_request(
                "update_image needs a resource or data",
            ));
        };
        self.on_ui(move || widget.native.set_image(image))?;
        self.registry.set_image_resource(handle, resource);
        Ok(Reply::Ack)
    }

    /// Native tap on the UI thread. A widget that activates and carries a
    /// callback id pushes a `callback` event.
    pub(super) fn click_widget(&self, handle: &WidgetHandle) -> Result<Reply, RpcError> {
        let widget = self.registry.widget(handle)?;
        let native = widget.native.clone();
        let activated = self.on_ui(move || native.tap())?;
        match (activated, widget.callback) {
            (true, Some(callback_id)) => self.publish(BridgeEvent::Callback {
                callback_id,
                widget_id: handle.clone(),
            }),
            (false, _) => debug!(widget_id = %handle, "click ignored by inactive widget"),
            (true, None) => {}
        }
        Ok(Reply::Ack)
    }

    /// Detach from the native parent, then tear the subtree down. Unknown
    /// or already-removed handles succeed.
    pub(super) fn destroy_widget(&self, handle: &WidgetHandle) -> Result<Reply, RpcError> {
        let plan = self.registry.teardown(handle);
        if plan.is_empty() {
            debug!(widget_id = %handle, "destroy of unknown or retired handle");
            return Ok(Reply::Ack);
        }
        let removed = plan.released.len();
        let detach_from = plan.detach_from;
        let root = plan.root;
        let windows = plan.cleared_windows;
        self.on_ui(move || {
            if let (Some(parent), Some(root)) = (detach_from, root) {
                parent.remove_child(&root)?;
            }
            for w in windows {
                w.set_content(None);
            }
            Ok(())
        })?;
        self.release(plan.released);
        debug!(widget_id = %handle, removed, "widget destroyed");
        Ok(Reply::Ack)
    }
}
