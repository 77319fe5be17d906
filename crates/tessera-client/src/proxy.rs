//! Typed client proxy: one method per bridge operation.
//!
//! Calls on different handles may be issued concurrently and complete in
//! any order. Calls that depend on each other (create, then add to a
//! container) must be awaited in sequence.

use std::sync::Arc;

use tessera_common::{CallbackId, WidgetHandle, WindowId};
use tessera_protocol::{BridgeEvent, Operation, Reply, SelectorType};
use tokio::sync::broadcast;

use crate::transport::Transport;
use crate::ClientError;

/// Where an image widget gets its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A registered resource name, usually `scope:name`.
    Resource(String),
    /// Inline bytes.
    Bytes(Vec<u8>),
}

impl ImageSource {
    fn split(self) -> (Option<String>, Option<Vec<u8>>) {
        match self {
            Self::Resource(name) => (Some(name), None),
            Self::Bytes(data) => (None, Some(data)),
        }
    }
}

#[derive(Clone)]
pub struct BridgeClient {
    transport: Arc<dyn Transport>,
}

fn unexpected(op: &'static str, reply: Reply) -> ClientError {
    ClientError::UnexpectedReply {
        op,
        reply: format!("{reply:?}"),
    }
}

impl BridgeClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn events(&self) -> broadcast::Receiver<BridgeEvent> {
        self.transport.events()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    async fn ack(&self, op: Operation) -> Result<(), ClientError> {
        let name = op.name();
        match self.transport.call(op).await? {
            Reply::Ack => Ok(()),
            other => Err(unexpected(name, other)),
        }
    }

    // =========================================================================
    // Windows
    // =========================================================================

    pub async fn create_window(
        &self,
        window_id: &WindowId,
        title: &str,
        width: u32,
        height: u32,
        fixed_size: bool,
    ) -> Result<(), ClientError> {
        self.ack(Operation::CreateWindow {
            window_id: window_id.clone(),
            title: title.to_string(),
            width,
            height,
            fixed_size,
        })
        .await
    }

    pub async fn show_window(&self, window_id: &WindowId) -> Result<(), ClientError> {
        self.ack(Operation::ShowWindow {
            window_id: window_id.clone(),
        })
        .await
    }

    pub async fn resize_window(
        &self,
        window_id: &WindowId,
        width: u32,
        height: u32,
    ) -> Result<(), ClientError> {
        self.ack(Operation::ResizeWindow {
            window_id: window_id.clone(),
            width,
            height,
        })
        .await
    }

    pub async fn set_window_title(&self, window_id: &WindowId, title: &str) -> Result<(), ClientError> {
        self.ack(Operation::SetWindowTitle {
            window_id: window_id.clone(),
            title: title.to_string(),
        })
        .await
    }

    pub async fn window_size(&self, window_id: &WindowId) -> Result<(u32, u32), ClientError> {
        match self
            .transport
            .call(Operation::GetWindowSize {
                window_id: window_id.clone(),
            })
            .await?
        {
            Reply::WindowSize { width, height } => Ok((width, height)),
            other => Err(unexpected("get_window_size", other)),
        }
    }

    pub async fn set_content(
        &self,
        window_id: &WindowId,
        widget_id: &WidgetHandle,
    ) -> Result<(), ClientError> {
        self.ack(Operation::SetContent {
            window_id: window_id.clone(),
            widget_id: widget_id.clone(),
        })
        .await
    }

    // =========================================================================
    // Construction
    // =========================================================================

    pub async fn create_label(&self, widget_id: &WidgetHandle, text: &str) -> Result<(), ClientError> {
        self.ack(Operation::CreateLabel {
            widget_id: widget_id.clone(),
            text: text.to_string(),
        })
        .await
    }

    pub async fn create_button(
        &self,
        widget_id: &WidgetHandle,
        text: &str,
        callback_id: Option<&CallbackId>,
    ) -> Result<(), ClientError> {
        self.ack(Operation::CreateButton {
            widget_id: widget_id.clone(),
            text: text.to_string(),
            callback_id: callback_id.cloned(),
        })
        .await
    }

    pub async fn create_image(
        &self,
        widget_id: &WidgetHandle,
        source: ImageSource,
        size: Option<(u32, u32)>,
        callback_id: Option<&CallbackId>,
    ) -> Result<(), ClientError> {
        let (resource, data) = source.split();
        self.ack(Operation::CreateImage {
            widget_id: widget_id.clone(),
            resource,
            data,
            width: size.map(|(w, _)| w),
            height: size.map(|(_, h)| h),
            callback_id: callback_id.cloned(),
        })
        .await
    }

    pub async fn create_vbox(&self, widget_id: &WidgetHandle) -> Result<(), ClientError> {
        self.ack(Operation::CreateVBox {
            widget_id: widget_id.clone(),
        })
        .await
    }

    pub async fn create_hbox(&self, widget_id: &WidgetHandle) -> Result<(), ClientError> {
        self.ack(Operation::CreateHBox {
            widget_id: widget_id.clone(),
        })
        .await
    }

    pub async fn create_grid(&self, widget_id: &WidgetHandle, columns: u32) -> Result<(), ClientError> {
        self.ack(Operation::CreateGrid {
            widget_id: widget_id.clone(),
            columns,
        })
        .await
    }

    // =========================================================================
    // Containers
    // =========================================================================

    pub async fn container_add(
        &self,
        container_id: &WidgetHandle,
        child_id: &WidgetHandle,
    ) -> Result<(), ClientError> {
        self.ack(Operation::ContainerAdd {
            container_id: container_id.clone(),
            child_id: child_id.clone(),
        })
        .await
    }

    pub async fn container_remove_all(&self, container_id: &WidgetHandle) -> Result<(), ClientError> {
        self.ack(Operation::ContainerRemoveAll {
            container_id: container_id.clone(),
        })
        .await
    }

    pub async fn container_refresh(&self, container_id: &WidgetHandle) -> Result<(), ClientError> {
        self.ack(Operation::ContainerRefresh {
            container_id: container_id.clone(),
        })
        .await
    }

    // =========================================================================
    // Widget state
    // =========================================================================

    pub async fn show_widget(&self, widget_id: &WidgetHandle) -> Result<(), ClientError> {
        self.ack(Operation::ShowWidget {
            widget_id: widget_id.clone(),
        })
        .await
    }

    pub async fn hide_widget(&self, widget_id: &WidgetHandle) -> Result<(), ClientError> {
        self.ack(Operation::HideWidget {
            widget_id: widget_id.clone(),
        })
        .await
    }

    pub async fn enable_widget(&self, widget_id: &WidgetHandle) -> Result<(), ClientError> {
        self.ack(Operation::EnableWidget {
            widget_id: widget_id.clone(),
        })
        .await
    }

    pub async fn disable_widget(&self, widget_id: &WidgetHandle) -> Result<(), ClientError> {
        self.ack(Operation::DisableWidget {
            widget_id: widget_id.clone(),
        })
        .await
    }

    pub async fn is_enabled(&self, widget_id: &WidgetHandle) -> Result<bool, ClientError> {
        match self
            .transport
            .call(Operation::IsEnabled {
                widget_id: widget_id.clone(),
            })
            .await?
        {
            Reply::Enabled { enabled } => Ok(enabled),
            other => Err(unexpected("is_enabled", other)),
        }
    }

    pub async fn is_visible(&self, widget_id: &WidgetHandle) -> Result<bool, ClientError> {
        match self
            .transport
            .call(Operation::IsVisible {
                widget_id: widget_id.clone(),
            })
            .await?
        {
            Reply::Visible { visible } => Ok(visible),
            other => Err(unexpected("is_visible", other)),
        }
    }

    /// Tear down a widget subtree. Unknown handles succeed.
    pub async fn destroy_widget(&self, widget_id: &WidgetHandle) -> Result<(), ClientError> {
        self.ack(Operation::DestroyWidget {
            widget_id: widget_id.clone(),
        })
        .await
    }

    // =========================================================================
    // Resources and content
    // =========================================================================

    pub async fn register_resource(&self, name: &str, data: Vec<u8>) -> Result<(), ClientError> {
        self.ack(Operation::RegisterResource {
            name: name.to_string(),
            data,
        })
        .await
    }

    pub async fn unregister_resource(&self, name: &str) -> Result<(), ClientError> {
        self.ack(Operation::UnregisterResource {
            name: name.to_string(),
        })
        .await
    }

    pub async fn update_image(
        &self,
        widget_id: &WidgetHandle,
        source: ImageSource,
    ) -> Result<(), ClientError> {
        let (resource, data) = source.split();
        self.ack(Operation::UpdateImage {
            widget_id: widget_id.clone(),
            resource,
            data,
        })
        .await
    }

    pub async fn set_text(&self, widget_id: &WidgetHandle, text: &str) -> Result<(), ClientError> {
        self.ack(Operation::SetText {
            widget_id: widget_id.clone(),
            text: text.to_string(),
        })
        .await
    }

    pub async fn get_text(&self, widget_id: &WidgetHandle) -> Result<String, ClientError> {
        match self
            .transport
            .call(Operation::GetText {
                widget_id: widget_id.clone(),
            })
            .await?
        {
            Reply::Text { text } => Ok(text),
            other => Err(unexpected("get_text", other)),
        }
    }

    // =========================================================================
    // Automation and lookup
    // =========================================================================

    pub async fn click_widget(&self, widget_id: &WidgetHandle) -> Result<(), ClientError> {
        self.ack(Operation::ClickWidget {
            widget_id: widget_id.clone(),
        })
        .await
    }

    pub async fn register_custom_id(
        &self,
        custom_id: &str,
        widget_id: &WidgetHandle,
    ) -> Result<(), ClientError> {
        self.ack(Operation::RegisterCustomId {
            custom_id: custom_id.to_string(),
            widget_id: widget_id.clone(),
        })
        .await
    }

    pub async fn find_widget(
        &self,
        selector: &str,
        selector_type: SelectorType,
    ) -> Result<Vec<WidgetHandle>, ClientError> {
        match self
            .transport
            .call(Operation::FindWidget {
                selector: selector.to_string(),
                selector_type,
            })
            .await?
        {
            Reply::WidgetIds { widget_ids } => Ok(widget_ids),
            other => Err(unexpected("find_widget", other)),
        }
    }

    pub async fn clear_all(&self) -> Result<(), ClientError> {
        self.ack(Operation::ClearAll).await
    }

    pub async fn quit(&self) -> Result<(), ClientError> {
        self.ack(Operation::Quit).await
    }
}
