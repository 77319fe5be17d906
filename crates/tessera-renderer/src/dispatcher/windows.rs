//! Window operations.

use tessera_common::{WidgetHandle, WindowId};
use tessera_protocol::{BridgeEvent, Reply, RpcError};
use tracing::{debug, info};

use super::Dispatcher;
use crate::toolkit::WindowParams;

impl Dispatcher {
    pub(super) fn create_window(
        &self,
        window_id: WindowId,
        title: String,
        width: u32,
        height: u32,
        fixed_size: bool,
    ) -> Result<Reply, RpcError> {
        if self.registry.window(&window_id).is_ok() {
            return Err(RpcError::invalid_request(format!(
                "window {window_id} already exists"
            )));
        }
        let toolkit = self.toolkit.clone();
        let params = WindowParams {
            title,
            width,
            height,
            fixed_size,
        };
        let native = self.on_ui(move || toolkit.create_window(&params))?;
        self.registry
            .insert_window(window_id.clone(), native, fixed_size)?;
        info!(window_id = %window_id, width, height, fixed_size, "window created");
        Ok(Reply::Ack)
    }

    pub(super) fn show_window(&self, window_id: &WindowId) -> Result<Reply, RpcError> {
        let window = self.registry.window(window_id)?;
        self.on_ui(move || {
            window.native.show();
            Ok(())
        })?;
        Ok(Reply::Ack)
    }

    /// Fixed-size windows accept the request and keep their geometry.
    pub(super) fn resize_window(
        &self,
        window_id: &WindowId,
        width: u32,
        height: u32,
    ) -> Result<Reply, RpcError> {
        let window = self.registry.window(window_id)?;
        if window.fixed_size {
            debug!(window_id = %window_id, width, height, "resize ignored on fixed-size window");
            return Ok(Reply::Ack);
        }
        let native = window.native.clone();
        let (new_w, new_h) = self.on_ui(move || {
            native.resize(width, height);
            Ok(native.size())
        })?;
        self.publish(BridgeEvent::WindowResized {
            window_id: window_id.clone(),
            width: new_w,
            height: new_h,
        });
        Ok(Reply::Ack)
    }

    pub(super) fn set_window_title(
        &self,
        window_id: &WindowId,
        title: String,
    ) -> Result<Reply, RpcError> {
        let window = self.registry.window(window_id)?;
        self.on_ui(move || {
            window.native.set_title(&title);
            Ok(())
        })?;
        Ok(Reply::Ack)
    }

    pub(super) fn window_size(&self, window_id: &WindowId) -> Result<Reply, RpcError> {
        let window = self.registry.window(window_id)?;
        let (width, height) = self.on_ui(move || Ok(window.native.size()))?;
        Ok(Reply::WindowSize { width, height })
    }

    /// Replace the window root. Re-setting the same root is a no-op.
    pub(super) fn set_content(
        &self,
        window_id: &WindowId,
        widget_id: &WidgetHandle,
    ) -> Result<Reply, RpcError> {
        self.registry.window(window_id)?;
        self.registry.widget(widget_id)?;

        let swap = self.registry.replace_content(window_id, widget_id)?;
        if swap.unchanged {
            return Ok(Reply::Ack);
        }
        let replaced = swap.released.len();
        let window = swap.window;
        let content = swap.content;
        let detached_from = swap.detached_from;
        let cleared = swap.cleared_windows;
        self.on_ui(move || {
            for other in &cleared {
                other.set_content(None);
            }
            if let Some(parent) = detached_from {
                parent.remove_child(&content)?;
            }
            window.set_content(Some(content));
            Ok(())
        })?;
        self.release(swap.released);
        debug!(window_id = %window_id, widget_id = %widget_id, replaced, "window content set");
        Ok(Reply::Ack)
    }
}
