//! Request validation and execution.
//!
//! [`Dispatcher::handle`] checks the session token before anything else,
//! then routes the operation through an exhaustive `match`. Handlers
//! resolve handles under the registry read lock, run native mutation on the
//! UI thread (blocking the caller until it completes), and take the write
//! lock only for bookkeeping.

mod containers;
mod queries;
mod widgets;
mod windows;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tessera_common::{EventBus, WidgetKind};
use tessera_protocol::{BridgeEvent, Operation, Reply, Request, Response, RpcError};
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use crate::registry::{Registry, RegistryError, Released};
use crate::toolkit::{HeadlessToolkit, Toolkit, ToolkitError};
use crate::ui_thread::{UiThread, UiThreadError};

/// A native release that failed during teardown. Logged, never fatal.
#[derive(Debug, thiserror::Error)]
#[error("failed to release {handle}: {source}")]
pub struct TeardownError {
    pub handle: String,
    #[source]
    pub source: ToolkitError,
}

impl From<RegistryError> for RpcError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::WidgetNotFound(_)
            | RegistryError::WindowNotFound(_)
            | RegistryError::CustomIdNotFound(_)
            | RegistryError::ResourceNotFound(_) => RpcError::not_found(e.to_string()),
            RegistryError::NotAContainer { .. } => RpcError::not_a_container(e.to_string()),
            RegistryError::HandleInUse(_)
            | RegistryError::HandleRetired(_)
            | RegistryError::WindowExists(_)
            | RegistryError::Cycle { .. } => RpcError::invalid_request(e.to_string()),
        }
    }
}

impl From<ToolkitError> for RpcError {
    fn from(e: ToolkitError) -> Self {
        match e {
            ToolkitError::Unsupported { .. } => RpcError::unsupported(e.to_string()),
            ToolkitError::InvalidImage(_) => RpcError::invalid_request(e.to_string()),
            ToolkitError::Released | ToolkitError::Native(_) => RpcError::internal(e.to_string()),
        }
    }
}

impl From<UiThreadError> for RpcError {
    fn from(e: UiThreadError) -> Self {
        RpcError::internal(e.to_string())
    }
}

pub struct Dispatcher {
    token: String,
    registry: Arc<Registry>,
    toolkit: Arc<dyn Toolkit>,
    ui: UiThread,
    events: EventBus<BridgeEvent>,
    quit: watch::Sender<bool>,
}

impl Dispatcher {
    pub fn new(token: impl Into<String>, toolkit: Arc<dyn Toolkit>) -> std::io::Result<Self> {
        let (quit, _) = watch::channel(false);
        Ok(Self {
            token: token.into(),
            registry: Arc::new(Registry::new()),
            toolkit,
            ui: UiThread::spawn("tessera-ui")?,
            events: EventBus::new(256),
            quit,
        })
    }

    /// Dispatcher over the in-memory toolkit.
    pub fn headless(token: impl Into<String>) -> std::io::Result<Self> {
        Self::new(token, Arc::new(HeadlessToolkit::new()))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn toolkit_name(&self) -> &'static str {
        self.toolkit.name()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<BridgeEvent> {
        self.events.subscribe()
    }

    /// Flips to `true` once a `Quit` request has been handled.
    pub fn quit_signal(&self) -> watch::Receiver<bool> {
        self.quit.subscribe()
    }

    /// Authorize and execute one request.
    pub fn handle(&self, request: Request) -> Response {
        let Request {
            id,
            authorization,
            op,
        } = request;
        if !token_matches(&authorization, &self.token) {
            warn!(request_id = id, op = op.name(), "rejected unauthorized request");
            return Response::err(id, RpcError::unauthorized());
        }
        let name = op.name();
        let result = self.dispatch(op);
        match &result {
            Ok(_) => debug!(request_id = id, op = name, "request ok"),
            Err(e) => warn!(request_id = id, op = name, error = %e, "request failed"),
        }
        Response::from_result(id, result)
    }

    /// Execute an already-authorized operation.
    pub fn dispatch(&self, op: Operation) -> Result<Reply, RpcError> {
        match op {
            Operation::CreateWindow {
                window_id,
                title,
                width,
                height,
                fixed_size,
            } => self.create_window(window_id, title, width, height, fixed_size),
            Operation::ShowWindow { window_id } => self.show_window(&window_id),
            Operation::ResizeWindow {
                window_id,
                width,
                height,
            } => self.resize_window(&window_id, width, height),
            Operation::SetWindowTitle { window_id, title } => {
                self.set_window_title(&window_id, title)
            }
            Operation::GetWindowSize { window_id } => self.window_size(&window_id),
            Operation::SetContent {
                window_id,
                widget_id,
            } => self.set_content(&window_id, &widget_id),

            Operation::CreateImage {
                widget_id,
                resource,
                data,
                width,
                height,
                callback_id,
            } => self.create_image(widget_id, resource, data, width, height, callback_id),
            Operation::CreateLabel { widget_id, text } => self.create_label(widget_id, text),
            Operation::CreateButton {
                widget_id,
                text,
                callback_id,
            } => self.create_button(widget_id, text, callback_id),
            Operation::CreateVBox { widget_id } => self.create_box(widget_id, WidgetKind::VBox),
            Operation::CreateHBox { widget_id } => self.create_box(widget_id, WidgetKind::HBox),
            Operation::CreateGrid { widget_id, columns } => self.create_grid(widget_id, columns),

            Operation::ContainerAdd {
                container_id,
                child_id,
            } => self.container_add(&container_id, &child_id),
            Operation::ContainerRemoveAll { container_id } => {
                self.container_remove_all(&container_id)
            }
            Operation::ContainerRefresh { container_id } => self.container_refresh(&container_id),

            Operation::ShowWidget { widget_id } => self.set_visible(&widget_id, true),
            Operation::HideWidget { widget_id } => self.set_visible(&widget_id, false),
            Operation::EnableWidget { widget_id } => self.set_enabled(&widget_id, true),
            Operation::DisableWidget { widget_id } => self.set_enabled(&widget_id, false),
            Operation::IsEnabled { widget_id } => self.is_enabled(&widget_id),
            Operation::IsVisible { widget_id } => self.is_visible(&widget_id),
            Operation::DestroyWidget { widget_id } => self.destroy_widget(&widget_id),

            Operation::RegisterResource { name, data } => {
                debug!(resource = %name, bytes = data.len(), "resource registered");
                self.registry.register_resource(&name, data);
                Ok(Reply::Ack)
            }
            Operation::UnregisterResource { name } => {
                let existed = self.registry.unregister_resource(&name);
                debug!(resource = %name, existed, "resource unregistered");
                Ok(Reply::Ack)
            }
            Operation::UpdateImage {
                widget_id,
                resource,
                data,
            } => self.update_image(&widget_id, resource, data),
            Operation::SetText { widget_id, text } => self.set_text(&widget_id, text),
            Operation::GetText { widget_id } => self.get_text(&widget_id),

            Operation::ClickWidget { widget_id } => self.click_widget(&widget_id),
            Operation::RegisterCustomId {
                custom_id,
                widget_id,
            } => {
                self.registry.register_custom_id(&custom_id, &widget_id)?;
                Ok(Reply::Ack)
            }
            Operation::FindWidget {
                selector,
                selector_type,
            } => self.find_widget(&selector, selector_type),
            Operation::ClearAll => self.clear_all(),
            Operation::Quit => self.quit(),
        }
    }

    // =========================================================================
    // Shared helpers
    // =========================================================================

    /// Run `f` on the UI thread, flattening both error layers.
    fn on_ui<R, F>(&self, f: F) -> Result<R, RpcError>
    where
        F: FnOnce() -> Result<R, ToolkitError> + Send + 'static,
        R: Send + 'static,
    {
        Ok(self.ui.run_and_wait(f)??)
    }

    /// Release purged native objects on the UI thread. Individual failures
    /// are logged and the rest still run.
    fn release(&self, released: Vec<Released>) {
        if released.is_empty() {
            return;
        }
        let result = self.ui.run_and_wait(move || {
            let mut failures = Vec::new();
            for r in released {
                if let Err(source) = r.native.release() {
                    failures.push(TeardownError {
                        handle: r.handle.to_string(),
                        source,
                    });
                }
            }
            failures
        });
        match result {
            Ok(failures) => {
                for e in failures {
                    warn!(error = %e, "teardown continued past a failed release");
                }
            }
            Err(e) => warn!(error = %e, "could not release native objects"),
        }
    }

    fn publish(&self, event: BridgeEvent) {
        let receivers = self.events.publish(event);
        debug!(receivers, "event published");
    }

    fn clear_all(&self) -> Result<Reply, RpcError> {
        let (windows, released) = self.registry.clear_all();
        let count = released.len();
        self.on_ui(move || {
            for w in windows {
                w.set_content(None);
            }
            Ok(())
        })?;
        self.release(released);
        tracing::info!(removed = count, "registry cleared");
        Ok(Reply::Ack)
    }

    fn quit(&self) -> Result<Reply, RpcError> {
        let window_ids = self.registry.window_ids();
        let natives = window_ids
            .iter()
            .filter_map(|id| self.registry.window(id).ok())
            .map(|w| w.native)
            .collect::<Vec<_>>();
        self.on_ui(move || {
            for window in natives {
                window.close();
            }
            Ok(())
        })?;
        for window_id in window_ids {
            self.publish(BridgeEvent::WindowClosed { window_id });
        }
        self.quit.send_replace(true);
        tracing::info!("quit requested");
        Ok(Reply::Ack)
    }
}

/// Compare tokens without short-circuiting on the first differing byte.
fn token_matches(given: &str, expected: &str) -> bool {
    if given.len() != expected.len() || expected.is_empty() {
        return false;
    }
    given
        .bytes()
        .zip(expected.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
