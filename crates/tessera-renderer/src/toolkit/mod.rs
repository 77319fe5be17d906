//! Seam between the registry and the native widget engine.
//!
//! Native objects are only ever touched from inside a [`UiThread`] job; the
//! `Send + Sync` bounds exist so handles can be moved into those jobs.
//!
//! [`UiThread`]: crate::ui_thread::UiThread

mod headless;

pub use headless::{HeadlessToolkit, HeadlessWidget, HeadlessWindow};

use std::sync::Arc;
use tessera_common::WidgetKind;

/// Errors raised by the native engine.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ToolkitError {
    #[error("{kind} widgets do not support {operation}")]
    Unsupported {
        kind: WidgetKind,
        operation: &'static str,
    },

    #[error("invalid image data: {0}")]
    InvalidImage(String),

    #[error("native object already released")]
    Released,

    #[error("native engine failure: {0}")]
    Native(String),
}

/// Construction parameters for [`Toolkit::create_widget`].
#[derive(Debug, Clone, Default)]
pub struct WidgetParams {
    pub text: Option<String>,
    pub image: Option<Arc<Vec<u8>>>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub columns: Option<u32>,
}

/// Construction parameters for [`Toolkit::create_window`].
#[derive(Debug, Clone)]
pub struct WindowParams {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fixed_size: bool,
}

pub type NativeRef = Arc<dyn NativeWidget>;

pub trait NativeWidget: Send + Sync {
    fn kind(&self) -> WidgetKind;

    fn set_visible(&self, visible: bool);
    fn is_visible(&self) -> bool;
    fn set_enabled(&self, enabled: bool);
    fn is_enabled(&self) -> bool;

    fn set_text(&self, text: &str) -> Result<(), ToolkitError>;
    fn text(&self) -> Result<String, ToolkitError>;
    fn set_image(&self, data: Arc<Vec<u8>>) -> Result<(), ToolkitError>;

    fn add_child(&self, child: NativeRef) -> Result<(), ToolkitError>;
    /// Detach `child` if present. Identity is pointer identity.
    fn remove_child(&self, child: &NativeRef) -> Result<(), ToolkitError>;
    fn clear_children(&self) -> Result<(), ToolkitError>;
    fn child_count(&self) -> usize;
    /// Re-run layout after a batch of child changes.
    fn refresh(&self) -> Result<(), ToolkitError>;

    /// Simulate a user tap. Returns whether the widget actually activated.
    fn tap(&self) -> Result<bool, ToolkitError>;

    /// Free the native object. Further calls may fail with `Released`.
    fn release(&self) -> Result<(), ToolkitError>;
}

pub trait NativeWindow: Send + Sync {
    fn set_title(&self, title: &str);
    fn title(&self) -> String;
    fn size(&self) -> (u32, u32);
    fn resize(&self, width: u32, height: u32);
    fn set_content(&self, content: Option<NativeRef>);
    fn content(&self) -> Option<NativeRef>;
    fn show(&self);
    fn is_shown(&self) -> bool;
    /// Hide the window and drop its content. Sent to every window on quit.
    fn close(&self);
}

/// Factory for native objects.
pub trait Toolkit: Send + Sync {
    fn name(&self) -> &'static str;

    fn create_widget(
        &self,
        kind: WidgetKind,
        params: &WidgetParams,
    ) -> Result<NativeRef, ToolkitError>;

    fn create_window(&self, params: &WindowParams)
        -> Result<Arc<dyn NativeWindow>, ToolkitError>;
}
