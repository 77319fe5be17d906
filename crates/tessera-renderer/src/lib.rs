//! Renderer side of the Tessera bridge.
//!
//! The renderer owns every native widget. A logic process drives it over a
//! WebSocket (see [`server`]), each request is validated and executed by the
//! [`dispatcher::Dispatcher`], bookkeeping lives in the
//! [`registry::Registry`], and all native mutation runs on one
//! [`ui_thread::UiThread`].

pub mod dispatcher;
pub mod registry;
pub mod server;
pub mod toolkit;
pub mod ui_thread;

pub use dispatcher::Dispatcher;
pub use registry::{Registry, RegistryError};
pub use toolkit::{HeadlessToolkit, NativeWidget, NativeWindow, Toolkit, ToolkitError};
pub use ui_thread::{UiThread, UiThreadError};
