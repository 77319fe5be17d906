//! Logic-process side of the Tessera bridge.
//!
//! Provides:
//! - [`RendererProcess`]: spawn the renderer and read its handshake line
//! - [`Transport`]: the call/event seam, with a WebSocket implementation
//!   (and an in-process one behind the `local` feature)
//! - [`BridgeClient`]: one typed method per bridge operation
//! - [`Session`]: process + transport + client bundled per connection

mod error;
mod process;
mod proxy;
mod session;
pub mod transport;

pub use error::ClientError;
pub use process::RendererProcess;
pub use proxy::{BridgeClient, ImageSource};
pub use session::{ConnectionSession, Session};
pub use transport::{Transport, TransportOptions, WsTransport};

#[cfg(feature = "local")]
pub use transport::LocalTransport;
