//! Wire protocol between the logic process and the renderer process.
//!
//! The renderer announces itself with a single JSON [`Handshake`] line on
//! stdout. After that every message is a WebSocket text frame:
//! - **logic -> renderer**: a [`Request`] carrying the auth token and one
//!   [`Operation`] from the closed operation set.
//! - **renderer -> logic**: a [`ServerFrame`], either the [`Response`] to a
//!   request or an out-of-band [`BridgeEvent`] push.

pub mod bytes;
mod event;
mod handshake;
mod message;
mod ops;

pub use event::BridgeEvent;
pub use handshake::{Endpoint, Handshake, HandshakeError, TransportProtocol};
pub use message::{ErrorCode, Reply, Request, RequestEnvelope, Response, RpcError, ServerFrame};
pub use ops::{Operation, SelectorType};

/// Wire protocol revision. A renderer announcing a different value is
/// refused by the client.
pub const PROTOCOL_VERSION: u32 = 1;

/// Version string of this bridge build, reported in the handshake.
pub const BRIDGE_VERSION: &str = env!("CARGO_PKG_VERSION");
