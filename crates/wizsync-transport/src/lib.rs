//! Client transport abstraction for wizsync.
//!
//! Provides the [`Connector`] and [`Connection`] traits the connection
//! manager drives. A connector opens one duplex channel to a URL; a
//! connection carries text frames out and raw frames in.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket client via `tokio-tungstenite`
//! - `rustls`: `wss://` URLs, using rustls with the webpki root store
//! - `mock`: in-memory [`MockConnector`] for tests of the upper layers

mod error;
#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "mock")]
pub use mock::{MockConnection, MockConnector, MockRemote};
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketConnector};

use std::fmt;
use std::future::Future;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Opens outbound channels to a server.
///
/// The returned futures are `Send` because the connection manager runs
/// each attempt on its own Tokio task.
pub trait Connector: Send + Sync + 'static {
    /// The connection type produced by this connector.
    type Connection: Connection;

    /// Opens a channel to `url` (e.g. `ws://localhost:8000/ws/k3j9a0x2q`).
    fn connect(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// A single open channel that can send text and receive frames.
///
/// Sending and receiving take `&self` and must not block each other: a
/// reader task sits in [`recv`](Connection::recv) for the whole life of
/// the channel while the session writes actions through
/// [`send`](Connection::send).
pub trait Connection: Send + Sync + 'static {
    /// Sends one text frame to the remote peer.
    fn send(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
