//! Error types for the session layer.

use wizsync_transport::TransportError;

/// Errors raised by the [`ConnectionManager`](crate::ConnectionManager).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// There is no open channel; the action was not written.
    #[error("not connected (state: {0})")]
    NotConnected(crate::ConnectionState),

    /// The channel was open but the write failed. The channel is now
    /// treated as lost and a reconnect is scheduled.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The outbound action could not be encoded.
    #[error(transparent)]
    Protocol(#[from] wizsync_protocol::ProtocolError),

    /// The manager was closed and will not reconnect.
    #[error("connection manager closed")]
    Closed,
}
