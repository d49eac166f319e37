//! Unified error type for wizsync.

use wizsync_protocol::ProtocolError;
use wizsync_session::SessionError;
use wizsync_state::SyncError;
use wizsync_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors, so users
/// of the `wizsync` crate only ever match on this one type.
#[derive(Debug, thiserror::Error)]
pub enum WizsyncError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (not connected, closed).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A state-level error (malformed snapshot, refused or lost action).
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The session loop is no longer running.
    #[error("session closed")]
    SessionClosed,
}
