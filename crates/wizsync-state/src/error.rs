//! Error types for the state layer.

use wizsync_protocol::{ActionKind, Card, Phase, ProtocolError};
use wizsync_session::SessionError;

/// Why the gate refused an intent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotAllowed {
    /// The action belongs to a different phase.
    #[error("{action} is not allowed while {phase}")]
    WrongPhase { action: ActionKind, phase: Phase },

    /// Bids and plays wait for the local player's turn.
    #[error("{0} is only allowed on your turn")]
    NotYourTurn(ActionKind),

    /// The same action was already sent and no snapshot has answered it.
    #[error("{0} was already submitted")]
    AlreadySubmitted(ActionKind),

    #[error("bid {bid} is outside 0..={max}")]
    BidOutOfRange { bid: i64, max: u32 },

    /// The card is not in the hand, or the server did not mark it playable.
    #[error("card {0} is not playable")]
    CardNotPlayable(Card),
}

/// Errors surfaced by the reconciler and the submitter.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// An inbound frame could not be parsed. The held snapshot is unchanged.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(#[source] ProtocolError),

    /// The gate refused the intent; nothing was sent.
    #[error("action not allowed: {0}")]
    ActionNotAllowed(#[from] NotAllowed),

    /// The action was authorized but could not be written. It is not
    /// retried.
    #[error("action lost: {0}")]
    ActionLost(#[source] SessionError),
}
