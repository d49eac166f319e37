//! What a running session reports to its observer.

use std::sync::Arc;

use wizsync_state::{AllowedActions, GameSnapshot};

/// Default capacity of the observer channel.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// One notification from the session loop.
///
/// `Connected` and `Disconnected` are always delivered, waiting for room
/// in the channel if needed while the session keeps running. The others are dropped with a warning when
/// the observer falls behind; the next snapshot or affordance change
/// supersedes them anyway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The channel to the server is open.
    Connected,

    /// The channel was lost or could not be opened; a retry is scheduled.
    Disconnected { reason: String },

    /// A new snapshot replaced the previous one.
    Snapshot(Arc<GameSnapshot>),

    /// The set of enabled controls changed. Everything is disabled while
    /// disconnected.
    AffordancesChanged(AllowedActions),

    /// An inbound frame was malformed and dropped; the held snapshot is
    /// unchanged.
    SnapshotRejected { reason: String },
}

impl SessionEvent {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected { .. } => "disconnected",
            Self::Snapshot(_) => "snapshot",
            Self::AffordancesChanged(_) => "affordances_changed",
            Self::SnapshotRejected { .. } => "snapshot_rejected",
        }
    }

    /// Whether this event must never be dropped.
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Connected | Self::Disconnected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wizsync_protocol::Phase;

    #[test]
    fn test_is_lifecycle_only_for_connection_events() {
        assert!(SessionEvent::Connected.is_lifecycle());
        assert!(SessionEvent::Disconnected { reason: "x".into() }.is_lifecycle());
        assert!(!SessionEvent::AffordancesChanged(AllowedActions::none(Phase::Bidding)).is_lifecycle());
        assert!(!SessionEvent::SnapshotRejected { reason: "x".into() }.is_lifecycle());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(SessionEvent::Connected.kind(), "connected");
        assert_eq!(
            SessionEvent::SnapshotRejected { reason: String::new() }.kind(),
            "snapshot_rejected"
        );
    }
}
