//! The local copy of the game state and how it is replaced.
//!
//! The server pushes a complete snapshot after every change. The client
//! never merges fields and never edits a snapshot in place: each valid
//! frame produces a fresh [`GameSnapshot`] that replaces the previous one
//! wholesale, and each invalid frame is dropped.

use std::sync::Arc;

use wizsync_protocol::{Card, JsonCodec, Phase, ServerFrame};

use crate::SyncError;

/// The client's view of the game after one server frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    /// Derived; see [`derive_phase`].
    pub phase: Phase,
    pub trump_card: Option<Card>,
    pub hand: Vec<Card>,
    /// Cards on the table in the current trick, in play order.
    pub played_cards: Vec<Card>,
    pub is_my_turn: bool,
    pub score: i64,
    /// `None` until the local player has bid this round.
    pub current_bid: Option<u32>,
    pub current_tricks_won: u32,
    /// Cards dealt this round; the highest legal bid.
    pub round_size: u32,
}

impl GameSnapshot {
    /// Builds a snapshot from a decoded frame. `previous` is the phase of
    /// the snapshot being replaced, if any.
    pub fn from_frame(frame: ServerFrame, previous: Option<Phase>) -> Self {
        let phase = derive_phase(&frame, previous);
        Self {
            phase,
            trump_card: frame.trump_card,
            hand: frame.hand,
            played_cards: frame.played_cards,
            is_my_turn: frame.turn,
            score: frame.score,
            current_bid: frame.bid,
            current_tricks_won: frame.current_tricks,
            round_size: frame.n_round,
        }
    }

    /// Cards in the hand the server marked playable.
    pub fn playable_cards(&self) -> impl Iterator<Item = &Card> {
        self.hand.iter().filter(|card| card.playable)
    }

    /// The hand card with the same face as `card`, if held.
    pub fn find_in_hand(&self, card: &Card) -> Option<&Card> {
        self.hand.iter().find(|held| held.same_face(card))
    }
}

/// Works out which phase a frame describes.
///
/// In priority order:
/// 1. the explicit `phase` tag
/// 2. the legacy `bidding` flag (`false` only counts once a bid exists,
///    `true` is ignored while play continues with a bid placed)
/// 3. inference: an empty hand before any round has run means the table
///    is waiting for players; a missing bid means bidding; anything else
///    is play
///
/// Once play has started, a frame that still carries a bid stays in
/// `Playing` even when the hand empties at the end of the round. Only a
/// cleared bid starts a new bidding round.
pub fn derive_phase(frame: &ServerFrame, previous: Option<Phase>) -> Phase {
    if let Some(phase) = frame.phase {
        return phase;
    }
    let playing = previous == Some(Phase::Playing);
    match (frame.bidding, frame.bid) {
        (Some(true), None) => return Phase::Bidding,
        (Some(true), Some(_)) if !playing => return Phase::Bidding,
        (Some(false), Some(_)) => return Phase::Playing,
        _ => {}
    }

    let before_first_round = matches!(previous, None | Some(Phase::AwaitingReady));
    if frame.hand.is_empty() && before_first_round {
        Phase::AwaitingReady
    } else if frame.bid.is_none() {
        Phase::Bidding
    } else {
        Phase::Playing
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Holds at most one snapshot: the last one that parsed.
#[derive(Debug, Default)]
pub struct Reconciler {
    current: Option<Arc<GameSnapshot>>,
    applied: u64,
    rejected: u64,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one raw frame and, if it is valid, replaces the held
    /// snapshot.
    ///
    /// # Errors
    /// Returns [`SyncError::MalformedSnapshot`] when the frame does not
    /// parse. The previously held snapshot is kept unchanged.
    pub fn apply_snapshot(&mut self, raw: &[u8]) -> Result<Arc<GameSnapshot>, SyncError> {
        match JsonCodec.decode_frame(raw) {
            Ok(frame) => Ok(self.apply_frame(frame)),
            Err(e) => {
                self.rejected += 1;
                Err(SyncError::MalformedSnapshot(e))
            }
        }
    }

    /// Replaces the held snapshot with one built from an already decoded
    /// frame.
    pub fn apply_frame(&mut self, frame: ServerFrame) -> Arc<GameSnapshot> {
        let previous = self.current.as_ref().map(|s| s.phase);
        let snapshot = Arc::new(GameSnapshot::from_frame(frame, previous));
        self.applied += 1;
        tracing::debug!(
            phase = %snapshot.phase,
            my_turn = snapshot.is_my_turn,
            hand = snapshot.hand.len(),
            "snapshot applied"
        );
        self.current = Some(Arc::clone(&snapshot));
        snapshot
    }

    pub fn current(&self) -> Option<&GameSnapshot> {
        self.current.as_deref()
    }

    /// A shared handle to the held snapshot, for observers on other tasks.
    pub fn current_arc(&self) -> Option<Arc<GameSnapshot>> {
        self.current.clone()
    }

    /// Phase of the held snapshot; `AwaitingReady` before the first one.
    pub fn phase(&self) -> Phase {
        self.current.as_ref().map_or(Phase::AwaitingReady, |s| s.phase)
    }

    /// Drops the held snapshot so the next frame is read as the first one.
    ///
    /// A new channel is a new player to the server; neither its phase nor
    /// its turn carries over from the old connection.
    pub fn reset_baseline(&mut self) {
        if self.current.take().is_some() {
            tracing::debug!("held snapshot dropped for new connection");
        }
    }

    /// Frames applied so far.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// Frames dropped as malformed so far.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}
