//! The phase/turn gate: which actions the local player may take right now.
//!
//! Everything here is derived from two inputs: the held snapshot and three
//! view-local flags recording what the player has already submitted. The
//! same [`allowed_actions`] result drives both the controls the player
//! sees and the check every submission must pass, so the two cannot
//! disagree.

use std::ops::RangeInclusive;

use wizsync_protocol::{ActionKind, Card, ClientAction, Phase};

use crate::{GameSnapshot, NotAllowed};

/// A player gesture, before the gate has looked at it.
///
/// Bids are signed so a nonsense value from the input layer is refused by
/// the gate rather than silently wrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Ready,
    Bid(i64),
    PlayCard(Card),
}

impl Intent {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Ready => ActionKind::Ready,
            Self::Bid(_) => ActionKind::Bid,
            Self::PlayCard(_) => ActionKind::PlayCard,
        }
    }
}

/// What has been submitted and not yet answered by a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateFlags {
    /// Held until a snapshot outside `AwaitingReady` arrives.
    pub ready_sent: bool,
    /// Held until the next snapshot.
    pub bid_pending: bool,
    /// Held until the next snapshot.
    pub play_pending: bool,
}

impl GateFlags {
    fn pending(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::Ready => self.ready_sent,
            ActionKind::Bid => self.bid_pending,
            ActionKind::PlayCard => self.play_pending,
        }
    }
}

/// The actions currently open to the local player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedActions {
    pub phase: Phase,
    pub ready: bool,
    /// Legal bids, `0..=round_size`, when a bid may be placed.
    pub bid: Option<RangeInclusive<u32>>,
    /// Hand cards that may be played.
    pub playable: Vec<Card>,
}

impl AllowedActions {
    /// Nothing allowed.
    pub fn none(phase: Phase) -> Self {
        Self {
            phase,
            ready: false,
            bid: None,
            playable: Vec::new(),
        }
    }

    /// Disables everything unless the channel is up.
    pub fn masked(self, connected: bool) -> Self {
        if connected { self } else { Self::none(self.phase) }
    }

    /// Whether any control is enabled.
    pub fn any(&self) -> bool {
        self.ready || self.bid.is_some() || !self.playable.is_empty()
    }

    pub fn can_bid(&self, bid: u32) -> bool {
        self.bid.as_ref().is_some_and(|range| range.contains(&bid))
    }

    /// The hand card with the same face as `card`, if it may be played.
    pub fn playable_match(&self, card: &Card) -> Option<&Card> {
        self.playable.iter().find(|c| c.same_face(card))
    }
}

/// Computes the open actions for `snapshot` given what has already been
/// submitted.
///
/// - ready: in `AwaitingReady` (including before any snapshot), once
/// - bid: in `Bidding` on the player's turn, `0..=round_size`, once per
///   snapshot
/// - play: in `Playing` on the player's turn, hand cards the server marked
///   playable, once per snapshot
pub fn allowed_actions(snapshot: Option<&GameSnapshot>, flags: GateFlags) -> AllowedActions {
    let Some(snapshot) = snapshot else {
        return AllowedActions {
            ready: !flags.ready_sent,
            ..AllowedActions::none(Phase::AwaitingReady)
        };
    };

    let mut allowed = AllowedActions::none(snapshot.phase);
    match snapshot.phase {
        Phase::AwaitingReady => {
            allowed.ready = !flags.ready_sent;
        }
        Phase::Bidding if snapshot.is_my_turn && !flags.bid_pending => {
            allowed.bid = Some(0..=snapshot.round_size);
        }
        Phase::Playing if snapshot.is_my_turn && !flags.play_pending => {
            allowed.playable = snapshot.playable_cards().cloned().collect();
        }
        Phase::Bidding | Phase::Playing => {}
    }
    allowed
}

/// Holds the view-local submission flags and answers "may I?".
#[derive(Debug, Clone, Default)]
pub struct PhaseGate {
    flags: GateFlags,
}

impl PhaseGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flags(&self) -> GateFlags {
        self.flags
    }

    pub fn allowed_actions(&self, snapshot: Option<&GameSnapshot>) -> AllowedActions {
        allowed_actions(snapshot, self.flags)
    }

    /// Checks `intent` against [`allowed_actions`] and turns it into the
    /// action to send.
    ///
    /// A played card is sent exactly as the hand holds it.
    ///
    /// # Errors
    /// Returns the first reason the intent fails, checked in the order
    /// phase, turn, already submitted, value.
    pub fn authorize(
        &self,
        snapshot: Option<&GameSnapshot>,
        intent: &Intent,
    ) -> Result<ClientAction, NotAllowed> {
        let allowed = self.allowed_actions(snapshot);
        let action = match intent {
            Intent::Ready if allowed.ready => Some(ClientAction::Ready),
            Intent::Bid(bid) => u32::try_from(*bid)
                .ok()
                .filter(|&n| allowed.can_bid(n))
                .map(|n_tricks| ClientAction::Bid { n_tricks }),
            Intent::PlayCard(card) => allowed
                .playable_match(card)
                .map(|held| ClientAction::PlayCard { card: held.clone() }),
            Intent::Ready => None,
        };
        action.ok_or_else(|| self.refusal(snapshot, intent, allowed.phase))
    }

    /// Records that an action of `kind` went out.
    pub fn mark_submitted(&mut self, kind: ActionKind) {
        match kind {
            ActionKind::Ready => self.flags.ready_sent = true,
            ActionKind::Bid => self.flags.bid_pending = true,
            ActionKind::PlayCard => self.flags.play_pending = true,
        }
    }

    /// A new snapshot answers any pending bid or play. "Ready sent" lasts
    /// until the table leaves `AwaitingReady`.
    pub fn observe_snapshot(&mut self, snapshot: &GameSnapshot) {
        self.flags.bid_pending = false;
        self.flags.play_pending = false;
        if snapshot.phase != Phase::AwaitingReady {
            self.flags.ready_sent = false;
        }
    }

    /// Forgets everything submitted. The server registers a fresh player on
    /// every connection, so this runs whenever a channel opens.
    pub fn reset(&mut self) {
        self.flags = GateFlags::default();
    }

    fn refusal(&self, snapshot: Option<&GameSnapshot>, intent: &Intent, phase: Phase) -> NotAllowed {
        let action = intent.kind();
        let required = match action {
            ActionKind::Ready => Phase::AwaitingReady,
            ActionKind::Bid => Phase::Bidding,
            ActionKind::PlayCard => Phase::Playing,
        };
        if phase != required {
            return NotAllowed::WrongPhase { action, phase };
        }
        let my_turn = snapshot.is_some_and(|s| s.is_my_turn);
        if action != ActionKind::Ready && !my_turn {
            return NotAllowed::NotYourTurn(action);
        }
        if self.flags.pending(action) {
            return NotAllowed::AlreadySubmitted(action);
        }
        match intent {
            Intent::Bid(bid) => NotAllowed::BidOutOfRange {
                bid: *bid,
                max: snapshot.map_or(0, |s| s.round_size),
            },
            Intent::PlayCard(card) => NotAllowed::CardNotPlayable(card.clone()),
            Intent::Ready => NotAllowed::AlreadySubmitted(action),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
