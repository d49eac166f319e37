//! Core protocol types for the card-game wire format.
//!
//! Every type here travels "on the wire": the server pushes a
//! [`ServerFrame`] per state change, and the client answers with a
//! [`ClientAction`]. Cards appear in both directions.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Suit
// ---------------------------------------------------------------------------

/// The suit of a card: four standard suits plus the two special markers.
///
/// Decoding is lenient because protocol revisions disagreed on spelling:
/// names are case-insensitive, singular or plural (`"heart"`, `"Hearts"`),
/// or a suit symbol (`"♠"`). Wizards and jesters also accept `"W"` / `"J"`.
/// Encoding always writes the lowercase plural name, e.g. `"spades"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", rename_all = "lowercase")]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
    /// Special card that wins the trick outright.
    Wizard,
    /// Special card that always loses the trick.
    Jester,
}

impl Suit {
    /// The canonical wire name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Hearts => "hearts",
            Self::Diamonds => "diamonds",
            Self::Clubs => "clubs",
            Self::Spades => "spades",
            Self::Wizard => "wizard",
            Self::Jester => "jester",
        }
    }

    /// A one-character symbol for display.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Hearts => "♥",
            Self::Diamonds => "♦",
            Self::Clubs => "♣",
            Self::Spades => "♠",
            Self::Wizard => "W",
            Self::Jester => "J",
        }
    }

    /// Returns `true` for wizard and jester.
    pub fn is_special(self) -> bool {
        matches!(self, Self::Wizard | Self::Jester)
    }

    /// Returns `true` for hearts and diamonds.
    pub fn is_red(self) -> bool {
        matches!(self, Self::Hearts | Self::Diamonds)
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string names no known suit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown suit {0:?}")]
pub struct UnknownSuit(pub String);

impl FromStr for Suit {
    type Err = UnknownSuit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let suit = match s.trim().to_lowercase().as_str() {
            "hearts" | "heart" | "♥" => Self::Hearts,
            "diamonds" | "diamond" | "♦" => Self::Diamonds,
            "clubs" | "club" | "♣" => Self::Clubs,
            "spades" | "spade" | "♠" => Self::Spades,
            "wizard" | "wizards" | "w" => Self::Wizard,
            "jester" | "jesters" | "j" => Self::Jester,
            _ => return Err(UnknownSuit(s.to_string())),
        };
        Ok(suit)
    }
}

impl TryFrom<String> for Suit {
    type Error = UnknownSuit;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

/// A single card as the server describes it.
///
/// `playable` is computed by the server for cards in the local hand while
/// a trick is being played. It is `false` (or absent) everywhere else.
///
/// A decoded card remembers how the server spelled it, so playing it sends
/// back the same `suit` and `value` the server used (`"♠"`, `7`). Cards
/// built with [`Card::new`] encode the canonical names. Equality and
/// hashing only look at suit, rank and `playable`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "WireCard", into = "WireCard")]
pub struct Card {
    pub suit: Suit,

    /// Rank label such as `"A"` or `"7"`. Empty for wizards and jesters.
    /// Numeric ranks are kept as their decimal label.
    pub value: String,

    pub playable: bool,

    /// The `suit` and `value` exactly as received, if decoded.
    wire: Option<(String, Rank)>,
}

impl Card {
    /// Creates a card that is not marked playable.
    pub fn new(suit: Suit, value: impl Into<String>) -> Self {
        Self {
            suit,
            value: value.into(),
            playable: false,
            wire: None,
        }
    }

    /// Returns the same card with the `playable` flag set.
    #[must_use]
    pub fn with_playable(mut self, playable: bool) -> Self {
        self.playable = playable;
        self
    }

    /// Same suit and rank, ignoring the `playable` flag.
    pub fn same_face(&self, other: &Card) -> bool {
        self.suit == other.suit && self.value == other.value
    }
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.same_face(other) && self.playable == other.playable
    }
}

impl Eq for Card {}

impl Hash for Card {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.suit.hash(state);
        self.value.hash(state);
        self.playable.hash(state);
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.suit.is_special() || self.value.is_empty() {
            f.write_str(self.suit.symbol())
        } else {
            write!(f, "{}{}", self.value, self.suit.symbol())
        }
    }
}

/// A card's rank in whichever JSON shape the server used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum Rank {
    Text(String),
    Int(i64),
    Float(f64),
    #[default]
    Null,
}

impl Rank {
    fn label(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Int(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::Null => String::new(),
        }
    }
}

/// The JSON shape of a card.
#[derive(Serialize, Deserialize)]
struct WireCard {
    suit: String,
    #[serde(default)]
    value: Rank,
    #[serde(default)]
    playable: bool,
}

impl TryFrom<WireCard> for Card {
    type Error = UnknownSuit;

    fn try_from(wire: WireCard) -> Result<Self, Self::Error> {
        let suit = wire.suit.parse()?;
        Ok(Self {
            suit,
            value: wire.value.label(),
            playable: wire.playable,
            wire: Some((wire.suit, wire.value)),
        })
    }
}

impl From<Card> for WireCard {
    fn from(card: Card) -> Self {
        let (suit, value) = match card.wire {
            // Only trust the received spelling while the face is unchanged.
            Some((suit, value))
                if suit.parse::<Suit>().is_ok_and(|s| s == card.suit)
                    && value.label() == card.value =>
            {
                (suit, value)
            }
            _ => (card.suit.name().to_string(), Rank::Text(card.value)),
        };
        Self {
            suit,
            value,
            playable: card.playable,
        }
    }
}

/// Treats `null` like a missing card list.
fn cards_or_empty<'de, D>(deserializer: D) -> Result<Vec<Card>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Card>>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The stage of a round, as far as the local player is concerned.
///
/// ```text
///   AwaitingReady ──→ Bidding ──→ Playing
///                        ↑           │
///                        └───────────┘  (next round)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No round is running yet; the player may announce they are ready.
    #[default]
    AwaitingReady,
    /// Players announce how many tricks they expect to win.
    Bidding,
    /// Tricks are being played.
    Playing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingReady => write!(f, "awaiting-ready"),
            Self::Bidding => write!(f, "bidding"),
            Self::Playing => write!(f, "playing"),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerFrame (server → client)
// ---------------------------------------------------------------------------

/// One state snapshot pushed by the server.
///
/// This is the field superset across protocol revisions. `turn`, `score`
/// and `n_round` are required; everything else has a default, so a frame
/// missing a required field fails to decode as a whole.
///
/// `phase` is the explicit phase tag of newer servers; `bidding` is a
/// legacy hint. When both are absent the client infers the phase from the
/// other fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFrame {
    #[serde(default)]
    pub trump_card: Option<Card>,

    #[serde(default, deserialize_with = "cards_or_empty")]
    pub hand: Vec<Card>,

    #[serde(default, deserialize_with = "cards_or_empty")]
    pub played_cards: Vec<Card>,

    /// Whether it is the local player's turn.
    pub turn: bool,

    pub score: i64,

    /// The local player's bid; `null` while it has not been placed.
    #[serde(default)]
    pub bid: Option<u32>,

    /// Tricks won so far this round.
    #[serde(default)]
    pub current_tricks: u32,

    /// Cards dealt this round; also the highest legal bid.
    pub n_round: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bidding: Option<bool>,
}

// ---------------------------------------------------------------------------
// ClientAction (client → server)
// ---------------------------------------------------------------------------

/// The three kinds of action a player can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Ready,
    Bid,
    PlayCard,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::Bid => write!(f, "bid"),
            Self::PlayCard => write!(f, "play_card"),
        }
    }
}

/// An action sent to the server.
///
/// `#[serde(tag = "action")]` produces the flat shapes the server expects:
/// `{"action":"ready"}`, `{"action":"bid","n_tricks":2}` and
/// `{"action":"play_card","card":{...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientAction {
    Ready,
    Bid { n_tricks: u32 },
    PlayCard { card: Card },
}

impl ClientAction {
    /// Which kind of action this is.
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Ready => ActionKind::Ready,
            Self::Bid { .. } => ActionKind::Bid,
            Self::PlayCard { .. } => ActionKind::PlayCard,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The server is an external collaborator, so these tests pin the
    //! exact JSON shapes we accept and emit.

    use super::*;

    // =====================================================================
    // Suit
    // =====================================================================

    #[test]
    fn test_suit_parses_names_case_insensitively() {
        assert_eq!("Hearts".parse::<Suit>(), Ok(Suit::Hearts));
        assert_eq!("heart".parse::<Suit>(), Ok(Suit::Hearts));
        assert_eq!("SPADES".parse::<Suit>(), Ok(Suit::Spades));
        assert_eq!("wizard".parse::<Suit>(), Ok(Suit::Wizard));
        assert_eq!("J".parse::<Suit>(), Ok(Suit::Jester));
    }

    #[test]
    fn test_suit_parses_symbols() {
        assert_eq!("♠".parse::<Suit>(), Ok(Suit::Spades));
        assert_eq!("♥".parse::<Suit>(), Ok(Suit::Hearts));
        assert_eq!("♦".parse::<Suit>(), Ok(Suit::Diamonds));
        assert_eq!("♣".parse::<Suit>(), Ok(Suit::Clubs));
    }

    #[test]
    fn test_suit_unknown_is_error() {
        assert_eq!(
            "stars".parse::<Suit>(),
            Err(UnknownSuit("stars".to_string()))
        );
    }

    #[test]
    fn test_suit_serializes_canonical_name() {
        let json = serde_json::to_string(&Suit::Diamonds).unwrap();
        assert_eq!(json, "\"diamonds\"");
    }

    #[test]
    fn test_suit_red_and_special() {
        assert!(Suit::Hearts.is_red());
        assert!(!Suit::Clubs.is_red());
        assert!(Suit::Wizard.is_special());
        assert!(!Suit::Spades.is_special());
    }

    // =====================================================================
    // Card
    // =====================================================================

    #[test]
    fn test_card_decodes_symbol_suit() {
        let card: Card =
            serde_json::from_str(r#"{"suit":"♠","value":"A","playable":true}"#).unwrap();
        assert_eq!(card, Card::new(Suit::Spades, "A").with_playable(true));
    }

    #[test]
    fn test_card_numeric_value_becomes_label() {
        let card: Card = serde_json::from_str(r#"{"suit":"clubs","value":7}"#).unwrap();
        assert_eq!(card.value, "7");
        assert!(!card.playable, "missing playable defaults to false");
    }

    #[test]
    fn test_card_special_without_value() {
        let card: Card = serde_json::from_str(r#"{"suit":"wizard","value":null}"#).unwrap();
        assert_eq!(card.value, "");
        assert_eq!(card.to_string(), "W");
    }

    #[test]
    fn test_card_unknown_suit_fails() {
        let result: Result<Card, _> = serde_json::from_str(r#"{"suit":"stars","value":"1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_card_reencodes_server_spelling() {
        for json in [
            r#"{"suit":"♠","value":"A","playable":true}"#,
            r#"{"suit":"heart","value":7,"playable":true}"#,
            r#"{"suit":"wizard","value":null,"playable":false}"#,
        ] {
            let card: Card = serde_json::from_str(json).unwrap();
            assert_eq!(serde_json::to_string(&card).unwrap(), json);
        }
    }

    #[test]
    fn test_card_changed_face_encodes_canonical_names() {
        let mut card: Card = serde_json::from_str(r#"{"suit":"heart","value":7}"#).unwrap();
        card.value = "8".to_string();
        assert_eq!(
            serde_json::to_value(&card).unwrap(),
            serde_json::json!({"suit": "hearts", "value": "8", "playable": false})
        );
    }

    #[test]
    fn test_card_display() {
        assert_eq!(Card::new(Suit::Hearts, "10").to_string(), "10♥");
        assert_eq!(Card::new(Suit::Jester, "0").to_string(), "J");
    }

    #[test]
    fn test_card_same_face_ignores_playable() {
        let a = Card::new(Suit::Clubs, "3");
        let b = Card::new(Suit::Clubs, "3").with_playable(true);
        assert!(a.same_face(&b));
        assert_ne!(a, b);
    }

    // =====================================================================
    // ServerFrame
    // =====================================================================

    #[test]
    fn test_server_frame_full_shape() {
        let json = r#"{
            "trump_card": {"suit": "hearts", "value": "Q", "playable": false},
            "hand": [{"suit": "♠", "value": "A", "playable": true}],
            "played_cards": [{"suit": "jester", "value": "", "playable": false}],
            "turn": true,
            "score": 30,
            "bid": 2,
            "current_tricks": 1,
            "n_round": 3
        }"#;
        let frame: ServerFrame = serde_json::from_str(json).unwrap();

        assert_eq!(frame.trump_card, Some(Card::new(Suit::Hearts, "Q")));
        assert_eq!(frame.hand.len(), 1);
        assert_eq!(frame.played_cards[0].suit, Suit::Jester);
        assert!(frame.turn);
        assert_eq!(frame.score, 30);
        assert_eq!(frame.bid, Some(2));
        assert_eq!(frame.current_tricks, 1);
        assert_eq!(frame.n_round, 3);
        assert_eq!(frame.phase, None);
    }

    #[test]
    fn test_server_frame_defaults_for_optional_fields() {
        let frame: ServerFrame =
            serde_json::from_str(r#"{"turn": false, "score": 0, "n_round": 1}"#).unwrap();
        assert!(frame.hand.is_empty());
        assert!(frame.played_cards.is_empty());
        assert_eq!(frame.trump_card, None);
        assert_eq!(frame.bid, None);
        assert_eq!(frame.current_tricks, 0);
    }

    #[test]
    fn test_server_frame_null_hand_is_empty() {
        let frame: ServerFrame =
            serde_json::from_str(r#"{"hand": null, "turn": false, "score": 0, "n_round": 1}"#)
                .unwrap();
        assert!(frame.hand.is_empty());
    }

    #[test]
    fn test_server_frame_missing_required_field_fails() {
        // No `turn`.
        let result: Result<ServerFrame, _> =
            serde_json::from_str(r#"{"score": 0, "n_round": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_server_frame_explicit_phase_tag() {
        let frame: ServerFrame = serde_json::from_str(
            r#"{"turn": false, "score": 0, "n_round": 1, "phase": "awaiting_ready"}"#,
        )
        .unwrap();
        assert_eq!(frame.phase, Some(Phase::AwaitingReady));
    }

    // =====================================================================
    // ClientAction
    // =====================================================================

    #[test]
    fn test_client_action_ready_json_format() {
        let json = serde_json::to_value(&ClientAction::Ready).unwrap();
        assert_eq!(json, serde_json::json!({"action": "ready"}));
    }

    #[test]
    fn test_client_action_bid_json_format() {
        let json = serde_json::to_value(&ClientAction::Bid { n_tricks: 2 }).unwrap();
        assert_eq!(json, serde_json::json!({"action": "bid", "n_tricks": 2}));
    }

    #[test]
    fn test_client_action_play_card_json_format() {
        let action = ClientAction::PlayCard {
            card: Card::new(Suit::Spades, "A").with_playable(true),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "action": "play_card",
                "card": {"suit": "spades", "value": "A", "playable": true}
            })
        );
    }

    #[test]
    fn test_client_action_kind() {
        assert_eq!(ClientAction::Ready.kind(), ActionKind::Ready);
        assert_eq!(ClientAction::Bid { n_tricks: 0 }.kind(), ActionKind::Bid);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::AwaitingReady.to_string(), "awaiting-ready");
        assert_eq!(Phase::Playing.to_string(), "playing");
    }
}
