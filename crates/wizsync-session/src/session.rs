//! Session types: who the local player is and how to reach the server.
//!
//! - WHO: a [`PlayerId`] generated once, before any connection
//! - WHERE: a [`ConnectionConfig`] naming the host and retry delay
//! - WHAT state the channel is in: [`ConnectionState`]

use std::fmt;
use std::time::Duration;

use rand::Rng;

// ---------------------------------------------------------------------------
// PlayerId
// ---------------------------------------------------------------------------

/// Characters a player id is drawn from (base 36).
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of a generated player id.
pub const PLAYER_ID_LEN: usize = 9;

/// The local player's identity, sent once as the last path segment of the
/// connect URL.
///
/// Generated client-side with no uniqueness handshake; with 36^9 possible
/// values, collisions between players at one table are not a concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerId(String);

impl PlayerId {
    /// Generates a random 9-character base-36 id.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let id = (0..PLAYER_ID_LEN)
            .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
            .collect();
        Self(id)
    }

    /// Wraps an existing id, e.g. one restored from a previous run.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as it appears in the URL.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ConnectionConfig
// ---------------------------------------------------------------------------

/// Where the game server lives and how eagerly to reconnect.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// `host[:port]` of the game server, without scheme or path.
    ///
    /// Default: `localhost:8000`.
    pub host: String,

    /// Use `wss://` instead of `ws://`.
    pub secure: bool,

    /// Fixed pause between losing the channel and the next connect
    /// attempt. Retries never stop.
    ///
    /// Default: 1 second.
    pub reconnect_delay: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost:8000".to_string(),
            secure: false,
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

impl ConnectionConfig {
    /// The full connect URL for `player`: `ws(s)://<host>/ws/<player>`.
    pub fn url_for(&self, player: &PlayerId) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{scheme}://{}/ws/{player}", self.host.trim_end_matches('/'))
    }
}

// ---------------------------------------------------------------------------
// ConnectionState
// ---------------------------------------------------------------------------

/// The state of the channel to the server.
///
/// ```text
///   Disconnected ──(connect)──→ Connecting ──(open)──→ Connected
///        ↑                          │                      │
///        └──────(failed open)───────┘                      │
///        └────────────(close / error / failed write)───────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}
