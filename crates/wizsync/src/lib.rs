//! # wizsync
//!
//! Client sync core for the Wizard trick-taking card game.
//!
//! The server is authoritative: it pushes a complete snapshot of the game
//! after every change, and the client only ever sends one of three
//! actions (ready, bid, play a card). wizsync keeps the connection alive,
//! holds the latest snapshot, works out which actions are open right now,
//! and makes sure each one is sent at most once.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wizsync::prelude::*;
//!
//! # async fn demo() -> Result<(), WizsyncError> {
//! let (handle, mut events) = WizardSession::builder()
//!     .host("localhost:8000")
//!     .start_websocket();
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         SessionEvent::Snapshot(snapshot) => println!("phase: {}", snapshot.phase),
//!         SessionEvent::AffordancesChanged(allowed) if allowed.ready => {
//!             handle.ready().await?;
//!         }
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod event;
mod session;

pub use error::WizsyncError;
pub use event::{DEFAULT_EVENT_CHANNEL_CAPACITY, SessionEvent};
pub use session::{SessionBuilder, SessionHandle, WizardSession};

pub use wizsync_protocol as protocol;
pub use wizsync_session as connection;
pub use wizsync_state as state;
pub use wizsync_transport as transport;

pub mod prelude {
    //! Everything a typical client needs.

    pub use crate::{SessionBuilder, SessionEvent, SessionHandle, WizardSession, WizsyncError};
    pub use wizsync_protocol::{ActionKind, Card, ClientAction, Phase, Suit};
    pub use wizsync_session::{ConnectionConfig, ConnectionState, PlayerId};
    pub use wizsync_state::{AllowedActions, GameSnapshot, Intent, NotAllowed, SyncError};
}
