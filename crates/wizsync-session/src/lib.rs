//! Player identity and the reconnecting connection manager for wizsync.
//!
//! 1. **Identity**: a random [`PlayerId`] chosen before the first connect
//! 2. **Configuration**: [`ConnectionConfig`] (host, scheme, retry delay)
//! 3. **Connection lifecycle**: [`ConnectionManager`], which keeps one
//!    channel open and retries on a fixed delay after every loss
//!
//! # How it fits in the stack
//!
//! ```text
//! State Layer (above)  ← feeds frames to the reconciler, writes actions
//!     ↕
//! Session Layer (this crate)  ← owns the channel and its state machine
//!     ↕
//! Transport Layer (below)  ← Connector / Connection
//! ```

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::{ChannelEvent, ConnectionEvent, ConnectionManager};
pub use session::{ConnectionConfig, ConnectionState, PLAYER_ID_LEN, PlayerId};
