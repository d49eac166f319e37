//! Client-side game state for wizsync.
//!
//! Three pieces sit between the connection and the player:
//!
//! - [`Reconciler`]: turns each inbound frame into a complete, immutable
//!   [`GameSnapshot`], or drops it if it does not parse
//! - [`PhaseGate`]: decides which actions are open given the snapshot and
//!   what was already submitted ([`allowed_actions`])
//! - [`ActionSubmitter`]: sends an authorized action once through an
//!   [`ActionSink`] and disables its control
//!
//! # How it fits in the stack
//!
//! ```text
//! Facade (above)  ← runs the event loop, reports to observers
//!     ↕
//! State Layer (this crate)  ← snapshot, gate, submitter
//!     ↕
//! Session Layer (below)  ← ConnectionManager (an ActionSink)
//! ```

mod error;
mod gate;
mod snapshot;
mod submitter;

pub use error::{NotAllowed, SyncError};
pub use gate::{AllowedActions, GateFlags, Intent, PhaseGate, allowed_actions};
pub use snapshot::{GameSnapshot, Reconciler, derive_phase};
pub use submitter::{ActionSink, ActionSubmitter};
