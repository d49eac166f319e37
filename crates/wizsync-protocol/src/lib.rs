//! Wire protocol for the wizsync card-game client.
//!
//! This crate defines the "language" the client and the game server speak:
//!
//! - **Types** ([`ServerFrame`], [`ClientAction`], [`Card`], [`Suit`],
//!   [`Phase`]): the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those structures
//!   are converted to and from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing so.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (ServerFrame) → State (GameSnapshot)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ActionKind, Card, ClientAction, Phase, ServerFrame, Suit, UnknownSuit};
