//! Codec trait and the JSON implementation used on the wire.
//!
//! A codec converts between Rust types and raw bytes. The rest of the
//! client only needs something that implements [`Codec`]; today that is
//! [`JsonCodec`], because the server speaks JSON text frames.

use serde::{de::DeserializeOwned, Serialize};

#[cfg(feature = "json")]
use crate::{ClientAction, ServerFrame};
use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use wizsync_protocol::{ClientAction, Codec, JsonCodec};
///
/// let bytes = JsonCodec.encode(&ClientAction::Bid { n_tricks: 1 }).unwrap();
/// assert_eq!(bytes, br#"{"action":"bid","n_tricks":1}"#);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(feature = "json")]
impl JsonCodec {
    /// Decodes one server frame.
    ///
    /// One server revision JSON-encoded the snapshot twice, so a frame that
    /// is a JSON *string* is unwrapped once and decoded again. Anything that
    /// is neither an object nor a string holding an object is rejected.
    pub fn decode_frame(&self, data: &[u8]) -> Result<ServerFrame, ProtocolError> {
        let value: serde_json::Value = self.decode(data)?;
        let value = match value {
            serde_json::Value::String(inner) => self.decode(inner.as_bytes())?,
            other => other,
        };
        if !value.is_object() {
            return Err(ProtocolError::InvalidMessage(format!(
                "expected a snapshot object, got {}",
                json_kind(&value)
            )));
        }
        serde_json::from_value(value).map_err(ProtocolError::Decode)
    }

    /// Encodes an action as the text of one WebSocket frame.
    pub fn encode_action(&self, action: &ClientAction) -> Result<String, ProtocolError> {
        serde_json::to_string(action).map_err(ProtocolError::Encode)
    }
}

#[cfg(feature = "json")]
fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
