//! Codec trait and implementations for (de)serializing events.
//!
//! The transport only moves frames; a [`Codec`] decides what a frame looks
//! like. Browsers speak JSON text frames, so [`JsonCodec`] is the one the
//! server uses, but nothing above this module depends on that choice.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values into text frames and decodes raw frames back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the whole lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a received frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use wordduel_protocol::{ClientEvent, Codec, JsonCodec, RoomId};
///
/// let codec = JsonCodec;
/// let frame = codec.encode(&ClientEvent::JoinRoom(RoomId::from("r1"))).unwrap();
/// assert_eq!(frame, r#"{"event":"join_room","data":"r1"}"#);
///
/// let back: ClientEvent = codec.decode(frame.as_bytes()).unwrap();
/// assert_eq!(back, ClientEvent::JoinRoom(RoomId::from("r1")));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
