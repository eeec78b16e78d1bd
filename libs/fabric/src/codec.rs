//! Message encodings.
//!
//! Mopidy only speaks JSON, but the connection loop and the one-off request
//! helpers are written against [`Codec`] so tests can decode the same frames
//! the loop sees.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// Turns whole messages into frame payloads and back
pub trait Codec: Send + Sync {
    /// Encode a value into one frame payload
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>>;

    /// Decode one frame payload; failures are `Error::Codec`
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

/// JSON codec, one UTF-8 document per message
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| Error::Codec(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| Error::Codec(e.to_string()))
    }
}
