//! Envelope - the wire format wrapper for all netclipper messages.

use serde::{Deserialize, Serialize};

use crate::{DeviceId, WireError};

/// Current wire protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// The envelope wraps a sealed [`Message`](crate::Message) with the
/// metadata needed to open it.
///
/// Everything outside `ciphertext` travels in the clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Protocol version (currently 1)
    pub version: u8,
    /// Sender's device ID
    pub sender: DeviceId,
    /// Encryption nonce (24 bytes for XChaCha20)
    pub nonce: [u8; 24],
    /// Sealed MessagePack-encoded inner message
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Create a new envelope for sending.
    pub fn new(sender: DeviceId, nonce: [u8; 24], ciphertext: Vec<u8>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            sender,
            nonce,
            ciphertext,
        }
    }

    /// Serialize to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        rmp_serde::to_vec(self).map_err(WireError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    ///
    /// Rejects envelopes from a different protocol version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let envelope: Self = rmp_serde::from_slice(bytes).map_err(WireError::Deserialization)?;
        if envelope.version != PROTOCOL_VERSION {
            return Err(WireError::UnsupportedVersion(envelope.version));
        }
        Ok(envelope)
    }
}
