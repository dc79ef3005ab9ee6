//! Key material for the peer channel.
//!
//! A key file holds [`KEY_SIZE`] bytes as hex. Surrounding whitespace
//! (a trailing newline from an editor, for example) is ignored.

use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key size in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Key parsing errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// Not valid hex.
    #[error("key is not valid hex: {0}")]
    InvalidHex(String),

    /// Wrong number of bytes.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// The OS random source failed.
    #[error("random source failed: {0}")]
    Entropy(String),
}

/// A validated shared key.
///
/// Zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial([u8; KEY_SIZE]);

impl KeyMaterial {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh random key.
    pub fn generate() -> Result<Self, KeyError> {
        let mut bytes = [0u8; KEY_SIZE];
        getrandom::getrandom(&mut bytes).map_err(|e| KeyError::Entropy(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

// Don't leak key in debug output
impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyMaterial([REDACTED])")
    }
}

/// Parse the contents of a key file.
pub fn parse_key(text: &str) -> Result<KeyMaterial, KeyError> {
    let mut decoded = hex::decode(text.trim()).map_err(|e| KeyError::InvalidHex(e.to_string()))?;

    if decoded.len() != KEY_SIZE {
        let actual = decoded.len();
        decoded.zeroize();
        return Err(KeyError::InvalidLength {
            expected: KEY_SIZE,
            actual,
        });
    }

    let mut bytes = [0u8; KEY_SIZE];
    bytes.copy_from_slice(&decoded);
    decoded.zeroize();
    Ok(KeyMaterial(bytes))
}

/// Render a key in the key file format (lowercase hex, no newline).
pub fn encode_key(key: &KeyMaterial) -> String {
    hex::encode(key.as_bytes())
}
