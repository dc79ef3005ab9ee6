//! Protocol messages for netclipper.
//!
//! These are the inner payloads that get sealed before being wrapped
//! in an [`Envelope`](crate::Envelope).

use serde::{Deserialize, Serialize};

use crate::WireError;

/// All possible protocol messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// New clipboard contents from the sender
    Clipboard(ClipboardUpdate),
    /// Graceful disconnect
    Bye(Bye),
}

impl Message {
    /// Serialize to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        rmp_serde::to_vec(self).map_err(WireError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        rmp_serde::from_slice(bytes).map_err(WireError::Deserialization)
    }
}

/// The sender's clipboard changed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardUpdate {
    /// Clipboard text
    pub text: String,
    /// Unix timestamp (seconds) - informational only, not trusted
    pub timestamp: u64,
}

impl ClipboardUpdate {
    /// Create an update stamped with the current time.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }
}

impl std::fmt::Debug for ClipboardUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipboardUpdate")
            .field("text", &format!("[{} bytes REDACTED]", self.text.len()))
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

/// Graceful disconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bye {
    /// Optional reason for disconnect
    pub reason: Option<String>,
}
