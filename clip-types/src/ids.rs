//! Sender identity for netclipper frames.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the process that sealed a frame.
///
/// UUID v4, generated once at startup. Lets a receiver drop frames that
/// it sent itself (loopback or a misconfigured peer address).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(uuid::Uuid);

impl DeviceId {
    /// Create a new random DeviceId.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Create a DeviceId from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        uuid::Uuid::from_slice(bytes).ok().map(Self)
    }

    /// Get the raw bytes of this DeviceId.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", &self.to_string()[..8])
    }
}
