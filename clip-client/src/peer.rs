//! The peer handle: clipboard values in, clipboard values out.
//!
//! [`Peer`] is the narrow seam the propagation tasks talk to.
//! [`SecurePeer`] implements it on top of any [`Transport`] by sealing
//! each value into an [`Envelope`].

use async_trait::async_trait;
use clip_core::KeyMaterial;
use clip_types::{Bye, ClipboardUpdate, ClipboardValue, DeviceId, Envelope, Message, WireError};
use thiserror::Error;

use crate::crypto::{CryptoError, PeerKey};
use crate::transport::{Transport, TransportError};

/// Peer errors.
#[derive(Debug, Error)]
pub enum PeerError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Crypto error.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Wire format error.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// The peer said goodbye.
    #[error("peer closed the session: {}", .0.as_deref().unwrap_or("no reason given"))]
    Closed(Option<String>),

    /// A frame we sealed ourselves came back.
    #[error("dropped frame sent by this device")]
    OwnEcho,
}

/// A value received from the peer, with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    /// The clipboard text.
    pub value: ClipboardValue,
    /// Who sealed it.
    pub sender: DeviceId,
    /// Sender's clock when it sealed the value (informational).
    pub timestamp: u64,
}

/// A live connection to exactly one remote clipboard.
///
/// Must tolerate one `send` and one `recv` running concurrently.
#[async_trait]
pub trait Peer: Send + Sync {
    /// Hand a value to the peer.
    async fn send(&self, value: &ClipboardValue) -> Result<(), PeerError>;

    /// Wait for the next value from the peer.
    ///
    /// Suspends until a value or an error is available.
    async fn recv(&self) -> Result<Received, PeerError>;
}

/// A [`Peer`] that seals every value with the shared key.
pub struct SecurePeer<T: Transport> {
    transport: T,
    key: PeerKey,
    device_id: DeviceId,
}

impl<T: Transport> SecurePeer<T> {
    /// Wrap a transport. A fresh [`DeviceId`] identifies this process.
    pub fn new(transport: T, material: &KeyMaterial) -> Self {
        Self {
            transport,
            key: PeerKey::derive(material),
            device_id: DeviceId::random(),
        }
    }

    /// This process's sender id.
    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Connect the underlying transport.
    pub async fn connect(&self, address: &str) -> Result<(), PeerError> {
        self.transport.connect(address).await?;
        tracing::debug!("Connected to peer at {}", address);
        Ok(())
    }

    /// Say goodbye (best effort) and close the transport.
    pub async fn close(&self, reason: Option<&str>) -> Result<(), PeerError> {
        if self.transport.is_connected() {
            let bye = Message::Bye(Bye {
                reason: reason.map(str::to_string),
            });
            match self.seal(&bye) {
                Ok(bytes) => {
                    if let Err(e) = self.transport.send(&bytes).await {
                        tracing::debug!("Failed to send Bye: {}", e);
                    }
                }
                Err(e) => tracing::debug!("Failed to seal Bye: {}", e),
            }
        }
        self.transport.close().await?;
        Ok(())
    }

    fn seal(&self, message: &Message) -> Result<Vec<u8>, PeerError> {
        let plaintext = message.to_bytes()?;
        let (ciphertext, nonce) = self.key.seal(&plaintext)?;
        Ok(Envelope::new(self.device_id, nonce, ciphertext).to_bytes()?)
    }

    fn open(&self, bytes: &[u8]) -> Result<(DeviceId, Message), PeerError> {
        let envelope = Envelope::from_bytes(bytes)?;
        if envelope.sender == self.device_id {
            return Err(PeerError::OwnEcho);
        }
        let plaintext = self.key.open(&envelope.ciphertext, &envelope.nonce)?;
        Ok((envelope.sender, Message::from_bytes(&plaintext)?))
    }
}

#[async_trait]
impl<T: Transport> Peer for SecurePeer<T> {
    async fn send(&self, value: &ClipboardValue) -> Result<(), PeerError> {
        let message = Message::Clipboard(ClipboardUpdate::new(value.as_str()));
        let bytes = self.seal(&message)?;
        self.transport.send(&bytes).await?;
        Ok(())
    }

    async fn recv(&self) -> Result<Received, PeerError> {
        let bytes = self.transport.recv().await?;
        match self.open(&bytes)? {
            (sender, Message::Clipboard(update)) => Ok(Received {
                value: ClipboardValue::from(update.text),
                sender,
                timestamp: update.timestamp,
            }),
            (_, Message::Bye(bye)) => Err(PeerError::Closed(bye.reason)),
        }
    }
}

impl<T: Transport> std::fmt::Debug for SecurePeer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurePeer")
            .field("device_id", &self.device_id)
            .field("connected", &self.transport.is_connected())
            .finish()
    }
}
