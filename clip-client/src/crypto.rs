//! Cryptographic primitives for netclipper.
//!
//! This module provides:
//! - HKDF-SHA256 derivation of the channel key from the shared key file
//! - XChaCha20-Poly1305 sealing with random 192-bit nonces
//!
//! # Security Notes
//!
//! - XChaCha20 uses 192-bit nonces (24 bytes), safe for random generation
//! - Both peers hold the same key; there is no handshake
//! - Key bytes are zeroized on drop

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use clip_core::KeyMaterial;
use hkdf::Hkdf;
use sha2::Sha256;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub use clip_core::KEY_SIZE;

/// Nonce size for XChaCha20-Poly1305 (192 bits = 24 bytes).
pub const NONCE_SIZE: usize = 24;

/// Crypto errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Encryption failed.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed (authentication error).
    #[error("decryption failed: authentication error")]
    DecryptionFailed,

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
}

/// The symmetric key protecting traffic with the peer.
///
/// Derived from the shared [`KeyMaterial`] via HKDF-SHA256 so the raw key
/// file bytes are never used directly as a cipher key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PeerKey {
    encryption_key: [u8; KEY_SIZE],
}

impl PeerKey {
    /// Derive the channel key from shared key material.
    pub fn derive(material: &KeyMaterial) -> Self {
        let hkdf = Hkdf::<Sha256>::new(Some(b"netclipper-peer-key-v1"), material.as_bytes());

        let mut encryption_key = [0u8; KEY_SIZE];
        // 32 bytes is far below the HKDF-SHA256 output limit
        hkdf.expand(b"encryption", &mut encryption_key)
            .expect("hkdf expand failed");

        Self { encryption_key }
    }

    /// Derive from an unchecked byte slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; KEY_SIZE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: KEY_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(Self::derive(&KeyMaterial::from_bytes(array)))
    }

    /// Get the encryption key.
    pub fn encryption_key(&self) -> &[u8; KEY_SIZE] {
        &self.encryption_key
    }

    /// Seal data using XChaCha20-Poly1305.
    ///
    /// Returns (ciphertext, nonce). Nonce is 192 bits (24 bytes),
    /// safe for random generation without coordination.
    pub fn seal(&self, plaintext: &[u8]) -> Result<(Vec<u8>, [u8; NONCE_SIZE]), CryptoError> {
        // Generate random 192-bit nonce
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce_bytes)
            .map_err(|e| CryptoError::EncryptionFailed(format!("nonce generation: {e}")))?;
        let nonce = XNonce::from_slice(&nonce_bytes);

        let cipher = XChaCha20Poly1305::new_from_slice(&self.encryption_key)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CryptoError::EncryptionFailed("aead encrypt failed".into()))?;

        Ok((ciphertext, nonce_bytes))
    }

    /// Open data sealed with [`PeerKey::seal`].
    pub fn open(&self, ciphertext: &[u8], nonce: &[u8; NONCE_SIZE]) -> Result<Vec<u8>, CryptoError> {
        let nonce = XNonce::from_slice(nonce);

        let cipher = XChaCha20Poly1305::new_from_slice(&self.encryption_key)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

// Don't leak keys in debug output
impl std::fmt::Debug for PeerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PeerKey {{ encryption_key: [REDACTED] }}")
    }
}
