//! Transport abstraction for netclipper.
//!
//! This module provides a pluggable transport layer that abstracts
//! the underlying connection mechanism (TCP, mock for testing).
//!
//! # Design
//!
//! The transport trait is async and connection-oriented:
//! - `connect()` establishes a connection to exactly one peer
//! - `send()` transmits sealed envelope bytes
//! - `recv()` receives envelope bytes, suspending until a frame arrives
//! - `close()` gracefully terminates
//!
//! Implementations must allow one `send()` and one `recv()` to be in
//! flight at the same time on the same connection: the outbound task
//! writes while the inbound task is parked in `recv()`.
//!
//! # Example
//!
//! ```ignore
//! let transport = TcpTransport::new(TcpTransportConfig::dial());
//! transport.connect("192.168.1.20:7777").await?;
//! transport.send(envelope_bytes).await?;
//! let frame = transport.recv().await?;
//! ```

mod mock;
mod tcp;

pub use mock::MockTransport;
pub use tcp::{TcpMode, TcpTransport, TcpTransportConfig};

use async_trait::async_trait;
use thiserror::Error;

/// Maximum frame size (1 MiB).
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Not connected.
    #[error("not connected")]
    NotConnected,

    /// Connection closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Connection timeout.
    #[error("connection timeout")]
    Timeout,
}

/// Transport trait for moving frames to and from the peer.
///
/// Implementations handle the underlying connection mechanism
/// (TCP, mock, etc).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to the peer identified by the given address.
    ///
    /// For TCP this is a `host:port`. For testing, it's arbitrary.
    async fn connect(&self, address: &str) -> Result<(), TransportError>;

    /// Send bytes over the connection.
    ///
    /// The bytes are typically a sealed envelope.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Receive bytes from the connection.
    ///
    /// Blocks until data is available or connection closes.
    async fn recv(&self) -> Result<Vec<u8>, TransportError>;

    /// Check if currently connected.
    fn is_connected(&self) -> bool;

    /// Close the connection gracefully.
    async fn close(&self) -> Result<(), TransportError>;
}
