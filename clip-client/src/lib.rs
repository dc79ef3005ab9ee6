//! # netclipper-client
//!
//! Clipboard sync engine for netclipper.
//!
//! Keeps two clipboards in step over a single encrypted connection.
//!
//! ## Features
//!
//! - **Two Independent Tasks**: outbound and inbound propagation never share state
//! - **Echo Suppression**: a value is never pushed twice in a row in either direction
//! - **E2E Encryption**: XChaCha20-Poly1305 with 192-bit nonces, shared key file
//! - **Transport Abstraction**: Pluggable transport layer (tcp, mock)
//!
//! ## Example
//!
//! ```ignore
//! use netclipper_client::{EngineConfig, SecurePeer, SyncEngine, TcpTransport, TcpTransportConfig};
//!
//! let peer = SecurePeer::new(TcpTransport::new(TcpTransportConfig::dial()), &key);
//! peer.connect("192.168.1.20:7777").await?;
//!
//! let engine = SyncEngine::new(Arc::new(peer), EngineConfig::default());
//! let (changes, notifications) = engine.notification_channel();
//! let handles = engine.start(notifications);
//!
//! // Feed `changes` from a clipboard watcher, then apply what arrives
//! deliver(handles.deliveries, &mut clipboard).await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clipboard;
pub mod crypto;
pub mod debug;
pub mod engine;
pub mod peer;
pub mod transport;

pub use clipboard::{ClipboardError, ClipboardSink, MockClipboard};
pub use crypto::{CryptoError, PeerKey, KEY_SIZE, NONCE_SIZE};
pub use debug::{DebugLog, DEBUG_TARGET};
pub use engine::{deliver, run_inbound, run_outbound, EngineConfig, EngineHandles, SyncEngine};
pub use peer::{Peer, PeerError, Received, SecurePeer};
pub use transport::{
    MockTransport, TcpMode, TcpTransport, TcpTransportConfig, Transport, TransportError,
    MAX_MESSAGE_SIZE,
};
