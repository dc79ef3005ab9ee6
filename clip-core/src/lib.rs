//! # clip-core
//!
//! Pure logic for netclipper (no I/O, instant tests).
//!
//! This crate holds the decisions the propagation tasks make, without any
//! network, clipboard, or disk access:
//! - [`EchoState`]: per-direction last-value memory that breaks the
//!   clipboard → peer → clipboard feedback loop
//! - [`SyncEvent`]: one record per send/receive attempt, rendered as the
//!   debug line format
//! - [`parse_key`]: key file validation
//!
//! The actual I/O is performed by `clip-client`, which feeds values through
//! these types.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod echo;
pub mod event;
pub mod key;

pub use echo::EchoState;
pub use event::{Direction, SyncEvent};
pub use key::{encode_key, parse_key, KeyError, KeyMaterial, KEY_SIZE};
