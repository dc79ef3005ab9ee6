//! # clip-types
//!
//! Wire format types for netclipper clipboard synchronization.
//!
//! This crate provides the foundational types used across all netclipper crates:
//! - [`ClipboardValue`] - The text payload moved between clipboards
//! - [`DeviceId`] - Per-process sender identity carried in every frame
//! - [`Envelope`] - Outer frame with the sealed message inside
//! - [`Message`] - Protocol messages (ClipboardUpdate, Bye)
//! - [`WireError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod envelope;
mod error;
mod ids;
mod messages;
mod value;

pub use envelope::{Envelope, PROTOCOL_VERSION};
pub use error::WireError;
pub use ids::DeviceId;
pub use messages::{Bye, ClipboardUpdate, Message};
pub use value::ClipboardValue;
