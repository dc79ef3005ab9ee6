//! CLI command implementations.

pub mod keygen;
pub mod sync;
