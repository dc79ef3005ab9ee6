//! Echo suppression.
//!
//! Applying a remote value to the local clipboard fires a local change
//! notification carrying that same value. Each propagation direction keeps
//! the last value it handled and refuses to handle an equal value again,
//! so the echo dies one hop later instead of bouncing forever.
//!
//! The memory is consecutive-only: `A, B, A` admits all three. It cannot
//! tell "the peer echoed our own value" from "both sides happened to
//! converge on the same text again", and it is not meant to.

use clip_types::ClipboardValue;

/// Last-value memory for one propagation direction.
///
/// Owned by exactly one task; never shared, so no locking.
#[derive(Debug, Clone, Default)]
pub struct EchoState {
    last: Option<ClipboardValue>,
}

impl EchoState {
    /// Create an empty state (nothing handled yet).
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Decide whether `value` should be propagated.
    ///
    /// Returns `false` and leaves the state untouched when `value` equals
    /// the last admitted value. Otherwise remembers `value` and returns
    /// `true`.
    pub fn admit(&mut self, value: &ClipboardValue) -> bool {
        if self.last.as_ref() == Some(value) {
            return false;
        }
        self.last = Some(value.clone());
        true
    }

    /// The last admitted value, if any.
    pub fn last(&self) -> Option<&ClipboardValue> {
        self.last.as_ref()
    }
}
