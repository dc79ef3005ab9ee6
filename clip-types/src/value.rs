//! The clipboard payload.

use std::fmt;
use std::sync::Arc;

/// An immutable text payload read from or written to a clipboard.
///
/// Cloning is cheap (shared buffer). Equality is by content, which is
/// what echo suppression compares. No size limit is imposed here.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ClipboardValue(Arc<str>);

impl ClipboardValue {
    /// Create a value from anything string-like.
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    /// Borrow the text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the text is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for ClipboardValue {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for ClipboardValue {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl AsRef<str> for ClipboardValue {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ClipboardValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Clipboards hold passwords often enough; keep them out of debug output
impl fmt::Debug for ClipboardValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClipboardValue([{} bytes])", self.0.len())
    }
}
