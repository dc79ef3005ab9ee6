//! Clipboard collaborator seam.
//!
//! The engine only ever writes to the clipboard through [`ClipboardSink`].
//! Change notifications arrive the other way, as values pushed into the
//! outbound channel by whoever watches the OS clipboard.

use clip_types::ClipboardValue;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc;

/// Clipboard errors.
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// The clipboard could not be opened.
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    /// Writing the value failed.
    #[error("clipboard write failed: {0}")]
    WriteFailed(String),
}

/// Something that can overwrite the local clipboard.
///
/// Setting the value already present must be harmless.
pub trait ClipboardSink {
    /// Replace the clipboard contents.
    fn set(&mut self, value: &ClipboardValue) -> Result<(), ClipboardError>;
}

/// In-memory clipboard for tests.
///
/// Records every write. With [`MockClipboard::echo_writes_to`] each write
/// is also reported as a change notification, the way a real clipboard
/// watcher would see it.
#[derive(Debug, Clone, Default)]
pub struct MockClipboard {
    inner: Arc<Mutex<MockClipboardInner>>,
}

#[derive(Debug, Default)]
struct MockClipboardInner {
    current: Option<ClipboardValue>,
    writes: Vec<ClipboardValue>,
    fail_next_set: Option<String>,
    echo: Option<mpsc::UnboundedSender<ClipboardValue>>,
}

impl MockClipboard {
    /// Create an empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report every successful write on `echo`.
    pub fn echo_writes_to(&self, echo: mpsc::UnboundedSender<ClipboardValue>) {
        self.inner.lock().unwrap().echo = Some(echo);
    }

    /// Current contents.
    pub fn current(&self) -> Option<ClipboardValue> {
        self.inner.lock().unwrap().current.clone()
    }

    /// Every value written, in order.
    pub fn writes(&self) -> Vec<ClipboardValue> {
        self.inner.lock().unwrap().writes.clone()
    }

    /// Cause the next set() to fail with the given error.
    pub fn fail_next_set(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_set = Some(error.to_string());
    }
}

impl ClipboardSink for MockClipboard {
    fn set(&mut self, value: &ClipboardValue) -> Result<(), ClipboardError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(error) = inner.fail_next_set.take() {
            return Err(ClipboardError::WriteFailed(error));
        }

        inner.current = Some(value.clone());
        inner.writes.push(value.clone());
        if let Some(echo) = &inner.echo {
            let _ = echo.send(value.clone());
        }
        Ok(())
    }
}
