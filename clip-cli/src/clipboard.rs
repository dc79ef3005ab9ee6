//! OS clipboard access via arboard.
//!
//! The watcher thread polls the text clipboard and reports changes; the
//! sink writes delivered values. Both share a [`LastSeen`] so that a value
//! the sink just wrote is not reported back as a local change.

use arboard::Clipboard;
use clip_client::{ClipboardError, ClipboardSink};
use clip_types::ClipboardValue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;

/// The clipboard text most recently read or written by this process.
#[derive(Debug, Clone, Default)]
pub struct LastSeen {
    text: Arc<Mutex<Option<String>>>,
}

impl LastSeen {
    /// Record `text` as seen. Returns true if it differs from what was
    /// seen before.
    pub fn observe(&self, text: &str) -> bool {
        let mut last = self.lock();
        if last.as_deref() == Some(text) {
            return false;
        }
        *last = Some(text.to_string());
        true
    }

    /// Record `text` without asking whether it changed.
    pub fn mark(&self, text: &str) {
        *self.lock() = Some(text.to_string());
    }

    /// Run `write`, which puts `text` on the clipboard, with `text`
    /// already recorded so a poll landing mid-write sees no change.
    ///
    /// If the write fails the clipboard still holds the old text, so the
    /// old record comes back. A newer observation made meanwhile is kept.
    pub fn write_with<E>(
        &self,
        text: &str,
        write: impl FnOnce(&str) -> Result<(), E>,
    ) -> Result<(), E> {
        let previous = self.lock().replace(text.to_string());

        let result = write(text);
        if result.is_err() {
            let mut last = self.lock();
            if last.as_deref() == Some(text) {
                *last = previous;
            }
        }
        result
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // A poisoned lock still holds a usable string
        self.text.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Polls the OS clipboard on a dedicated thread.
pub struct ClipboardWatcher {
    poll_interval: Duration,
    last_seen: LastSeen,
    running: Arc<AtomicBool>,
}

impl ClipboardWatcher {
    /// Create a watcher.
    pub fn new(poll_interval: Duration, last_seen: LastSeen) -> Self {
        Self {
            poll_interval,
            last_seen,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start polling. Every change is pushed into `changes`, waiting while
    /// the channel is full. Stops when `changes` closes or on [`stop`].
    ///
    /// Whatever is on the clipboard at start is not reported.
    ///
    /// [`stop`]: ClipboardWatcher::stop
    pub fn start(&self, changes: mpsc::Sender<ClipboardValue>) -> std::io::Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Clipboard watcher is already running");
            return Ok(());
        }

        let running = Arc::clone(&self.running);
        let last_seen = self.last_seen.clone();
        let interval = self.poll_interval;

        thread::Builder::new()
            .name("clipboard-watcher".into())
            .spawn(move || {
                tracing::debug!("Clipboard watcher started with {:?} interval", interval);
                let mut clipboard: Option<Clipboard> = None;
                let mut primed = false;

                while running.load(Ordering::SeqCst) {
                    if clipboard.is_none() {
                        clipboard = match Clipboard::new() {
                            Ok(cb) => Some(cb),
                            Err(e) => {
                                tracing::error!("Failed to open clipboard: {}", e);
                                thread::sleep(interval);
                                continue;
                            }
                        };
                    }

                    // Non-text contents read as an error; nothing to report
                    let text = clipboard.as_mut().and_then(|cb| cb.get_text().ok());

                    if let Some(text) = text {
                        if !primed {
                            last_seen.mark(&text);
                        } else if last_seen.observe(&text) {
                            tracing::debug!("Clipboard changed ({} bytes)", text.len());
                            if changes.blocking_send(ClipboardValue::from(text)).is_err() {
                                break;
                            }
                        }
                    }
                    primed = true;

                    thread::sleep(interval);
                }

                running.store(false, Ordering::SeqCst);
                tracing::debug!("Clipboard watcher stopped");
            })?;

        Ok(())
    }

    /// Ask the thread to exit after its current poll.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Writes delivered values to the OS clipboard.
pub struct SystemClipboard {
    clipboard: Clipboard,
    last_seen: LastSeen,
}

impl SystemClipboard {
    /// Open the OS clipboard.
    pub fn open(last_seen: LastSeen) -> Result<Self, ClipboardError> {
        let clipboard =
            Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        Ok(Self {
            clipboard,
            last_seen,
        })
    }
}

impl ClipboardSink for SystemClipboard {
    fn set(&mut self, value: &ClipboardValue) -> Result<(), ClipboardError> {
        let clipboard = &mut self.clipboard;
        self.last_seen
            .write_with(value.as_str(), |text| clipboard.set_text(text))
            .map_err(|e| ClipboardError::WriteFailed(e.to_string()))
    }
}
