//! Debug records for send/receive attempts.

use clip_types::ClipboardValue;
use std::fmt;

/// Which way a value is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Local clipboard → peer.
    Send,
    /// Peer → local clipboard.
    Recv,
}

impl Direction {
    /// Upper-case tag used at the start of debug lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Send => "SEND",
            Direction::Recv => "RECV",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one send or receive attempt.
///
/// Suppressed duplicates on the send side never reach the peer and so
/// produce no event. Every receive attempt produces one, duplicates
/// included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A value was handed to the peer.
    Sent(ClipboardValue),
    /// The peer rejected a send.
    SendFailed(String),
    /// A value arrived from the peer.
    Received(ClipboardValue),
    /// The peer reported a receive error.
    ReceiveFailed(String),
}

impl SyncEvent {
    /// The direction this event belongs to.
    pub fn direction(&self) -> Direction {
        match self {
            SyncEvent::Sent(_) | SyncEvent::SendFailed(_) => Direction::Send,
            SyncEvent::Received(_) | SyncEvent::ReceiveFailed(_) => Direction::Recv,
        }
    }

    /// Whether this event records a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, SyncEvent::SendFailed(_) | SyncEvent::ReceiveFailed(_))
    }
}

/// One debug line: `SEND: <value>`, `SEND: ERROR: <error>`, and the same
/// with `RECV`.
impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.direction();
        match self {
            SyncEvent::Sent(value) | SyncEvent::Received(value) => write!(f, "{tag}: {value}"),
            SyncEvent::SendFailed(error) | SyncEvent::ReceiveFailed(error) => {
                write!(f, "{tag}: ERROR: {error}")
            }
        }
    }
}
