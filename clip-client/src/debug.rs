//! Debug instrumentation for the propagation tasks.

use clip_core::SyncEvent;

/// Tracing target for send/receive debug lines.
pub const DEBUG_TARGET: &str = "netclipper::debug";

/// Emits one line per send/receive attempt when enabled.
///
/// Disabled by default. Lines go through `tracing` under
/// [`DEBUG_TARGET`], so where they end up is decided by the subscriber
/// the binary installs (stderr for `netclipper`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugLog {
    enabled: bool,
}

impl DebugLog {
    /// Create a log that is on or off.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Whether lines are emitted.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record one attempt.
    pub fn record(&self, event: &SyncEvent) {
        if !self.enabled {
            return;
        }
        let direction = event.direction().as_str();
        if event.is_error() {
            tracing::warn!(target: DEBUG_TARGET, direction, "{}", event);
        } else {
            tracing::info!(target: DEBUG_TARGET, direction, "{}", event);
        }
    }
}
