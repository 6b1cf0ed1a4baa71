//! Last-warning log.

use tracing::warn;

/// Holds the most recent non-fatal playback anomaly.
///
/// A new warning replaces the previous one. Reading with [`take`](Self::take)
/// clears it. Every recorded warning is also emitted as a `tracing` event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarningLog {
    last: Option<String>,
}

impl WarningLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning, replacing any previous one.
    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "playback warning");
        self.last = Some(message);
    }

    /// Most recent warning without clearing it.
    pub fn peek(&self) -> Option<&str> {
        self.last.as_deref()
    }

    /// Remove and return the most recent warning.
    pub fn take(&mut self) -> Option<String> {
        self.last.take()
    }

    /// Drop any pending warning.
    pub fn clear(&mut self) {
        self.last = None;
    }
}
