//! Per-client fixed window state.

/// The request count for one client within its current window.
///
/// A window is anchored to the client's first request in it and ends
/// `window_ms` later. Records are only created by [`ClientWindow::open`],
/// so `count` starts at 1 and never drops below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientWindow {
    /// Requests admitted in this window
    count: u64,
    /// Absolute expiry time (milliseconds since the Unix epoch)
    window_end_ms: u64,
}

impl ClientWindow {
    /// Open a new window for a client's first request.
    pub fn open(now_ms: u64, window_ms: u64) -> Self {
        Self {
            count: 1,
            window_end_ms: now_ms.saturating_add(window_ms),
        }
    }

    /// Get the current count.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Get the absolute time at which this window ends.
    pub fn window_end_ms(&self) -> u64 {
        self.window_end_ms
    }

    /// Whether the window has passed. The end instant itself is still active.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.window_end_ms
    }

    /// Count one more admitted request.
    pub fn record(&mut self) {
        self.count += 1;
    }

    /// Get the remaining quota under `limit`.
    pub fn remaining(&self, limit: u64) -> u64 {
        limit.saturating_sub(self.count)
    }

    /// Whole seconds until the window ends, rounded up.
    pub fn retry_after_secs(&self, now_ms: u64) -> u64 {
        self.window_end_ms.saturating_sub(now_ms).div_ceil(1000)
    }
}
