//! Flush policy of the streaming relay, kept free of I/O so it can be driven with any clock.

use std::time::Duration;
use tokio::time::Instant;

/// Interval between visible updates when a stream starts.
pub const INITIAL_FLUSH_INTERVAL: Duration = Duration::from_secs(1);
/// The interval is reconsidered once every this many updates.
pub const UPDATES_PER_BACKOFF_CHECK: u32 = 10;
/// Appended to intermediate updates so readers can tell the reply is still being written.
pub const IN_PROGRESS_SUFFIX: &str = "...";

/// Per-response relay state: accumulated text plus the adaptive flush schedule.
///
/// One value per in-flight response; never shared or reused.
#[derive(Debug, Clone)]
pub struct StreamState {
    buffer: String,
    last_flush: Instant,
    interval: Duration,
    update_count: u32,
}

impl StreamState {
    /// Starts an empty state; `now` counts as the last flush so nothing is sent before the first interval.
    pub fn new(now: Instant) -> Self {
        Self {
            buffer: String::new(),
            last_flush: now,
            interval: INITIAL_FLUSH_INTERVAL,
            update_count: 0,
        }
    }

    pub fn push(&mut self, fragment: &str) {
        self.buffer.push_str(fragment);
    }

    /// True once strictly more than the current interval has passed since the last flush.
    pub fn flush_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_flush) > self.interval
    }

    /// Buffer plus the in-progress marker, as shown by intermediate updates.
    pub fn in_progress_text(&self) -> String {
        format!("{}{}", self.buffer, IN_PROGRESS_SUFFIX)
    }

    /// Records a delivered update. Returns true when this update doubled the interval.
    ///
    /// Every [`UPDATES_PER_BACKOFF_CHECK`] updates the interval doubles if
    /// `update_count / 10` exceeds the interval in seconds.
    pub fn record_flush(&mut self, now: Instant) -> bool {
        self.last_flush = now;
        self.update_count += 1;
        if self.update_count % UPDATES_PER_BACKOFF_CHECK == 0 {
            let checks = f64::from(self.update_count / UPDATES_PER_BACKOFF_CHECK);
            if checks > self.interval.as_secs_f64() {
                self.interval *= 2;
                return true;
            }
        }
        false
    }

    /// Records an update the sink rejected: the schedule restarts but the update is not counted.
    pub fn record_failed_flush(&mut self, now: Instant) {
        self.last_flush = now;
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn update_count(&self) -> u32 {
        self.update_count
    }
}
