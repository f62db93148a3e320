//! Throttled text accumulator for a streaming reply.
//!
//! Fragments are appended as they arrive; a flush is due only when at least
//! one flush interval has passed since the previous flush (or since the
//! accumulator was created). Callers pass `now` explicitly so the cadence is
//! deterministic under test clocks.

use std::time::{Duration, Instant};

/// Minimum spacing between delta-triggered partial updates.
pub const FLUSH_INTERVAL: Duration = Duration::from_millis(1000);

/// Growing assistant reply plus its flush timer.
#[derive(Debug, Clone)]
pub struct MessageAccumulator {
    text: String,
    last_flush: Instant,
    interval: Duration,
    fragments: usize,
    flushes: usize,
}

impl MessageAccumulator {
    /// Creates an empty accumulator whose flush timer starts at `started_at`.
    pub fn new(started_at: Instant) -> Self {
        Self::with_interval(started_at, FLUSH_INTERVAL)
    }

    /// Creates an accumulator with a custom flush interval.
    pub fn with_interval(started_at: Instant, interval: Duration) -> Self {
        Self {
            text: String::new(),
            last_flush: started_at,
            interval,
            fragments: 0,
            flushes: 0,
        }
    }

    /// Appends a fragment and returns the full text if a flush is due.
    ///
    /// Returning `Some` resets the flush timer to `now`.
    pub fn append(&mut self, fragment: &str, now: Instant) -> Option<String> {
        self.text.push_str(fragment);
        self.fragments += 1;

        if now.saturating_duration_since(self.last_flush) >= self.interval {
            self.last_flush = now;
            self.flushes += 1;
            Some(self.text.clone())
        } else {
            None
        }
    }

    /// Accumulated text so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of fragments appended.
    pub fn fragment_count(&self) -> usize {
        self.fragments
    }

    /// Number of flushes handed out.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// When the last flush happened (or the accumulator started).
    pub fn last_flush(&self) -> Instant {
        self.last_flush
    }
}
