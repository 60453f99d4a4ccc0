//! General time utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use chrono;
use std::thread;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Monotonic millisecond tick source.
///
/// All threads of an executable share one clock so that timestamps written
/// by one thread can be compared against the tick count read by another.
#[derive(Debug, Clone, Copy)]
pub struct MonoClock {
    epoch: Instant
}

/// Periodic timer implementing "wake at next period".
///
/// The next deadline is always the previous deadline plus the period, so
/// jitter in one iteration does not shift the following ones.
#[derive(Debug)]
pub struct PeriodicTimer {
    period: Duration,
    next_deadline: Instant,
}

/// The result of waiting on a [`PeriodicTimer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerWait {
    /// The deadline was met, the thread slept for the contained duration.
    OnTime(Duration),

    /// The caller was already late by the contained duration when it asked
    /// to wait.
    Overrun(Duration),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MonoClock {
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }

    /// Milliseconds elapsed since the clock was created.
    pub fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

impl Default for MonoClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PeriodicTimer {
    /// Create a new timer whose first deadline is one period from now.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_deadline: Instant::now() + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Block until the next deadline, then advance the deadline by one
    /// period.
    ///
    /// If more than a whole period has been missed the missed deadlines are
    /// skipped rather than run back to back.
    pub fn wait(&mut self) -> TimerWait {
        let now = Instant::now();

        let result = match self.next_deadline.checked_duration_since(now) {
            Some(d) => {
                thread::sleep(d);
                TimerWait::OnTime(d)
            },
            None => TimerWait::Overrun(now - self.next_deadline)
        };

        self.next_deadline += self.period;
        while self.next_deadline <= now {
            self.next_deadline += self.period;
        }

        result
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}
