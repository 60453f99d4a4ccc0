//! # Input freshness watchdog
//!
//! The supervisor records when it last received an RC frame, an orientation
//! sample and when it last completed an iteration. These timestamps are
//! checked inside every tick, and by an independent watchdog thread which
//! also catches a stalled control loop.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, error};
use serde::Serialize;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

// Internal
use util::time::MonoClock;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Time of the last receipt of each supervised input.
///
/// All timestamps are milliseconds of the executable's shared clock.
#[derive(Debug, Default)]
pub struct Freshness {
    started: AtomicBool,
    last_ppm_ms: AtomicU64,
    last_orientation_ms: AtomicU64,
    last_loop_ms: AtomicU64,
}

/// Maximum ages of the supervised inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub ppm_ms: u64,
    pub orientation_ms: u64,
    pub loop_ms: u64,
}

/// Handle to a running watchdog thread.
#[derive(Debug)]
pub struct Watchdog {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A supervised input that went stale, with its age in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum StaleInput {
    #[error("no RC frame for {0} ms")]
    Ppm(u64),

    #[error("no orientation sample for {0} ms")]
    Orientation(u64),

    #[error("no control loop iteration for {0} ms")]
    ControlLoop(u64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Freshness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start supervising, treating every input as fresh at `now_ms`.
    pub fn start(&self, now_ms: u64) {
        self.last_ppm_ms.store(now_ms, Ordering::Release);
        self.last_orientation_ms.store(now_ms, Ordering::Release);
        self.last_loop_ms.store(now_ms, Ordering::Release);
        self.started.store(true, Ordering::Release);
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn mark_ppm(&self, now_ms: u64) {
        self.last_ppm_ms.store(now_ms, Ordering::Release);
    }

    pub fn mark_orientation(&self, now_ms: u64) {
        self.last_orientation_ms.store(now_ms, Ordering::Release);
    }

    pub fn mark_loop(&self, now_ms: u64) {
        self.last_loop_ms.store(now_ms, Ordering::Release);
    }

    /// Find the first stale input, if any.
    ///
    /// Nothing is stale before supervision starts. The control loop's own
    /// timestamp is only checked when `include_loop` is set, since inside a
    /// tick the loop is by definition running.
    pub fn check(
        &self,
        now_ms: u64,
        timeouts: &Timeouts,
        include_loop: bool
    ) -> Option<StaleInput> {
        if !self.is_started() {
            return None;
        }

        let age = |ts: &AtomicU64| now_ms.saturating_sub(ts.load(Ordering::Acquire));

        let ppm_age = age(&self.last_ppm_ms);
        if ppm_age > timeouts.ppm_ms {
            return Some(StaleInput::Ppm(ppm_age));
        }

        let orientation_age = age(&self.last_orientation_ms);
        if orientation_age > timeouts.orientation_ms {
            return Some(StaleInput::Orientation(orientation_age));
        }

        let loop_age = age(&self.last_loop_ms);
        if include_loop && loop_age > timeouts.loop_ms {
            return Some(StaleInput::ControlLoop(loop_age));
        }

        None
    }
}

impl Watchdog {
    /// Spawn the watchdog thread.
    ///
    /// Every `period` the thread checks all inputs, including the control
    /// loop. On the first stale input it calls `on_trip` and exits.
    pub fn spawn<F>(
        freshness: Arc<Freshness>,
        timeouts: Timeouts,
        clock: MonoClock,
        period: Duration,
        on_trip: F
    ) -> std::io::Result<Self>
    where
        F: FnOnce(StaleInput) + Send + 'static
    {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();

        let handle = thread::Builder::new()
            .name("watchdog".into())
            .spawn(move || {
                while !thread_stop.load(Ordering::Relaxed) {
                    thread::sleep(period);

                    if let Some(stale) = freshness.check(
                        clock.now_ms(), &timeouts, true
                    ) {
                        error!("Watchdog tripped: {}", stale);
                        on_trip(stale);
                        return;
                    }
                }

                debug!("Watchdog stopped");
            })?;

        Ok(Self { stop, handle })
    }

    /// Stop the watchdog thread and wait for it to exit.
    pub fn stop(self) {
        self.stop.store(true, Ordering::Relaxed);
        self.handle.join().ok();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::mpsc::channel;

    fn timeouts() -> Timeouts {
        Timeouts {
            ppm_ms: 1000,
            orientation_ms: 25,
            loop_ms: 25,
        }
    }

    #[test]
    fn test_not_started_never_stale() {
        let f = Freshness::new();
        assert_eq!(f.check(1_000_000, &timeouts(), true), None);
    }

    #[test]
    fn test_stale_inputs() {
        let f = Freshness::new();
        f.start(100);

        assert_eq!(f.check(125, &timeouts(), true), None);
        assert_eq!(f.check(126, &timeouts(), true), Some(StaleInput::Orientation(26)));

        f.mark_orientation(140);
        f.mark_loop(150);
        assert_eq!(f.check(150, &timeouts(), true), None);
        assert_eq!(f.check(176, &timeouts(), false), Some(StaleInput::Orientation(36)));

        f.mark_orientation(1200);
        f.mark_loop(1200);
        assert_eq!(f.check(1200, &timeouts(), true), Some(StaleInput::Ppm(1100)));
    }

    #[test]
    fn test_loop_only_checked_when_asked() {
        let f = Freshness::new();
        f.start(0);
        f.mark_ppm(100);
        f.mark_orientation(100);

        assert_eq!(f.check(100, &timeouts(), false), None);
        assert_eq!(f.check(100, &timeouts(), true), Some(StaleInput::ControlLoop(100)));
    }

    #[test]
    fn test_watchdog_thread_trips() {
        let clock = MonoClock::new();
        let f = Arc::new(Freshness::new());
        f.start(clock.now_ms());

        let (tx, rx) = channel();
        let _wd = Watchdog::spawn(
            f.clone(),
            timeouts(),
            clock,
            Duration::from_millis(5),
            move |stale| tx.send(stale).unwrap()
        ).unwrap();

        // Nothing keeps the inputs fresh and the orientation timeout is the
        // first to expire
        let stale = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(stale, StaleInput::Orientation(_)));
    }

    #[test]
    fn test_watchdog_stop() {
        let clock = MonoClock::new();
        let f = Arc::new(Freshness::new());

        let wd = Watchdog::spawn(
            f,
            timeouts(),
            clock,
            Duration::from_millis(1),
            |_| panic!("should not trip before supervision starts")
        ).unwrap();

        thread::sleep(Duration::from_millis(10));
        wd.stop();
    }
}
