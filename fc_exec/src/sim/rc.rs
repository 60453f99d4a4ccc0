//! Simulated RC transmitter

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::{Duration, Instant};

use super::{ScriptStep, SimRcParams};
use fc_if::eqpt::rc::{CaptureSource, PpmFrame, RC_CHANNEL_COUNT};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Produces the rising edges of a PPM stream following a stick script.
///
/// Edge times are microseconds of a 32 bit counter started when the
/// transmitter was created, so they wrap after a little over an hour.
pub struct SimPpmTx {
    params: SimRcParams,

    /// Edges of the current frame still to be delivered.
    ///
    /// Units: microseconds
    pending: VecDeque<u64>,

    /// Start of the next frame.
    ///
    /// Units: microseconds
    next_frame_us: u64,

    /// Time zero, when pacing in real time.
    epoch: Option<Instant>,

    stop: Arc<AtomicBool>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimPpmTx {
    pub fn new(params: SimRcParams, stop: Arc<AtomicBool>) -> Self {
        Self {
            epoch: if params.realtime { Some(Instant::now()) } else { None },
            params,
            pending: VecDeque::new(),
            next_frame_us: 0,
            stop,
        }
    }

    /// The channel values the script holds at the given time.
    pub fn signals_at(&self, time_ms: u64) -> [u16; RC_CHANNEL_COUNT] {
        script_signals(&self.params.script, time_ms)
    }

    fn queue_frame(&mut self) {
        loop {
            let start_us = self.next_frame_us;
            self.next_frame_us += self.params.frame_period_us;

            let start_ms = start_us / 1000;
            if let Some(d) = self.params.dropout {
                if d.contains(start_ms) {
                    continue;
                }
            }

            let signals = self.signals_at(start_ms);

            self.pending.push_back(start_us);
            let mut t = start_us;
            for &s in signals.iter() {
                t += s as u64;
                self.pending.push_back(t);
            }

            return;
        }
    }
}

impl CaptureSource for SimPpmTx {
    fn wait_edge(&mut self) -> Option<u32> {
        if self.stop.load(Ordering::Relaxed) {
            return None;
        }

        if self.pending.is_empty() {
            self.queue_frame();
        }

        let time_us = self.pending.pop_front()?;

        if let Some(epoch) = self.epoch {
            let due = epoch + Duration::from_micros(time_us);
            let now = Instant::now();
            if due > now {
                thread::sleep(due - now);
            }
        }

        // Truncate to the width of the capture counter
        Some(time_us as u32)
    }
}

/// Look up the script step active at `time_ms`.
fn script_signals(script: &[ScriptStep], time_ms: u64) -> [u16; RC_CHANNEL_COUNT] {
    let mut step_end_ms = 0;

    for step in script {
        step_end_ms += step.duration_ms;
        if time_ms < step_end_ms {
            return step.signals_us;
        }
    }

    script
        .last()
        .map(|s| s.signals_us)
        .unwrap_or(PpmFrame::default().signals_us)
}
