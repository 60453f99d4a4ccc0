//! # PPM frame decoder
//!
//! Decodes the stream of rising edge timestamps from the RC receiver into
//! complete frames. A frame is a silence of at least `MIN_FRAME_SPACE_US`
//! followed by one pulse per channel, so any pulse longer than a channel can
//! be only the next silence and the decoder resynchronises on it.
//!
//! The decoder runs in the capture handler and never blocks. Completed
//! frames are published to a [`LatestSlot`] where the flight supervisor
//! picks up the most recent one.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;
use std::sync::Arc;

// Internal
use crate::slot::LatestSlot;
use fc_if::eqpt::rc::{CaptureSource, PpmFrame, RC_CHANNEL_COUNT};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Shortest gap which is treated as the silence between two frames.
///
/// Units: microseconds
pub const MIN_FRAME_SPACE_US: u32 = 4000;

/// Longest pulse accepted as a channel value.
///
/// Units: microseconds
pub const MAX_CHANNEL_PULSE_US: u32 = 2100;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Edge to frame state machine.
#[derive(Debug, Clone)]
pub struct PpmDecoder {
    state: DecoderState,

    /// Timestamp of the previous edge, `None` before the first.
    last_edge_us: Option<u32>,

    /// Channel values of the frame being received.
    signals_us: [u16; RC_CHANNEL_COUNT],

    /// Number of frames aborted because of an over long channel pulse.
    resyncs: u64,
}

/// Decoder feeding a latest value slot.
#[derive(Debug)]
pub struct RcReceiver {
    decoder: PpmDecoder,
    slot: Arc<LatestSlot<PpmFrame>>,
    stats: RcStats,
}

/// Counters of the receiver's activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RcStats {
    /// Complete frames decoded.
    pub frames: u64,

    /// Frames aborted by resynchronisation.
    pub resyncs: u64,

    /// Frames overwritten before the consumer took them.
    pub overwritten: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// States of the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Waiting for an inter-frame silence.
    AwaitingSync,

    /// The next pulse is the value of the given channel.
    ReceivingChannel(usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PpmDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::AwaitingSync,
            last_edge_us: None,
            signals_us: [0; RC_CHANNEL_COUNT],
            resyncs: 0,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn resyncs(&self) -> u64 {
        self.resyncs
    }

    /// Process one rising edge.
    ///
    /// `time_us` comes from a free running counter and may wrap. Returns the
    /// frame this edge completed, if any.
    pub fn on_edge(&mut self, time_us: u32) -> Option<PpmFrame> {
        let pulse_us = match self.last_edge_us.replace(time_us) {
            Some(prev) => time_us.wrapping_sub(prev),
            None => return None,
        };

        match self.state {
            DecoderState::AwaitingSync => {
                if pulse_us >= MIN_FRAME_SPACE_US {
                    self.state = DecoderState::ReceivingChannel(0);
                }
                None
            }
            DecoderState::ReceivingChannel(i) => {
                if pulse_us > MAX_CHANNEL_PULSE_US {
                    trace!(
                        "PPM pulse of {} us on channel {}, resyncing",
                        pulse_us, i
                    );
                    self.resyncs += 1;
                    self.state = DecoderState::AwaitingSync;
                    return None;
                }

                self.signals_us[i] = pulse_us as u16;

                if i + 1 == RC_CHANNEL_COUNT {
                    self.state = DecoderState::AwaitingSync;
                    Some(PpmFrame {
                        signals_us: self.signals_us,
                    })
                } else {
                    self.state = DecoderState::ReceivingChannel(i + 1);
                    None
                }
            }
        }
    }
}

impl Default for PpmDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RcReceiver {
    /// Create a receiver publishing to the given slot.
    pub fn new(slot: Arc<LatestSlot<PpmFrame>>) -> Self {
        Self {
            decoder: PpmDecoder::new(),
            slot,
            stats: RcStats::default(),
        }
    }

    /// Process one rising edge, publishing the frame it completes.
    pub fn on_edge(&mut self, time_us: u32) {
        if let Some(frame) = self.decoder.on_edge(time_us) {
            self.stats.frames += 1;
            if self.slot.publish(frame) {
                self.stats.overwritten += 1;
            }
        }
        self.stats.resyncs = self.decoder.resyncs();
    }

    /// Process edges until the capture source shuts down.
    pub fn run<C: CaptureSource + ?Sized>(&mut self, source: &mut C) -> RcStats {
        while let Some(time_us) = source.wait_edge() {
            self.on_edge(time_us);
        }

        debug!("RC capture source closed, stats: {:?}", self.stats);

        self.stats
    }

    pub fn stats(&self) -> RcStats {
        self.stats
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Feed a list of pulse lengths as edges, starting at `start_us`.
    /// Returns the frames produced and the final edge time.
    fn feed(
        decoder: &mut PpmDecoder,
        start_us: u32,
        pulses: &[u32]
    ) -> (Vec<PpmFrame>, u32) {
        let mut t = start_us;
        let mut frames = Vec::new();

        if let Some(f) = decoder.on_edge(t) {
            frames.push(f);
        }
        for p in pulses {
            t = t.wrapping_add(*p);
            if let Some(f) = decoder.on_edge(t) {
                frames.push(f);
            }
        }

        (frames, t)
    }

    fn frame_pulses(value: u32) -> Vec<u32> {
        let mut p = vec![6000];
        p.extend(std::iter::repeat(value).take(RC_CHANNEL_COUNT));
        p
    }

    #[test]
    fn test_decode_full_frame() {
        let mut d = PpmDecoder::new();

        let (frames, _) = feed(&mut d, 100, &frame_pulses(1500));

        assert_eq!(frames, vec![PpmFrame::uniform(1500)]);
        assert_eq!(d.state(), DecoderState::AwaitingSync);
    }

    #[test]
    fn test_short_gap_does_not_sync() {
        let mut d = PpmDecoder::new();

        // Gaps below the frame space keep the decoder waiting
        let (frames, _) = feed(&mut d, 0, &[1500; 20]);
        assert!(frames.is_empty());
        assert_eq!(d.state(), DecoderState::AwaitingSync);
    }

    #[test]
    fn test_long_pulse_forces_resync() {
        let mut d = PpmDecoder::new();

        // Sync, three channels, then a 5000 us pulse
        let (frames, t) = feed(&mut d, 0, &[6000, 1500, 1500, 1500, 5000]);
        assert!(frames.is_empty());
        assert_eq!(d.state(), DecoderState::AwaitingSync);
        assert_eq!(d.resyncs(), 1);

        // The rest of the broken frame is ignored
        let (frames, t) = feed(&mut d, t, &[1500; 4]);
        assert!(frames.is_empty());

        // A full frame is needed before anything publishes
        let (frames, _) = feed(&mut d, t, &frame_pulses(1200));
        assert_eq!(frames, vec![PpmFrame::uniform(1200)]);
    }

    #[test]
    fn test_channel_order_and_wrap() {
        let mut d = PpmDecoder::new();
        let values = [1000, 1100, 1200, 1300, 1400, 1500, 1600, 2000];

        let mut pulses = vec![4000];
        pulses.extend_from_slice(&values);

        // Start just before the counter wraps
        let (frames, _) = feed(&mut d, u32::MAX - 5000, &pulses);

        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0].signals_us,
            [1000, 1100, 1200, 1300, 1400, 1500, 1600, 2000]
        );
    }

    #[test]
    fn test_consecutive_frames() {
        let mut d = PpmDecoder::new();
        let mut pulses = frame_pulses(1500);
        pulses.extend(frame_pulses(1700));

        let (frames, _) = feed(&mut d, 0, &pulses);

        assert_eq!(
            frames,
            vec![PpmFrame::uniform(1500), PpmFrame::uniform(1700)]
        );
    }

    #[test]
    fn test_receiver_publishes_latest() {
        let slot = Arc::new(LatestSlot::new());
        let mut rx = RcReceiver::new(slot.clone());

        let mut t = 0u32;
        rx.on_edge(t);
        for v in &[1100u32, 1900] {
            for p in frame_pulses(*v) {
                t += p;
                rx.on_edge(t);
            }
        }

        assert_eq!(slot.try_take(), Some(PpmFrame::uniform(1900)));
        assert_eq!(
            rx.stats(),
            RcStats { frames: 2, resyncs: 0, overwritten: 1 }
        );
    }
}
