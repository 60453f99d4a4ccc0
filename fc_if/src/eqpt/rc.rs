//! # RC Receiver Equipment Interface
//!
//! The receiver outputs a PPM signal: a silence of at least a few milliseconds followed by one
//! pulse per channel. A hardware timer captures the time of every rising edge in microseconds and
//! hands it to the frame decoder.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of channels in one PPM frame.
pub const RC_CHANNEL_COUNT: usize = 8;

/// Nominal minimum channel pulse width.
///
/// Units: microseconds
pub const RC_PULSE_MIN_US: u16 = 1000;

/// Nominal maximum channel pulse width.
///
/// Units: microseconds
pub const RC_PULSE_MAX_US: u16 = 2000;

/// Nominal centre (stick neutral) pulse width.
///
/// Units: microseconds
pub const RC_PULSE_CENTRE_US: u16 = 1500;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One decoded RC frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PpmFrame {
    /// Pulse width of each channel, in channel order.
    ///
    /// Units: microseconds
    pub signals_us: [u16; RC_CHANNEL_COUNT],
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of rising edge capture timestamps.
pub trait CaptureSource {
    /// Block until the next edge is captured and return its timestamp.
    ///
    /// Timestamps are in microseconds from a free running 32 bit counter, so they wrap. Returns
    /// `None` once the source has shut down.
    fn wait_edge(&mut self) -> Option<u32>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PpmFrame {
    /// A frame with every channel at the same value.
    pub fn uniform(value_us: u16) -> Self {
        Self {
            signals_us: [value_us; RC_CHANNEL_COUNT],
        }
    }

    /// Get a channel's value, or `None` if the index is out of range.
    pub fn channel(&self, index: usize) -> Option<u16> {
        self.signals_us.get(index).copied()
    }
}

impl Default for PpmFrame {
    fn default() -> Self {
        Self::uniform(RC_PULSE_MIN_US)
    }
}
