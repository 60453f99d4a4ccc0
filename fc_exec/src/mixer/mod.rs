//! # Motor mixer module
//!
//! Combines the throttle with the rotation axis outputs into one pulse width
//! per motor of a quad-X frame. Which motors rise together for a positive
//! roll, pitch or yaw output is set by a sign table in the parameters, so the
//! mixer can be matched to the physical motor layout.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;

use fc_if::eqpt::motor::MotorId;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur when setting up the Mixer.
#[derive(Debug, thiserror::Error)]
pub enum MixerError {
    #[error("Could not load the Mixer parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Invalid pulse range: [{0}, {1}] us")]
    InvalidPulseRange(u32, u32),

    #[error("Mix sign for {motor:?} {axis} axis must be -1, 0 or 1, got {sign}")]
    InvalidSign {
        motor: MotorId,
        axis: &'static str,
        sign: i8,
    },
}
