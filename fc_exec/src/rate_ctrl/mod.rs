//! # Rate control module
//!
//! Three PID controllers, one per rotation axis, sharing a single set of
//! gains and limits. Converts the error between desired and measured body
//! rates into the normalised rotation axis outputs fed to the mixer.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Largest rotation axis output magnitude.
pub const ROTATION_AXIS_OUTPUT_MAX: i32 = 1024;

/// Largest body rate that can be demanded.
///
/// Units: degrees/second
pub const RATES_MAX_DPS: i32 = 500;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Body rates about each axis.
///
/// Units: degrees/second
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize
)]
pub struct Rates {
    pub roll: i32,
    pub pitch: i32,
    pub yaw: i32,
}

/// Mixer input for each rotation axis, within the rate controller limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RotationAxisOutputs {
    pub roll: i32,
    pub pitch: i32,
    pub yaw: i32,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur when setting up RateCtrl.
#[derive(Debug, thiserror::Error)]
pub enum RateCtrlError {
    #[error("Could not load the RateCtrl parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Invalid RateCtrl output limits: [{0}, {1}]")]
    InvalidLimits(i32, i32),

    #[error("RateCtrl dt must be positive, got {0}")]
    InvalidDt(f64),
}
