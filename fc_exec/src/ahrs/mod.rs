//! # Attitude and heading reference system
//!
//! Fuses gyroscope, accelerometer and magnetometer samples into an orientation quaternion using
//! Madgwick's gradient descent filter, and provides the cyclic orientation estimator which turns
//! raw IMU reads into attitude and body rate samples for the flight supervisor.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod attitude;
mod madgwick;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use attitude::*;
pub use madgwick::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur in the AHRS.
#[derive(Debug, thiserror::Error)]
pub enum AhrsError {
    #[error("Could not load the AHRS parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Invalid AHRS parameters: {0}")]
    InvalidParams(String),
}
