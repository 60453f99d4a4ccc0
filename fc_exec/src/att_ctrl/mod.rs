//! # Attitude control module
//!
//! Three PID controllers converting the error between desired and measured
//! attitude into desired body rates, which feed the rate controller. Yaw is
//! only controlled here when heading hold is enabled, otherwise the yaw rate
//! is demanded directly.

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

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur when setting up AttCtrl.
#[derive(Debug, thiserror::Error)]
pub enum AttCtrlError {
    #[error("Could not load the AttCtrl parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Invalid AttCtrl rate limits: [{0}, {1}]")]
    InvalidLimits(i32, i32),

    #[error("AttCtrl dt must be positive, got {0}")]
    InvalidDt(f64),
}
