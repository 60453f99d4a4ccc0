//! # Flight supervisor module
//!
//! The periodic control loop driver. Every tick the supervisor takes the
//! most recent RC frame and orientation sample, decides whether the vehicle
//! is armed, runs the control pipeline when it should be flying and commands
//! idle otherwise. It also enforces the freshness of its inputs: a stale RC
//! link or orientation estimate sends the vehicle into fail-safe, which is
//! terminal until the system is reset.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod arming;
mod params;
mod state;
mod tm;
mod watchdog;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

pub use arming::*;
pub use params::*;
pub use state::*;
pub use tm::*;
pub use watchdog::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// States of the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SupervisorState {
    /// Motors held at idle until the ESCs have started and the throttle
    /// stick has been seen low.
    WaitingForLowThrottle,

    Armed,

    Disarmed,

    /// An input went stale. Motors are stopped and remain so until reset.
    FailSafe,
}

/// Possible errors that can occur in the supervisor.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("Could not load the Supervisor parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Invalid Supervisor parameters: {0}")]
    InvalidParams(String),

    #[error("Could not create the telemetry archive: {0}")]
    ArchiveError(#[from] util::archive::ArchiveError),
}
