//! # Flight Controller Executable Parameters
//!
//! Options of the host executable which are not owned by any module.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::sim::SimParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FcExecParams {
    /// Period of the watchdog thread's checks.
    ///
    /// Units: milliseconds
    pub watchdog_period_ms: u64,

    /// Simulated equipment.
    pub sim: SimParams,
}

impl Default for FcExecParams {
    fn default() -> Self {
        Self {
            watchdog_period_ms: 5,
            sim: SimParams::default(),
        }
    }
}
