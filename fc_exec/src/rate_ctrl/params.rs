//! Parameters structure for RateCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::{RateCtrlError, ROTATION_AXIS_OUTPUT_MAX};
use crate::pid::{Gains, Limits};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for rate control.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Gains shared by all three axes.
    pub gains: Gains,

    /// Limits of the rotation axis outputs.
    pub output_limits: Limits,

    /// Integration period of the controllers, which must equal the control
    /// loop period.
    ///
    /// Units: milliseconds
    pub dt_ms: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    pub fn validate(&self) -> Result<(), RateCtrlError> {
        if !self.output_limits.is_valid() {
            return Err(RateCtrlError::InvalidLimits(
                self.output_limits.min, self.output_limits.max
            ));
        }
        if !(self.dt_ms > 0.0) {
            return Err(RateCtrlError::InvalidDt(self.dt_ms));
        }

        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            gains: Gains::new(10.0, 0.01, 1.0),
            output_limits: Limits::symmetric(ROTATION_AXIS_OUTPUT_MAX),
            dt_ms: 5.0,
        }
    }
}
