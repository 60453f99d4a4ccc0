//! Parameters structure for AttCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::AttCtrlError;
use crate::{
    pid::{Gains, Limits},
    rate_ctrl::RATES_MAX_DPS
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for attitude control.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Gains shared by all three axes.
    pub gains: Gains,

    /// Limits of the desired rates produced.
    ///
    /// Units: degrees/second
    pub rate_limits: Limits,

    /// Integration period of the controllers, which must equal the control
    /// loop period.
    ///
    /// Units: milliseconds
    pub dt_ms: f64,

    /// If true the yaw axis holds a heading, otherwise the yaw rate demand
    /// bypasses this controller.
    pub control_yaw: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    pub fn validate(&self) -> Result<(), AttCtrlError> {
        if !self.rate_limits.is_valid() {
            return Err(AttCtrlError::InvalidLimits(
                self.rate_limits.min, self.rate_limits.max
            ));
        }
        if !(self.dt_ms > 0.0) {
            return Err(AttCtrlError::InvalidDt(self.dt_ms));
        }

        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            gains: Gains::new(2.0, 0.0, 0.0),
            rate_limits: Limits::symmetric(RATES_MAX_DPS),
            dt_ms: 5.0,
            control_yaw: false,
        }
    }
}
