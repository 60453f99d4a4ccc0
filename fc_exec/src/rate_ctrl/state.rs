//! Implementations for the RateCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;

// Internal
use super::{Params, RateCtrlError, Rates, RotationAxisOutputs};
use crate::pid::{AxisTerms, ControllerState};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Rate controller state
#[derive(Debug, Clone)]
pub struct RateCtrl {
    params: Params,

    roll: ControllerState,
    pitch: ControllerState,
    yaw: ControllerState,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RateCtrl {
    /// Create a new rate controller, validating the parameters.
    pub fn new(params: Params) -> Result<Self, RateCtrlError> {
        params.validate()?;

        Ok(Self::with_params(params))
    }

    fn with_params(params: Params) -> Self {
        let axis = ControllerState::new(params.dt_ms);

        Self {
            params,
            roll: axis,
            pitch: axis,
            yaw: axis,
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Run the three axis controllers on `desired - actual`.
    pub fn control(
        &mut self,
        actual: &Rates,
        desired: &Rates
    ) -> (RotationAxisOutputs, AxisTerms) {
        let gains = &self.params.gains;
        let limits = &self.params.output_limits;

        let (roll, roll_terms) = self.roll.update(
            desired.roll - actual.roll, gains, limits);
        let (pitch, pitch_terms) = self.pitch.update(
            desired.pitch - actual.pitch, gains, limits);
        let (yaw, yaw_terms) = self.yaw.update(
            desired.yaw - actual.yaw, gains, limits);

        let outputs = RotationAxisOutputs { roll, pitch, yaw };

        trace!("RateCtrl output: {:?}", outputs);

        (
            outputs,
            AxisTerms {
                roll: roll_terms,
                pitch: pitch_terms,
                yaw: yaw_terms,
            }
        )
    }

    /// Clear the memory of all three axes.
    pub fn reset(&mut self) {
        self.roll.reset();
        self.pitch.reset();
        self.yaw.reset();
    }
}

impl Default for RateCtrl {
    fn default() -> Self {
        Self::with_params(Params::default())
    }
}
