//! Implementations for the AttCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;

// Internal
use super::{AttCtrlError, Params};
use crate::{
    ahrs::{wrap_cdeg, Attitude},
    pid::{AxisTerms, ControllerState, PidTerms},
    rate_ctrl::Rates,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Attitude controller state
#[derive(Debug, Clone)]
pub struct AttCtrl {
    params: Params,

    roll: ControllerState,
    pitch: ControllerState,
    yaw: ControllerState,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AttCtrl {
    /// Create a new attitude controller, validating the parameters.
    pub fn new(params: Params) -> Result<Self, AttCtrlError> {
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

    /// True if the yaw axis is controlled by this stage.
    pub fn controls_yaw(&self) -> bool {
        self.params.control_yaw
    }

    /// Calculate the desired rates for the given attitudes.
    ///
    /// Attitudes are in hundredths of a degree. When yaw is not controlled
    /// the yaw rate of the output is zero and the caller supplies its own.
    pub fn control(
        &mut self,
        actual: &Attitude,
        desired: &Attitude
    ) -> (Rates, AxisTerms) {
        let gains = &self.params.gains;
        let limits = &self.params.rate_limits;

        let (roll, roll_terms) = self.roll.update(
            desired.roll - actual.roll, gains, limits);
        let (pitch, pitch_terms) = self.pitch.update(
            desired.pitch - actual.pitch, gains, limits);

        let (yaw, yaw_terms) = if self.params.control_yaw {
            // Take the short way round to the target heading
            self.yaw.update(
                wrap_cdeg(desired.yaw - actual.yaw), gains, limits)
        } else {
            (0, PidTerms::default())
        };

        let rates = Rates { roll, pitch, yaw };

        trace!("AttCtrl output: {:?}", rates);

        (
            rates,
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

impl Default for AttCtrl {
    fn default() -> Self {
        Self::with_params(Params::default())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pid::Gains;

    fn params(control_yaw: bool) -> Params {
        Params {
            gains: Gains::new(0.05, 0.0, 0.0),
            control_yaw,
            ..Params::default()
        }
    }

    #[test]
    fn test_level_gives_zero_rates() {
        let mut ctrl = AttCtrl::new(Params::default()).unwrap();
        let att = Attitude { roll: 120, pitch: -300, yaw: 9000 };

        let (rates, _) = ctrl.control(&att, &att);
        assert_eq!(rates, Rates::default());
    }

    #[test]
    fn test_tilt_error_gives_rate() {
        let mut ctrl = AttCtrl::new(params(false)).unwrap();

        let (rates, _) = ctrl.control(
            &Attitude::default(),
            &Attitude { roll: 1000, pitch: -2000, yaw: 4500 }
        );

        assert_eq!(rates, Rates { roll: 50, pitch: -100, yaw: 0 });
    }

    #[test]
    fn test_rates_limited() {
        let mut ctrl = AttCtrl::new(Params::default()).unwrap();

        let (rates, _) = ctrl.control(
            &Attitude::default(),
            &Attitude { roll: 3000, pitch: -3000, yaw: 0 }
        );

        assert_eq!(rates.roll, 500);
        assert_eq!(rates.pitch, -500);
    }

    #[test]
    fn test_heading_hold_wraps() {
        let mut ctrl = AttCtrl::new(params(true)).unwrap();

        // 170 deg to -170 deg is a 20 deg turn in the positive direction
        let (rates, _) = ctrl.control(
            &Attitude { roll: 0, pitch: 0, yaw: 17000 },
            &Attitude { roll: 0, pitch: 0, yaw: -17000 }
        );

        assert_eq!(rates.yaw, 100);
    }
}
