//! # Control pipeline
//!
//! The cascade run on every armed control tick: attitude control produces
//! desired rates, rate control turns rate errors into rotation axis outputs,
//! and the mixer turns those into motor demands. In rate mode the attitude
//! stage is skipped.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use crate::{
    ahrs::Attitude,
    att_ctrl::AttCtrl,
    mixer::{MixOutput, Mixer},
    pid::AxisTerms,
    rate_ctrl::{RateCtrl, Rates, RotationAxisOutputs},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The attitude controller, rate controller and mixer, run in sequence.
#[derive(Debug, Clone, Default)]
pub struct ControlPipeline {
    pub att_ctrl: AttCtrl,
    pub rate_ctrl: RateCtrl,
    pub mixer: Mixer,
}

/// Everything produced by one pipeline tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineOutput {
    /// Motor demands and clamp flags.
    pub mix: MixOutput,

    /// Rates fed to the rate controller.
    pub desired_rates: Rates,

    /// Attitude fed to the attitude controller, in attitude mode only.
    pub desired_attitude: Option<Attitude>,

    pub axis_outputs: RotationAxisOutputs,

    /// Attitude controller terms, zero in rate mode.
    pub att_terms: AxisTerms,

    pub rate_terms: AxisTerms,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How the pilot's sticks are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlightMode {
    /// Sticks demand body rates.
    Rate,

    /// Roll and pitch sticks demand angles.
    Attitude,
}

/// The pilot's demand for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Setpoint {
    /// Desired body rates.
    Rate(Rates),

    /// Desired attitude. `yaw_rate_dps` is used as the yaw rate demand when
    /// the attitude controller does not hold heading.
    Attitude {
        attitude: Attitude,
        yaw_rate_dps: i32,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ControlPipeline {
    pub fn new(att_ctrl: AttCtrl, rate_ctrl: RateCtrl, mixer: Mixer) -> Self {
        Self {
            att_ctrl,
            rate_ctrl,
            mixer,
        }
    }

    /// Run one tick of the cascade.
    pub fn tick(
        &mut self,
        throttle_us: u32,
        setpoint: &Setpoint,
        actual_attitude: &Attitude,
        actual_rates: &Rates
    ) -> PipelineOutput {
        let (desired_rates, desired_attitude, att_terms) = match *setpoint {
            Setpoint::Rate(rates) => (rates, None, AxisTerms::default()),
            Setpoint::Attitude { attitude, yaw_rate_dps } => {
                let (mut rates, terms) = self.att_ctrl.control(
                    actual_attitude, &attitude);

                if !self.att_ctrl.controls_yaw() {
                    rates.yaw = self.att_ctrl.params().rate_limits
                        .clamp(yaw_rate_dps);
                }

                (rates, Some(attitude), terms)
            }
        };

        let (axis_outputs, rate_terms) = self.rate_ctrl.control(
            actual_rates, &desired_rates);

        let mix = self.mixer.mix(throttle_us, &axis_outputs);

        trace!("Pipeline motor demands: {:?}", mix.dems.pulse_us);

        PipelineOutput {
            mix,
            desired_rates,
            desired_attitude,
            axis_outputs,
            att_terms,
            rate_terms,
        }
    }

    /// Clear the memory of both controllers.
    pub fn reset(&mut self) {
        self.att_ctrl.reset();
        self.rate_ctrl.reset();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{att_ctrl, mixer, rate_ctrl};
    use fc_if::eqpt::motor::MotorDems;

    fn pipeline() -> ControlPipeline {
        ControlPipeline::new(
            AttCtrl::new(att_ctrl::Params::default()).unwrap(),
            RateCtrl::new(rate_ctrl::Params::default()).unwrap(),
            Mixer::new(mixer::Params::default()).unwrap(),
        )
    }

    #[test]
    fn test_matched_rates_hold_throttle() {
        let mut p = pipeline();
        let rates = Rates { roll: 35, pitch: -80, yaw: 12 };

        for _ in 0..100 {
            let out = p.tick(
                1400,
                &Setpoint::Rate(rates),
                &Attitude::default(),
                &rates
            );
            assert_eq!(out.mix.dems, MotorDems::uniform(1400));
            assert_eq!(out.axis_outputs, RotationAxisOutputs::default());
        }
    }

    #[test]
    fn test_matched_attitude_hold_throttle() {
        let mut p = pipeline();
        let att = Attitude { roll: 500, pitch: -250, yaw: 9000 };

        for _ in 0..100 {
            let out = p.tick(
                1600,
                &Setpoint::Attitude { attitude: att, yaw_rate_dps: 0 },
                &att,
                &Rates::default()
            );
            assert_eq!(out.mix.dems, MotorDems::uniform(1600));
            assert_eq!(out.desired_attitude, Some(att));
        }
    }

    #[test]
    fn test_attitude_error_drives_motors() {
        let mut p = pipeline();

        let out = p.tick(
            1500,
            &Setpoint::Attitude {
                attitude: Attitude { roll: 1000, pitch: 0, yaw: 0 },
                yaw_rate_dps: 30,
            },
            &Attitude::default(),
            &Rates::default()
        );

        assert!(out.desired_rates.roll > 0);
        assert_eq!(out.desired_rates.yaw, 30);
        assert!(out.axis_outputs.roll > 0);
        assert!(out.mix.dems.pulse_us[0] > out.mix.dems.pulse_us[1]);
    }

    #[test]
    fn test_reset_clears_both_stages() {
        let mut p = pipeline();
        let setpoint = Setpoint::Rate(Rates { roll: 100, pitch: 0, yaw: 0 });

        for _ in 0..10 {
            p.tick(1500, &setpoint, &Attitude::default(), &Rates::default());
        }
        p.reset();

        let out = p.tick(
            1500,
            &Setpoint::Rate(Rates::default()),
            &Attitude::default(),
            &Rates::default()
        );
        assert_eq!(out.mix.dems, MotorDems::uniform(1500));
    }
}
