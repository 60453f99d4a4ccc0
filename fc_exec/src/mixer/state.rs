//! Implementations for the Mixer

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::{MixerError, Params};
use crate::rate_ctrl::RotationAxisOutputs;
use fc_if::eqpt::motor::{MotorDems, MotorId, NUM_MOTORS};
use util::maths::sat_limit;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Quad-X motor mixer.
#[derive(Debug, Clone)]
pub struct Mixer {
    params: Params,
}

/// Result of one mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MixOutput {
    /// Pulse widths to command.
    pub dems: MotorDems,

    /// Which motors had to be clamped into the pulse range.
    pub clamped: [bool; NUM_MOTORS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Mixer {
    /// Create a new mixer, validating the parameters.
    pub fn new(params: Params) -> Result<Self, MixerError> {
        params.validate()?;

        Ok(Self { params })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Mix the throttle and rotation axis outputs into motor demands.
    ///
    /// # Inputs
    /// - `throttle_us`: collective pulse width in microseconds
    /// - `outputs`: rotation axis outputs from the rate controller
    pub fn mix(
        &self,
        throttle_us: u32,
        outputs: &RotationAxisOutputs
    ) -> MixOutput {
        let mut dems = MotorDems::idle();
        let mut clamped = [false; NUM_MOTORS];

        let min = self.params.min_pulse_us as i64;
        let max = self.params.max_pulse_us as i64;

        for &motor in MotorId::ALL.iter() {
            let s = self.params.signs(motor);

            let raw = throttle_us as i64
                + s.roll as i64 * outputs.roll as i64
                + s.pitch as i64 * outputs.pitch as i64
                + s.yaw as i64 * outputs.yaw as i64;

            let (pulse, sat) = sat_limit(raw, min, max);

            dems.set(motor, pulse as u32);
            clamped[motor.index()] = sat != 0;
        }

        MixOutput { dems, clamped }
    }
}

impl Default for Mixer {
    /// The quad-X mixer with the default pulse range.
    fn default() -> Self {
        Self { params: Params::default() }
    }
}

impl MixOutput {
    /// True if any motor was clamped.
    pub fn any_clamped(&self) -> bool {
        self.clamped.iter().any(|&c| c)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn mixer() -> Mixer {
        Mixer::new(Params::default()).unwrap()
    }

    fn outputs(roll: i32, pitch: i32, yaw: i32) -> RotationAxisOutputs {
        RotationAxisOutputs { roll, pitch, yaw }
    }

    #[test]
    fn test_throttle_only() {
        let out = mixer().mix(1500, &outputs(0, 0, 0));

        assert_eq!(out.dems, MotorDems::uniform(1500));
        assert!(!out.any_clamped());
    }

    #[test]
    fn test_roll_is_symmetric() {
        let m = mixer();

        let pos = m.mix(1500, &outputs(100, 0, 0)).dems;
        let neg = m.mix(1500, &outputs(-100, 0, 0)).dems;

        // Positive roll raises exactly one side
        let raised: Vec<MotorId> = MotorId::ALL.iter()
            .copied()
            .filter(|&id| pos.get(id) > 1500)
            .collect();
        let lowered: Vec<MotorId> = MotorId::ALL.iter()
            .copied()
            .filter(|&id| pos.get(id) < 1500)
            .collect();
        assert_eq!(raised, vec![MotorId::FrontLeft, MotorId::BackLeft]);
        assert_eq!(lowered, vec![MotorId::FrontRight, MotorId::BackRight]);

        // And negative roll is the mirror image
        for &id in MotorId::ALL.iter() {
            assert_eq!(pos.get(id) as i32 - 1500, 1500 - neg.get(id) as i32);
        }
    }

    #[test]
    fn test_pitch_and_yaw() {
        let m = mixer();

        let pitch = m.mix(1500, &outputs(0, 50, 0)).dems;
        assert_eq!(pitch.pulse_us, [1550, 1550, 1450, 1450]);

        // Yaw is carried by the diagonal pairs
        let yaw = m.mix(1500, &outputs(0, 0, 50)).dems;
        assert_eq!(yaw.pulse_us, [1450, 1550, 1550, 1450]);
    }

    #[test]
    fn test_clamped_and_flagged() {
        let out = mixer().mix(1900, &outputs(300, 0, 0));

        assert_eq!(out.dems.pulse_us, [2000, 1600, 2000, 1600]);
        assert_eq!(out.clamped, [true, false, true, false]);

        let out = mixer().mix(1000, &outputs(0, -1024, 0));
        assert_eq!(out.dems.pulse_us, [1000, 1000, 2000, 2000]);
        assert_eq!(out.clamped, [true; 4]);
    }

    #[test]
    fn test_sign_table_from_params() {
        let params: Params = util::params::load_str(
            "[front_left]\nroll = -1\npitch = 1\nyaw = 1\n"
        ).unwrap();
        let m = Mixer::new(params).unwrap();

        let out = m.mix(1500, &outputs(10, 0, 0)).dems;
        assert_eq!(out.get(MotorId::FrontLeft), 1490);
    }

    #[test]
    fn test_invalid_sign_rejected() {
        let mut params = Params::default();
        params.back_right.yaw = 2;

        assert!(matches!(
            Mixer::new(params),
            Err(MixerError::InvalidSign { motor: MotorId::BackRight, .. })
        ));
    }
}
