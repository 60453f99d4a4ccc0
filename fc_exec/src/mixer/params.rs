//! Parameters structure for the Mixer

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::MixerError;
use fc_if::eqpt::motor::{MotorId, MOTOR_IDLE_PULSE_US, MOTOR_MAX_PULSE_US};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the motor mixer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Lowest pulse width commanded to a motor.
    ///
    /// Units: microseconds
    pub min_pulse_us: u32,

    /// Highest pulse width commanded to a motor.
    ///
    /// Units: microseconds
    pub max_pulse_us: u32,

    pub front_left: MixSigns,
    pub front_right: MixSigns,
    pub back_left: MixSigns,
    pub back_right: MixSigns,
}

/// The sign with which each rotation axis output is added to one motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MixSigns {
    pub roll: i8,
    pub pitch: i8,
    pub yaw: i8,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Get the signs of a motor.
    pub fn signs(&self, motor: MotorId) -> &MixSigns {
        match motor {
            MotorId::FrontLeft => &self.front_left,
            MotorId::FrontRight => &self.front_right,
            MotorId::BackLeft => &self.back_left,
            MotorId::BackRight => &self.back_right,
        }
    }

    pub fn validate(&self) -> Result<(), MixerError> {
        if self.min_pulse_us >= self.max_pulse_us {
            return Err(MixerError::InvalidPulseRange(
                self.min_pulse_us, self.max_pulse_us
            ));
        }

        for &motor in MotorId::ALL.iter() {
            let s = self.signs(motor);
            for &(axis, sign) in [
                ("roll", s.roll), ("pitch", s.pitch), ("yaw", s.yaw)
            ].iter() {
                if !(-1..=1).contains(&sign) {
                    return Err(MixerError::InvalidSign { motor, axis, sign });
                }
            }
        }

        Ok(())
    }
}

impl MixSigns {
    pub const fn new(roll: i8, pitch: i8, yaw: i8) -> Self {
        Self { roll, pitch, yaw }
    }
}

impl Default for Params {
    /// Quad-X with the front right and back left motors spinning in the
    /// direction that yaws the vehicle positively.
    fn default() -> Self {
        Self {
            min_pulse_us: MOTOR_IDLE_PULSE_US,
            max_pulse_us: MOTOR_MAX_PULSE_US,
            front_left: MixSigns::new(1, 1, -1),
            front_right: MixSigns::new(-1, 1, 1),
            back_left: MixSigns::new(1, -1, 1),
            back_right: MixSigns::new(-1, -1, -1),
        }
    }
}
