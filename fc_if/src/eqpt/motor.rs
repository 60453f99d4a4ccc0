//! # Motor Equipment Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of motors on the frame.
pub const NUM_MOTORS: usize = 4;

/// Pulse width which stops the motors. ESCs also expect this during their start up.
///
/// Units: microseconds
pub const MOTOR_IDLE_PULSE_US: u32 = 1000;

/// Maximum pulse width accepted by the ESCs.
///
/// Units: microseconds
pub const MOTOR_MAX_PULSE_US: u32 = 2000;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Pulse width demands for every motor, indexed by [`MotorId::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorDems {
    /// Units: microseconds
    pub pulse_us: [u32; NUM_MOTORS],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of the motors on a quad-X frame.
///
/// Diagonal motors (front left and back right, front right and back left) spin in the same
/// direction.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum MotorId {
    FrontLeft,
    FrontRight,
    BackLeft,
    BackRight,
}

/// Errors raised by a motor output.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum MotorError {
    #[error("Pulse width of {pulse_us} us for {motor:?} is outside the valid range, clamped to {clamped_us} us")]
    OutOfRange {
        motor: MotorId,
        pulse_us: u32,
        clamped_us: u32,
    },

    #[error("Output for {0:?} is unavailable")]
    Unavailable(MotorId),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Contract for the motor output hardware.
pub trait MotorSink {
    /// Set the pulse width of one motor.
    ///
    /// Out of range values must still be applied, clamped into range, with
    /// [`MotorError::OutOfRange`] returned to indicate the clamp.
    fn set_motor(&mut self, motor: MotorId, pulse_us: u32) -> Result<(), MotorError>;

    /// Apply a full set of demands, returning every error raised.
    fn apply(&mut self, dems: &MotorDems) -> Vec<MotorError> {
        MotorId::ALL
            .iter()
            .filter_map(|&m| self.set_motor(m, dems.get(m)).err())
            .collect()
    }

    /// Command every motor to idle.
    fn stop_all(&mut self) -> Vec<MotorError> {
        self.apply(&MotorDems::idle())
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotorId {
    /// All motors, in index order.
    pub const ALL: [MotorId; NUM_MOTORS] = [
        MotorId::FrontLeft,
        MotorId::FrontRight,
        MotorId::BackLeft,
        MotorId::BackRight,
    ];

    pub fn index(self) -> usize {
        match self {
            MotorId::FrontLeft => 0,
            MotorId::FrontRight => 1,
            MotorId::BackLeft => 2,
            MotorId::BackRight => 3,
        }
    }
}

impl MotorDems {
    /// Every motor at idle.
    pub fn idle() -> Self {
        Self::uniform(MOTOR_IDLE_PULSE_US)
    }

    /// Every motor at the same pulse width.
    pub fn uniform(pulse_us: u32) -> Self {
        Self {
            pulse_us: [pulse_us; NUM_MOTORS],
        }
    }

    pub fn get(&self, motor: MotorId) -> u32 {
        self.pulse_us[motor.index()]
    }

    pub fn set(&mut self, motor: MotorId, pulse_us: u32) {
        self.pulse_us[motor.index()] = pulse_us;
    }

    pub fn is_idle(&self) -> bool {
        self.pulse_us.iter().all(|&p| p == MOTOR_IDLE_PULSE_US)
    }
}

impl Default for MotorDems {
    fn default() -> Self {
        Self::idle()
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Clamp a pulse width into the valid ESC range.
///
/// Returns the value to apply and, if it had to be clamped, the error to report.
pub fn clamp_pulse(motor: MotorId, pulse_us: u32) -> (u32, Option<MotorError>) {
    let clamped_us = pulse_us.max(MOTOR_IDLE_PULSE_US).min(MOTOR_MAX_PULSE_US);

    if clamped_us == pulse_us {
        (pulse_us, None)
    } else {
        (
            clamped_us,
            Some(MotorError::OutOfRange {
                motor,
                pulse_us,
                clamped_us,
            }),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        dems: MotorDems,
    }

    impl MotorSink for Recorder {
        fn set_motor(&mut self, motor: MotorId, pulse_us: u32) -> Result<(), MotorError> {
            let (clamped, err) = clamp_pulse(motor, pulse_us);
            self.dems.set(motor, clamped);
            match err {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }
    }

    #[test]
    fn test_apply_clamps_and_reports() {
        let mut sink = Recorder::default();
        let dems = MotorDems {
            pulse_us: [1500, 2500, 900, 2000],
        };

        let errors = sink.apply(&dems);

        assert_eq!(sink.dems.pulse_us, [1500, 2000, 1000, 2000]);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0],
            MotorError::OutOfRange {
                motor: MotorId::FrontRight,
                pulse_us: 2500,
                clamped_us: 2000
            }
        );

        assert!(sink.stop_all().is_empty());
        assert!(sink.dems.is_idle());
    }
}
