//! Simulated motor outputs

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;

use fc_if::eqpt::motor::{clamp_pulse, MotorDems, MotorError, MotorId, MotorSink};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Motor outputs which remember what they were set to.
#[derive(Debug, Default)]
pub struct SimMotors {
    dems: MotorDems,

    /// Number of individual motor writes.
    writes: u64,

    /// Number of writes which had to be clamped.
    clamps: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimMotors {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pulse widths currently applied.
    pub fn dems(&self) -> MotorDems {
        self.dems
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn clamps(&self) -> u64 {
        self.clamps
    }
}

impl MotorSink for SimMotors {
    fn set_motor(&mut self, motor: MotorId, pulse_us: u32) -> Result<(), MotorError> {
        let (applied_us, err) = clamp_pulse(motor, pulse_us);

        trace!("{:?} -> {} us", motor, applied_us);

        self.dems.set(motor, applied_us);
        self.writes += 1;

        match err {
            Some(e) => {
                self.clamps += 1;
                Err(e)
            },
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_records_and_clamps() {
        let mut motors = SimMotors::new();

        let errors = motors.apply(&MotorDems { pulse_us: [1200, 1300, 2200, 1400] });
        assert_eq!(errors.len(), 1);
        assert_eq!(motors.dems().pulse_us, [1200, 1300, 2000, 1400]);
        assert_eq!(motors.writes(), 4);
        assert_eq!(motors.clamps(), 1);

        assert!(motors.stop_all().is_empty());
        assert!(motors.dems().is_idle());
    }
}
