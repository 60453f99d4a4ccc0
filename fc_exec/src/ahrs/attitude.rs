//! Attitude representation and accelerometer only attitude

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use fc_if::eqpt::imu::Axes;
use serde::{Deserialize, Serialize};
use util::maths::wrap_half_turn;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Half a turn in the attitude unit.
pub const HALF_TURN_CDEG: i32 = 18000;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Roll, pitch and yaw of the vehicle.
///
/// Units: hundredths of a degree. Yaw is wrapped into [-18000, 18000).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize
)]
pub struct Attitude {
    pub roll: i32,
    pub pitch: i32,
    pub yaw: i32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Attitude {
    /// Build an attitude from angles in radians, wrapping the yaw.
    pub fn from_radians(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            roll: rad_to_cdeg(roll),
            pitch: rad_to_cdeg(pitch),
            yaw: wrap_cdeg(rad_to_cdeg(yaw)),
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Calculate roll and pitch from a gravity reading alone.
///
/// Uses the same axis convention as the fusion filter, so on a vehicle at
/// rest this agrees with the converged filter output. Yaw is unobservable
/// from gravity and is reported as zero. Returns `None` for a zero reading.
pub fn attitude_from_accel(accel: &Axes) -> Option<Attitude> {
    let [ax, ay, az] = *accel;

    let norm = (ax * ax + ay * ay + az * az).sqrt();
    if !(norm.is_finite() && norm > 0.0) {
        return None;
    }

    let roll = ay.atan2(az);
    let pitch = (-ax).atan2((ay * ay + az * az).sqrt());

    Some(Attitude::from_radians(roll, pitch, 0.0))
}

/// Wrap an angle in hundredths of a degree into [-18000, 18000).
pub fn wrap_cdeg(angle: i32) -> i32 {
    wrap_half_turn(angle as f64, HALF_TURN_CDEG as f64) as i32
}

pub(crate) fn rad_to_cdeg(angle_rad: f64) -> i32 {
    (angle_rad.to_degrees() * 100.0).round() as i32
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_level() {
        let att = attitude_from_accel(&[0.0, 0.0, 9.81]).unwrap();
        assert_eq!(att, Attitude::default());
    }

    #[test]
    fn test_roll_and_pitch() {
        let a = 20f64.to_radians();

        // Rolled by 20 degrees
        let att = attitude_from_accel(&[0.0, a.sin(), a.cos()]).unwrap();
        assert_eq!(att.roll, 2000);
        assert_eq!(att.pitch, 0);

        // Pitched by 20 degrees
        let att = attitude_from_accel(&[-a.sin(), 0.0, a.cos()]).unwrap();
        assert_eq!(att.roll, 0);
        assert_eq!(att.pitch, 2000);
    }

    #[test]
    fn test_zero_reading() {
        assert!(attitude_from_accel(&[0.0, 0.0, 0.0]).is_none());
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap_cdeg(17999), 17999);
        assert_eq!(wrap_cdeg(18000), -18000);
        assert_eq!(wrap_cdeg(-18100), 17900);
        assert_eq!(wrap_cdeg(36000), 0);
    }
}
