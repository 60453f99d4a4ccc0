//! Arming decisions and stick interpretation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::Params;
use crate::{
    ahrs::Attitude,
    pipeline::FlightMode,
    rate_ctrl::Rates
};
use fc_if::eqpt::rc::{PpmFrame, RC_PULSE_MAX_US, RC_PULSE_MIN_US};
use util::maths::lin_map;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The pilot inputs carried by one RC frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sticks {
    pub roll_us: u16,
    pub pitch_us: u16,
    pub throttle_us: u16,
    pub yaw_us: u16,
    pub flight_mode_us: u16,
    pub arm_switch_us: u16,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What an RC frame asks of the arming state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmDecision {
    /// Keep the current state.
    Hold,

    Arm,

    Disarm,

    /// The switch asks to arm but the throttle is open.
    Refuse,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Sticks {
    /// Pick the pilot inputs out of a frame using the channel map.
    pub fn from_frame(frame: &PpmFrame, params: &Params) -> Self {
        let ch = &params.channels;
        let get = |i: usize| frame.channel(i).unwrap_or(RC_PULSE_MIN_US);

        Self {
            roll_us: get(ch.roll),
            pitch_us: get(ch.pitch),
            throttle_us: get(ch.throttle),
            yaw_us: get(ch.yaw),
            flight_mode_us: get(ch.flight_mode),
            arm_switch_us: get(ch.arm_switch),
        }
    }

    pub fn throttle_low(&self, params: &Params) -> bool {
        self.throttle_us <= params.throttle_low_threshold_us
    }

    /// Decide what this frame means for the arming state.
    ///
    /// A high switch arms only when the throttle is closed. A low switch
    /// disarms only when the throttle is closed, so the vehicle can never be
    /// disarmed in flight by the switch alone.
    pub fn arm_decision(&self, armed: bool, params: &Params) -> ArmDecision {
        let throttle_low = self.throttle_low(params);

        if self.arm_switch_us >= params.switch_high_threshold_us {
            match (armed, throttle_low) {
                (true, _) => ArmDecision::Hold,
                (false, true) => ArmDecision::Arm,
                (false, false) => ArmDecision::Refuse,
            }
        }
        else if self.arm_switch_us <= params.switch_low_threshold_us
            && throttle_low
            && armed
        {
            ArmDecision::Disarm
        }
        else {
            ArmDecision::Hold
        }
    }

    pub fn flight_mode(&self, params: &Params) -> FlightMode {
        if self.flight_mode_us >= params.switch_high_threshold_us {
            FlightMode::Attitude
        } else {
            FlightMode::Rate
        }
    }

    /// Rates demanded by the roll, pitch and yaw sticks.
    pub fn desired_rates(&self, params: &Params) -> Rates {
        let r = params.max_rate_dps;
        Rates {
            roll: stick_to(self.roll_us, r),
            pitch: stick_to(self.pitch_us, r),
            yaw: stick_to(self.yaw_us, r),
        }
    }

    /// Roll and pitch angles demanded by the sticks, with the given yaw.
    pub fn desired_attitude(&self, yaw_cdeg: i32, params: &Params) -> Attitude {
        let a = params.max_angle_cdeg;
        Attitude {
            roll: stick_to(self.roll_us, a),
            pitch: stick_to(self.pitch_us, a),
            yaw: yaw_cdeg,
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Map a stick pulse onto `[-max, max]`, centred on the middle of the pulse
/// range.
fn stick_to(stick_us: u16, max: i32) -> i32 {
    let v = lin_map(
        (RC_PULSE_MIN_US as f64, RC_PULSE_MAX_US as f64),
        (-max as f64, max as f64),
        stick_us as f64
    );

    (v.round() as i32).max(-max).min(max)
}

#[cfg(test)]
mod test {
    use super::*;

    fn sticks(throttle_us: u16, arm_switch_us: u16) -> Sticks {
        Sticks {
            roll_us: 1500,
            pitch_us: 1500,
            throttle_us,
            yaw_us: 1500,
            flight_mode_us: 1000,
            arm_switch_us,
        }
    }

    #[test]
    fn test_arm_decisions() {
        let p = Params::default();

        assert_eq!(sticks(1000, 2000).arm_decision(false, &p), ArmDecision::Arm);
        assert_eq!(sticks(1500, 2000).arm_decision(false, &p), ArmDecision::Refuse);
        assert_eq!(sticks(1500, 2000).arm_decision(true, &p), ArmDecision::Hold);

        // Switch off while flying does nothing
        assert_eq!(sticks(1500, 1000).arm_decision(true, &p), ArmDecision::Hold);
        assert_eq!(sticks(1100, 1000).arm_decision(true, &p), ArmDecision::Disarm);

        // Switch between thresholds
        assert_eq!(sticks(1000, 1500).arm_decision(true, &p), ArmDecision::Hold);
        assert_eq!(sticks(1000, 1500).arm_decision(false, &p), ArmDecision::Hold);
    }

    #[test]
    fn test_from_frame_channel_map() {
        let p = Params::default();
        let frame = PpmFrame {
            signals_us: [1100, 1200, 1300, 1400, 1500, 1600, 1700, 1800],
        };

        let s = Sticks::from_frame(&frame, &p);
        assert_eq!(s.roll_us, 1100);
        assert_eq!(s.throttle_us, 1300);
        assert_eq!(s.arm_switch_us, 1600);
    }

    #[test]
    fn test_stick_scaling() {
        let p = Params::default();
        let mut s = sticks(1000, 1000);
        s.roll_us = 2000;
        s.pitch_us = 1250;
        s.yaw_us = 2100;

        assert_eq!(s.desired_rates(&p), Rates { roll: 500, pitch: -250, yaw: 500 });

        let att = s.desired_attitude(4500, &p);
        assert_eq!(att, Attitude { roll: 3000, pitch: -1500, yaw: 4500 });
    }

    #[test]
    fn test_flight_mode() {
        let p = Params::default();
        let mut s = sticks(1000, 1000);
        assert_eq!(s.flight_mode(&p), FlightMode::Rate);

        s.flight_mode_us = 1900;
        assert_eq!(s.flight_mode(&p), FlightMode::Attitude);
    }
}
