//! Parameters structure for the Supervisor

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::{SupervisorError, Timeouts};
use fc_if::eqpt::rc::RC_CHANNEL_COUNT;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the flight supervisor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {

    // ---- TIMING ----

    /// Period of the control loop.
    ///
    /// Units: milliseconds
    pub control_period_ms: u64,

    /// Time after start up during which the motors are held at idle so the
    /// ESCs can initialise.
    ///
    /// Units: milliseconds
    pub esc_startup_hold_ms: u64,

    /// Maximum age of the latest RC frame.
    ///
    /// Units: milliseconds
    pub ppm_timeout_ms: u64,

    /// Maximum age of the latest orientation sample.
    ///
    /// Units: milliseconds
    pub orientation_timeout_ms: u64,

    /// Maximum time between two control loop iterations.
    ///
    /// Units: milliseconds
    pub loop_timeout_ms: u64,

    // ---- RC ----

    /// Which RC channel carries each input.
    pub channels: ChannelMap,

    /// A switch at or above this value is on.
    ///
    /// Units: microseconds
    pub switch_high_threshold_us: u16,

    /// A switch at or below this value is off.
    ///
    /// Units: microseconds
    pub switch_low_threshold_us: u16,

    /// A throttle at or below this value is considered closed.
    ///
    /// Units: microseconds
    pub throttle_low_threshold_us: u16,

    // ---- SETPOINTS ----

    /// Rate demanded at full stick deflection.
    ///
    /// Units: degrees/second
    pub max_rate_dps: i32,

    /// Roll and pitch angle demanded at full stick deflection in attitude
    /// mode.
    ///
    /// Units: hundredths of a degree
    pub max_angle_cdeg: i32,

    // ---- TELEMETRY ----

    /// Write the per-tick telemetry archive.
    pub archive_tm: bool,
}

/// Assignment of RC channels to inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChannelMap {
    pub roll: usize,
    pub pitch: usize,
    pub throttle: usize,
    pub yaw: usize,
    pub flight_mode: usize,
    pub arm_switch: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    pub fn validate(&self) -> Result<(), SupervisorError> {
        let invalid = |msg: String| Err(SupervisorError::InvalidParams(msg));

        if self.control_period_ms == 0 {
            return invalid("control_period_ms must be positive".into());
        }
        if self.switch_low_threshold_us >= self.switch_high_threshold_us {
            return invalid(format!(
                "switch low threshold ({}) must be below the high threshold ({})",
                self.switch_low_threshold_us, self.switch_high_threshold_us
            ));
        }
        if self.max_rate_dps <= 0 || self.max_angle_cdeg <= 0 {
            return invalid("stick scaling must be positive".into());
        }

        let ch = &self.channels;
        for &(name, index) in [
            ("roll", ch.roll),
            ("pitch", ch.pitch),
            ("throttle", ch.throttle),
            ("yaw", ch.yaw),
            ("flight_mode", ch.flight_mode),
            ("arm_switch", ch.arm_switch),
        ].iter() {
            if index >= RC_CHANNEL_COUNT {
                return invalid(format!(
                    "{} channel ({}) must be below {}",
                    name, index, RC_CHANNEL_COUNT
                ));
            }
        }

        Ok(())
    }

    /// The freshness timeouts.
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            ppm_ms: self.ppm_timeout_ms,
            orientation_ms: self.orientation_timeout_ms,
            loop_ms: self.loop_timeout_ms,
        }
    }

    /// Control period.
    ///
    /// Units: seconds
    pub fn control_period_s(&self) -> f64 {
        self.control_period_ms as f64 / 1000.0
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            control_period_ms: 5,
            esc_startup_hold_ms: 7000,
            ppm_timeout_ms: 1000,
            orientation_timeout_ms: 25,
            loop_timeout_ms: 25,
            channels: ChannelMap::default(),
            switch_high_threshold_us: 1700,
            switch_low_threshold_us: 1300,
            throttle_low_threshold_us: 1100,
            max_rate_dps: 500,
            max_angle_cdeg: 3000,
            archive_tm: true,
        }
    }
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self {
            roll: 0,
            pitch: 1,
            throttle: 2,
            yaw: 3,
            flight_mode: 4,
            arm_switch: 5,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert!(Params::default().validate().is_ok());
    }

    #[test]
    fn test_channel_out_of_range() {
        let params: Params = util::params::load_str(
            "[channels]\narm_switch = 8\n"
        ).unwrap();

        assert_eq!(params.channels.throttle, 2);
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_inverted_switch_thresholds() {
        let mut params = Params::default();
        params.switch_low_threshold_us = 1800;
        assert!(params.validate().is_err());
    }
}
