//! # Simulated equipment
//!
//! Stand-ins for the flight controller's hardware so the executable can run
//! on a host. The IMU reports a vehicle sitting level with Perlin noise on
//! every axis, the RC transmitter replays a scripted sequence of stick
//! positions as PPM edges, and the motors record what they were told.
//!
//! Faults can be injected through the parameters: failed IMU reads and RC
//! link dropouts.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod imu;
mod motors;
mod rc;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use fc_if::eqpt::{imu::Axes, rc::RC_CHANNEL_COUNT};

pub use imu::*;
pub use motors::*;
pub use rc::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulated equipment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimParams {
    pub imu: SimImuParams,
    pub rc: SimRcParams,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimImuParams {
    /// Seed of the noise generator.
    pub seed: u32,

    /// Amplitude of the gyroscope noise.
    ///
    /// Units: radians/second
    pub gyro_noise_rads: f64,

    /// Amplitude of the accelerometer noise.
    ///
    /// Units: meters/second^2
    pub accel_noise: f64,

    /// The magnetic field seen by the level vehicle.
    pub mag_field: Axes,

    /// Fail every nth read with a bus error. Zero disables.
    pub fail_every: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimRcParams {
    /// Time between the starts of two frames.
    ///
    /// Units: microseconds
    pub frame_period_us: u64,

    /// Pace the edges in real time. Otherwise they are produced as fast as
    /// they are asked for.
    pub realtime: bool,

    /// Stick positions to replay. The last step is held once the script
    /// ends.
    pub script: Vec<ScriptStep>,

    /// A window during which the transmitter goes silent.
    pub dropout: Option<Dropout>,
}

/// One step of the stick script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ScriptStep {
    /// Units: milliseconds
    pub duration_ms: u64,

    /// Channel values.
    ///
    /// Units: microseconds
    pub signals_us: [u16; RC_CHANNEL_COUNT],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Dropout {
    /// Units: milliseconds
    pub start_ms: u64,

    /// Units: milliseconds
    pub duration_ms: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimImuParams {
    fn default() -> Self {
        Self {
            seed: 0,
            gyro_noise_rads: 0.002,
            accel_noise: 0.05,
            mag_field: [0.2, 0.0, -0.4],
            fail_every: 0,
        }
    }
}

impl Default for SimRcParams {
    fn default() -> Self {
        Self {
            frame_period_us: 22_500,
            realtime: true,
            script: Vec::new(),
            dropout: None,
        }
    }
}

impl Dropout {
    pub fn contains(&self, time_ms: u64) -> bool {
        time_ms >= self.start_ms
            && time_ms < self.start_ms.saturating_add(self.duration_ms)
    }
}
