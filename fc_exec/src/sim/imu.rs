//! Simulated IMU

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use noise::{NoiseFn, Perlin, Seedable};

use super::SimImuParams;
use fc_if::eqpt::imu::{Axes, ImuDriver, ImuError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Units: meters/second^2
pub const STANDARD_GRAVITY: f64 = 9.80665;

/// Distance travelled through the noise field per read.
const NOISE_STEP: f64 = 0.05;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An IMU on a level, stationary vehicle.
pub struct SimImu {
    params: SimImuParams,
    perlin: Perlin,

    /// Reads made so far, of all sensors.
    reads: u64,

    failures: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimImu {
    pub fn new(params: SimImuParams) -> Self {
        Self {
            perlin: Perlin::new().set_seed(params.seed),
            params,
            reads: 0,
            failures: 0,
        }
    }

    /// Number of reads which were failed on purpose.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Count a read, failing it if one is due.
    fn next_read(&mut self) -> Result<f64, ImuError> {
        self.reads += 1;

        let every = self.params.fail_every;
        if every > 0 && self.reads % every == 0 {
            self.failures += 1;
            return Err(ImuError::BusError);
        }

        Ok(self.reads as f64 * NOISE_STEP)
    }

    /// Noise in `[-amplitude, amplitude]` for the given sensor axis.
    fn noise(&self, t: f64, sensor: usize, axis: usize, amplitude: f64) -> f64 {
        // Sample between the lattice points, where Perlin noise is not zero
        let lane = (sensor * 3 + axis) as f64 * 7.3 + 0.5;
        amplitude * self.perlin.get([t, lane]).max(-1.0).min(1.0)
    }

    fn noisy(&self, t: f64, sensor: usize, base: Axes, amplitude: f64) -> Axes {
        [
            base[0] + self.noise(t, sensor, 0, amplitude),
            base[1] + self.noise(t, sensor, 1, amplitude),
            base[2] + self.noise(t, sensor, 2, amplitude),
        ]
    }
}

impl ImuDriver for SimImu {
    fn read_accel(&mut self) -> Result<Axes, ImuError> {
        let t = self.next_read()?;
        Ok(self.noisy(t, 0, [0.0, 0.0, STANDARD_GRAVITY], self.params.accel_noise))
    }

    fn read_gyro(&mut self) -> Result<Axes, ImuError> {
        let t = self.next_read()?;
        Ok(self.noisy(t, 1, [0.0; 3], self.params.gyro_noise_rads))
    }

    fn read_mag(&mut self) -> Result<Axes, ImuError> {
        let t = self.next_read()?;
        Ok(self.noisy(t, 2, self.params.mag_field, 0.01))
    }
}
