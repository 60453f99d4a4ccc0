//! Parameters structure for the AHRS

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::AhrsError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the orientation estimator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {

    // ---- SENSOR ----

    /// Rate at which new IMU samples are read, which is also the rate of
    /// the sensor task.
    ///
    /// Units: hertz
    pub sample_freq_hz: f64,

    /// The magnetometer is read once every this many samples, the last
    /// reading being reused in between.
    pub mag_read_divider: u32,

    // ---- FUSION ----

    /// Number of fusion steps run for every new sample.
    pub oversampling: u32,

    /// Gradient descent step gain.
    pub beta: f64,

    /// Seed the orientation from the first valid accelerometer sample
    /// instead of starting from the identity.
    pub seed_from_accel: bool,

    // ---- OUTPUT ----

    /// Cutoff frequency of the low pass filter applied to the published
    /// body rates. Zero disables the filter.
    ///
    /// Units: hertz
    pub gyro_lpf_cutoff_hz: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), AhrsError> {
        if !(self.sample_freq_hz.is_finite() && self.sample_freq_hz > 0.0) {
            return Err(AhrsError::InvalidParams(format!(
                "sample_freq_hz must be positive, got {}", self.sample_freq_hz
            )));
        }
        if self.oversampling == 0 {
            return Err(AhrsError::InvalidParams(
                "oversampling must be at least 1".into()
            ));
        }
        if self.mag_read_divider == 0 {
            return Err(AhrsError::InvalidParams(
                "mag_read_divider must be at least 1".into()
            ));
        }
        if !(self.beta >= 0.0) {
            return Err(AhrsError::InvalidParams(format!(
                "beta must not be negative, got {}", self.beta
            )));
        }
        if !(self.gyro_lpf_cutoff_hz >= 0.0) {
            return Err(AhrsError::InvalidParams(format!(
                "gyro_lpf_cutoff_hz must not be negative, got {}",
                self.gyro_lpf_cutoff_hz
            )));
        }

        Ok(())
    }

    /// Period between two samples.
    ///
    /// Units: seconds
    pub fn sample_period_s(&self) -> f64 {
        1.0 / self.sample_freq_hz
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            sample_freq_hz: 200.0,
            mag_read_divider: 4,
            oversampling: 4,
            beta: 0.1,
            seed_from_accel: true,
            gyro_lpf_cutoff_hz: 40.0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_load_partial() {
        let p: Params = util::params::load_str(
            "sample_freq_hz = 100.0\nbeta = 0.05\n"
        ).unwrap();

        assert_eq!(p.sample_freq_hz, 100.0);
        assert_eq!(p.beta, 0.05);
        assert_eq!(p.oversampling, Params::default().oversampling);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let mut p = Params::default();
        p.oversampling = 0;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.sample_freq_hz = 0.0;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.mag_read_divider = 0;
        assert!(p.validate().is_err());
    }
}
