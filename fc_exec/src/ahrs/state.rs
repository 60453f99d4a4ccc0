//! Implementations for the orientation estimator state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{trace, warn};
use serde::Serialize;

// Internal
use super::{AhrsError, Attitude, Madgwick, Params};
use crate::{filters::LowPassFilter, rate_ctrl::Rates};
use fc_if::eqpt::imu::{Axes, ImuDriver, ImuError, ImuReads};
use util::{module::State, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Orientation estimator module state
#[derive(Debug, Clone)]
pub struct OrientationEstimator {
    params: Params,

    filter: Madgwick,

    gyro_lpf: [LowPassFilter; 3],

    /// Last good gyroscope sample, reused when a read fails.
    ///
    /// Units: radians/second
    last_gyro_rads: Axes,

    /// Last good magnetometer sample, reused between reads.
    last_mag: Option<Axes>,

    /// Number of sensor reads made, used to divide the magnetometer rate.
    read_count: u64,

    seeded: bool,
}

/// Input data to the orientation estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    pub reads: ImuReads,

    /// Time the reads were taken.
    ///
    /// Units: milliseconds
    pub timestamp_ms: u64,
}

/// The published orientation estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OrientationSample {
    pub attitude: Attitude,

    /// Filtered body rates.
    ///
    /// Units: degrees/second
    pub rates: Rates,

    /// Units: milliseconds
    pub timestamp_ms: u64,
}

/// Status report for orientation estimator processing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusReport {
    /// The gyro read failed and the previous sample was used.
    pub gyro_reused: bool,

    /// The accelerometer read failed and no correction was applied.
    pub accel_skipped: bool,

    /// A new magnetometer sample was fused.
    pub mag_fresh: bool,

    /// The orientation was seeded from the accelerometer on this cycle.
    pub seeded: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl OrientationEstimator {
    /// Create a new estimator, validating the parameters.
    pub fn new(params: Params) -> Result<Self, AhrsError> {
        params.validate()?;

        Ok(Self::with_params(params))
    }

    fn with_params(params: Params) -> Self {
        let lpf = LowPassFilter::new(
            params.gyro_lpf_cutoff_hz, params.sample_period_s());

        Self {
            filter: Madgwick::from_params(&params),
            gyro_lpf: [lpf; 3],
            last_gyro_rads: [0.0; 3],
            last_mag: None,
            read_count: 0,
            seeded: false,
            params,
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn filter(&self) -> &Madgwick {
        &self.filter
    }

    /// Read the IMU for one cycle.
    ///
    /// The magnetometer is only read every `mag_read_divider` cycles. Failed
    /// reads are logged and reported as `None`.
    pub fn read_sensors<D>(&mut self, driver: &mut D) -> ImuReads
    where
        D: ImuDriver + ?Sized
    {
        let mag_due = self.read_count % self.params.mag_read_divider as u64 == 0;
        self.read_count = self.read_count.wrapping_add(1);

        ImuReads {
            gyro_rads: logged("gyro", driver.read_gyro()),
            accel: logged("accel", driver.read_accel()),
            mag: if mag_due {
                logged("mag", driver.read_mag())
            } else {
                None
            },
        }
    }
}

impl Default for OrientationEstimator {
    fn default() -> Self {
        Self::with_params(Params::default())
    }
}

impl State for OrientationEstimator {
    type InitData = Params;
    type InitError = AhrsError;

    type InputData = InputData;
    type OutputData = OrientationSample;
    type StatusReport = StatusReport;
    type ProcError = AhrsError;

    /// Initialise the estimator.
    ///
    /// Expected init data is the loaded parameters.
    fn init(&mut self, init_data: Self::InitData, _session: &Session)
        -> Result<(), Self::InitError>
    {
        *self = Self::new(init_data)?;

        Ok(())
    }

    /// Fuse one set of reads and produce the new orientation sample.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let mut report = StatusReport::default();
        let reads = &input_data.reads;

        match reads.gyro_rads {
            Some(g) if g.iter().all(|v| v.is_finite()) => self.last_gyro_rads = g,
            Some(g) => {
                warn!("Discarding non finite gyro reading {:?}", g);
                report.gyro_reused = true;
            },
            None => report.gyro_reused = true,
        }

        if reads.accel.is_none() {
            report.accel_skipped = true;
        }

        if let Some(m) = reads.mag {
            self.last_mag = Some(m);
            report.mag_fresh = true;
        }

        if self.params.seed_from_accel && !self.seeded {
            if let Some(a) = reads.accel.as_ref() {
                self.seeded = self.filter.seed_from_accel(a);
                report.seeded = self.seeded;
            }
        }

        self.filter.update(
            &self.last_gyro_rads,
            reads.accel.as_ref(),
            self.last_mag.as_ref()
        );

        let mut rates_dps = [0i32; 3];
        for (i, lpf) in self.gyro_lpf.iter_mut().enumerate() {
            let filtered = lpf.apply(self.last_gyro_rads[i]);
            rates_dps[i] = filtered.to_degrees().round() as i32;
        }

        let sample = OrientationSample {
            attitude: self.filter.attitude(),
            rates: Rates {
                roll: rates_dps[0],
                pitch: rates_dps[1],
                yaw: rates_dps[2],
            },
            timestamp_ms: input_data.timestamp_ms,
        };

        trace!("Orientation: {:?}", sample);

        Ok((sample, report))
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn logged(sensor: &str, read: Result<Axes, ImuError>) -> Option<Axes> {
    match read {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("IMU {} read failed: {}", sensor, e);
            None
        }
    }
}
