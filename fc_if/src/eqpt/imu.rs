//! # IMU Equipment Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// A three axis reading, ordered x, y, z in the vehicle body frame.
pub type Axes = [f64; 3];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The result of reading all three IMU sensors for one fusion step.
///
/// A `None` field means the corresponding sensor produced no new data this step, either because
/// the read failed or because it was not due to be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImuReads {
    /// Body angular rate.
    ///
    /// Units: radians/second
    pub gyro_rads: Option<Axes>,

    /// Specific force. Only the direction is used so any unit is accepted.
    pub accel: Option<Axes>,

    /// Magnetic field. Only the direction is used so any unit is accepted.
    pub mag: Option<Axes>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors that an IMU driver may report for a single read.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ImuError {
    #[error("The sensor bus transfer failed")]
    BusError,

    #[error("The sensor bus transfer timed out after {0} ms")]
    Timeout(u32),

    #[error("The sensor has no data ready")]
    NotReady,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Contract for an IMU driver.
///
/// Each read is one bus transaction and may block for a bounded time. Implementations sharing a
/// bus with other devices are responsible for serialising access per transaction.
pub trait ImuDriver {
    /// Read the accelerometer.
    fn read_accel(&mut self) -> Result<Axes, ImuError>;

    /// Read the gyroscope, in radians/second.
    fn read_gyro(&mut self) -> Result<Axes, ImuError>;

    /// Read the magnetometer.
    fn read_mag(&mut self) -> Result<Axes, ImuError>;
}
