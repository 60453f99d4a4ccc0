//! # Equipment Interface
//!
//! This module defines the interface structures exchanged with the equipment drivers. The
//! drivers themselves (bus transactions, register maps, timer set up) live outside the core.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Inertial measurement unit (gyroscope, accelerometer, magnetometer)
pub mod imu;

/// Motor outputs
pub mod motor;

/// RC receiver (PPM) capture
pub mod rc;
