//! # Flight controller equipment interface crate.
//!
//! Provides the narrow contracts between the flight control core and the
//! equipment around it: the IMU, the RC receiver capture timer and the motor
//! outputs.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Data types and driver traits for equipment (IMU, RC capture, motors)
pub mod eqpt;
