//! # Flight controller library.
//!
//! The control core of the flight controller, shared by the executable and
//! the benchmarks.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Attitude and heading reference system - fuses the IMU into an attitude
pub mod ahrs;

/// Attitude controller - converts attitude errors into desired rates
pub mod att_ctrl;

/// Signal filters
pub mod filters;

/// Motor mixer - converts rotation axis outputs into motor pulses
pub mod mixer;

/// Executable parameters
pub mod params;

/// Saturating PID controller shared by both control stages
pub mod pid;

/// The attitude, rate and mixer cascade
pub mod pipeline;

/// PPM decoding and the RC receiver
pub mod ppm;

/// Rate controller - converts rate errors into rotation axis outputs
pub mod rate_ctrl;

/// Simulated equipment for running on a host
pub mod sim;

/// Single value handoff between threads
pub mod slot;

/// Flight supervisor - arming, flight modes and fail-safe
pub mod supervisor;
