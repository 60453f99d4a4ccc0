//! # PID controller
//!
//! A single axis PID controller with conditional integration anti-windup. The controller state is
//! an explicit value owned by the caller, the gains and limits are passed in on every update so
//! that several axes can share one tuning.
//!
//! The integration period `dt` is a fixed constant held in the state and is assumed to be the
//! control loop period. The elapsed time between calls is never measured, so the scheduler must
//! hold the configured period.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use util::{maths::sat_limit, raise_error};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gains {
    pub k_p: f64,
    pub k_i: f64,
    pub k_d: f64,
}

/// Output clamp range of a controller, `min < max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub min: i32,
    pub max: i32,
}

/// Persistent memory of one controller axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControllerState {
    /// Accumulated integral term, always within the controller limits.
    pub integrated_error: f64,

    /// Which limit the integral last hit: -1 for min, 1 for max, 0 for none.
    pub saturated: i8,

    /// The error passed in on the previous update.
    pub last_error: i32,

    /// Integration period, equal to the control loop period.
    ///
    /// Units: milliseconds
    pub dt: f64,
}

/// Contribution of each term to a controller output, before the output clamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PidTerms {
    pub p: f64,
    pub i: f64,
    pub d: f64,
}

/// PID term breakdown for the three rotation axes of a controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AxisTerms {
    pub roll: PidTerms,
    pub pitch: PidTerms,
    pub yaw: PidTerms,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Gains {
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self { k_p, k_i, k_d }
    }
}

impl Limits {
    /// Create a new set of limits.
    ///
    /// # Panics
    /// - If `min >= max`. Limits are built from validated parameters so this is a programming
    ///   error.
    pub fn new(min: i32, max: i32) -> Self {
        if min >= max {
            raise_error!("Invalid controller limits, min ({}) must be less than max ({})", min, max);
        }

        Self { min, max }
    }

    /// Symmetric limits `[-magnitude, magnitude]`.
    pub fn symmetric(magnitude: i32) -> Self {
        Self::new(-magnitude, magnitude)
    }

    /// True if `min < max`.
    pub fn is_valid(&self) -> bool {
        self.min < self.max
    }

    /// Clamp a value into the limits.
    pub fn clamp(&self, value: i32) -> i32 {
        sat_limit(value, self.min, self.max).0
    }
}

impl ControllerState {
    /// Create a fresh state integrating over the given period.
    pub fn new(dt: f64) -> Self {
        Self {
            integrated_error: 0.0,
            saturated: 0,
            last_error: 0,
            dt,
        }
    }

    /// Clear the integral, saturation and derivative memory, keeping `dt`.
    pub fn reset(&mut self) {
        *self = Self::new(self.dt);
    }

    /// Run one controller update for the given error.
    ///
    /// Returns the clamped output and the breakdown of its terms.
    pub fn update(&mut self, error: i32, gains: &Gains, limits: &Limits) -> (i32, PidTerms) {
        let e = error as f64;

        // Only integrate if this error would not push the integral further into the limit it
        // is already sitting at.
        let pushing_into_limit =
            (self.saturated > 0 && error > 0) || (self.saturated < 0 && error < 0);

        if !pushing_into_limit {
            let (integrated, saturated) = sat_limit(
                self.integrated_error + e * gains.k_i * self.dt,
                limits.min as f64,
                limits.max as f64,
            );
            self.integrated_error = integrated;
            self.saturated = saturated;
        }

        let terms = PidTerms {
            p: e * gains.k_p,
            i: self.integrated_error,
            d: (e - self.last_error as f64) * gains.k_d * self.dt,
        };

        let (output, _) = sat_limit(
            terms.p + terms.i + terms.d,
            limits.min as f64,
            limits.max as f64,
        );

        self.last_error = error;

        (output as i32, terms)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn limits() -> Limits {
        Limits::symmetric(100)
    }

    #[test]
    fn test_zero_error_zero_output() {
        let mut state = ControllerState::new(5.0);
        let gains = Gains::new(10.0, 0.01, 1.0);

        for _ in 0..10 {
            let (out, terms) = state.update(0, &gains, &limits());
            assert_eq!(out, 0);
            assert_eq!(terms, PidTerms::default());
        }
    }

    #[test]
    fn test_constant_error_integrates_to_positive() {
        // Pure integral controller, the first output is already positive and grows until the
        // limit is reached.
        let mut state = ControllerState::new(1.0);
        let gains = Gains::new(0.0, 0.5, 0.0);

        let mut prev = 0;
        for _ in 0..100 {
            let (out, _) = state.update(3, &gains, &limits());
            assert!(out > 0);
            assert!(out >= prev);
            prev = out;
        }
        assert_eq!(prev, 100);
        assert_eq!(state.saturated, 1);
    }

    #[test]
    fn test_output_within_limits() {
        let mut state = ControllerState::new(5.0);
        let gains = Gains::new(10.0, 0.1, 2.0);
        let lims = limits();

        for i in -200..200 {
            let error = (i * 37) % 401 - 200;
            let (out, _) = state.update(error, &gains, &lims);
            assert!(out >= lims.min && out <= lims.max);
            assert!(state.integrated_error >= lims.min as f64);
            assert!(state.integrated_error <= lims.max as f64);
        }
    }

    #[test]
    fn test_anti_windup() {
        let mut state = ControllerState::new(1.0);
        let gains = Gains::new(0.0, 1.0, 0.0);
        let lims = limits();

        state.update(60, &gains, &lims);
        assert_eq!(state.integrated_error, 60.0);
        assert_eq!(state.saturated, 0);

        // Hits the upper limit
        state.update(60, &gains, &lims);
        assert_eq!(state.integrated_error, 100.0);
        assert_eq!(state.saturated, 1);

        // Still pushing upwards, integral is frozen
        for _ in 0..10 {
            state.update(60, &gains, &lims);
            assert_eq!(state.integrated_error, 100.0);
        }

        // Error reverses, integration resumes immediately
        state.update(-10, &gains, &lims);
        assert_eq!(state.integrated_error, 90.0);
        assert_eq!(state.saturated, 0);
    }

    #[test]
    fn test_derivative_uses_last_error() {
        let mut state = ControllerState::new(2.0);
        let gains = Gains::new(0.0, 0.0, 1.5);

        let (out, terms) = state.update(10, &gains, &limits());
        assert_eq!(terms.d, 30.0);
        assert_eq!(out, 30);

        let (out, _) = state.update(10, &gains, &limits());
        assert_eq!(out, 0);
        assert_eq!(state.last_error, 10);
    }

    #[test]
    fn test_reset() {
        let mut state = ControllerState::new(5.0);
        let gains = Gains::new(1.0, 1.0, 1.0);

        state.update(50, &gains, &limits());
        state.reset();

        assert_eq!(state, ControllerState::new(5.0));
    }

    #[test]
    #[should_panic]
    fn test_inverted_limits_panic() {
        Limits::new(10, -10);
    }
}
