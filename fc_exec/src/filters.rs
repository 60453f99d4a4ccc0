//! # Signal filters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::f64::consts::PI;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// First order low pass filter.
#[derive(Debug, Clone, Copy)]
pub struct LowPassFilter {
    /// Smoothing factor, 1 passes the input straight through.
    alpha: f64,

    /// Previous output, `None` until the first sample.
    last: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LowPassFilter {
    /// Create a new filter.
    ///
    /// A cutoff of zero disables the filter.
    ///
    /// # Inputs
    /// - `cutoff_hz`: cutoff frequency in hertz
    /// - `sample_period_s`: time between samples in seconds
    pub fn new(cutoff_hz: f64, sample_period_s: f64) -> Self {
        let alpha = if cutoff_hz > 0.0 {
            let k = 2.0 * PI * sample_period_s * cutoff_hz;
            k / (k + 1.0)
        } else {
            1.0
        };

        Self { alpha, last: None }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Filter a new sample. The first sample initialises the filter.
    pub fn apply(&mut self, value: f64) -> f64 {
        let out = match self.last {
            Some(last) => last + self.alpha * (value - last),
            None => value,
        };

        self.last = Some(out);
        out
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
