//! # Madgwick orientation filter
//!
//! Gradient descent fusion of gyroscope, accelerometer and magnetometer
//! readings. The gyroscope rate is integrated into the orientation
//! quaternion, while a normalised gradient step of fixed size `beta` pulls
//! the estimate towards the orientation implied by the measured gravity (and
//! earth field) directions.
//!
//! The quaternion rotates vectors from the body frame into the earth frame,
//! with the earth frame's z axis pointing up.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use fc_if::eqpt::imu::Axes;
use nalgebra::{Matrix3x4, Quaternion, UnitQuaternion, Vector3, Vector4};

// Internal
use super::{Attitude, Params};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Madgwick filter state.
#[derive(Debug, Clone)]
pub struct Madgwick {
    /// Orientation estimate, kept at unit norm.
    q: Quaternion<f64>,

    /// Gradient step gain.
    beta: f64,

    /// Rate of new samples.
    ///
    /// Units: hertz
    sample_freq_hz: f64,

    /// Fusion steps run per sample.
    oversampling: u32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Madgwick {
    /// Create a new filter at the identity orientation.
    pub fn new(sample_freq_hz: f64, oversampling: u32, beta: f64) -> Self {
        Self {
            q: Quaternion::identity(),
            beta,
            sample_freq_hz,
            oversampling: oversampling.max(1),
        }
    }

    pub fn from_params(params: &Params) -> Self {
        Self::new(params.sample_freq_hz, params.oversampling, params.beta)
    }

    /// Current orientation estimate.
    pub fn quaternion(&self) -> &Quaternion<f64> {
        &self.q
    }

    /// Return to the identity orientation.
    pub fn reset(&mut self) {
        self.q = Quaternion::identity();
    }

    /// Set the orientation to the one implied by a gravity reading, with
    /// zero yaw.
    ///
    /// Returns `false` and leaves the orientation unchanged if the reading
    /// has zero norm.
    pub fn seed_from_accel(&mut self, accel: &Axes) -> bool {
        match normalised(accel) {
            Some(a) => {
                let roll = a.y.atan2(a.z);
                let pitch = (-a.x).atan2((a.y * a.y + a.z * a.z).sqrt());
                self.q = UnitQuaternion::from_euler_angles(roll, pitch, 0.0)
                    .into_inner();
                true
            }
            None => false,
        }
    }

    /// Fuse one new sample.
    ///
    /// A missing or zero norm accelerometer reading skips the correction
    /// entirely, leaving gyro integration only. A missing or zero norm
    /// magnetometer reading falls back to the gravity only correction.
    ///
    /// # Inputs
    /// - `gyro_rads`: body rate in radians/second
    /// - `accel`: gravity reading, any unit
    /// - `mag`: earth field reading, any unit
    pub fn update(
        &mut self,
        gyro_rads: &Axes,
        accel: Option<&Axes>,
        mag: Option<&Axes>
    ) {
        let dt = 1.0 / (self.sample_freq_hz * self.oversampling as f64);

        let accel = accel.and_then(normalised);
        let mag = mag.and_then(normalised);

        for _ in 0..self.oversampling {
            self.step(gyro_rads, accel.as_ref(), mag.as_ref(), dt);
        }
    }

    /// Roll angle.
    ///
    /// Units: radians
    pub fn roll_rad(&self) -> f64 {
        let (q0, q1, q2, q3) = self.components();
        (q0 * q1 + q2 * q3).atan2(0.5 - q1 * q1 - q2 * q2)
    }

    /// Pitch angle.
    ///
    /// Units: radians
    pub fn pitch_rad(&self) -> f64 {
        let (q0, q1, q2, q3) = self.components();
        (-2.0 * (q1 * q3 - q0 * q2)).max(-1.0).min(1.0).asin()
    }

    /// Yaw angle, in [-pi, pi].
    ///
    /// Units: radians
    pub fn yaw_rad(&self) -> f64 {
        let (q0, q1, q2, q3) = self.components();
        (q1 * q2 + q0 * q3).atan2(0.5 - q2 * q2 - q3 * q3)
    }

    /// Roll angle.
    ///
    /// Units: degrees
    pub fn roll(&self) -> f64 {
        self.roll_rad().to_degrees()
    }

    /// Pitch angle.
    ///
    /// Units: degrees
    pub fn pitch(&self) -> f64 {
        self.pitch_rad().to_degrees()
    }

    /// Yaw angle.
    ///
    /// Units: degrees
    pub fn yaw(&self) -> f64 {
        self.yaw_rad().to_degrees()
    }

    /// Current attitude in hundredths of a degree.
    pub fn attitude(&self) -> Attitude {
        Attitude::from_radians(self.roll_rad(), self.pitch_rad(), self.yaw_rad())
    }

    /// One fusion step of length `dt` seconds.
    fn step(
        &mut self,
        gyro_rads: &Axes,
        accel: Option<&Vector3<f64>>,
        mag: Option<&Vector3<f64>>,
        dt: f64
    ) {
        // Rate of change of the quaternion from the gyroscope
        let omega = Quaternion::new(0.0, gyro_rads[0], gyro_rads[1], gyro_rads[2]);
        let mut q_dot = self.q * omega * 0.5;

        if let Some(a) = accel {
            let grad = match mag {
                Some(m) => self.gravity_gradient(a) + self.field_gradient(m),
                None => self.gravity_gradient(a),
            };

            let norm = grad.norm();
            if norm > 0.0 {
                let s = grad / norm;
                q_dot -= Quaternion::new(s[0], s[1], s[2], s[3]) * self.beta;
            }
        }

        // A non finite step keeps the last good estimate
        let next = self.q + q_dot * dt;
        let norm = next.norm();
        if norm.is_finite() && norm > 0.0 {
            self.q = next / norm;
        }
    }

    /// Gradient of the gravity direction objective, in `(w, x, y, z)` order.
    fn gravity_gradient(&self, a: &Vector3<f64>) -> Vector4<f64> {
        let (q0, q1, q2, q3) = self.components();

        let f = Vector3::new(
            2.0 * (q1 * q3 - q0 * q2) - a.x,
            2.0 * (q0 * q1 + q2 * q3) - a.y,
            2.0 * (0.5 - q1 * q1 - q2 * q2) - a.z,
        );

        let j = Matrix3x4::new(
            -2.0 * q2, 2.0 * q3, -2.0 * q0, 2.0 * q1,
            2.0 * q1, 2.0 * q0, 2.0 * q3, 2.0 * q2,
            0.0, -4.0 * q1, -4.0 * q2, 0.0,
        );

        j.transpose() * f
    }

    /// Gradient of the earth field direction objective, in `(w, x, y, z)`
    /// order.
    fn field_gradient(&self, m: &Vector3<f64>) -> Vector4<f64> {
        let (q0, q1, q2, q3) = self.components();

        // Reference field in the earth frame, rotated to have no east
        // component.
        let h = self.q * Quaternion::new(0.0, m.x, m.y, m.z) * self.q.conjugate();
        let bx = (h.i * h.i + h.j * h.j).sqrt();
        let bz = h.k;

        let f = Vector3::new(
            2.0 * bx * (0.5 - q2 * q2 - q3 * q3) + 2.0 * bz * (q1 * q3 - q0 * q2) - m.x,
            2.0 * bx * (q1 * q2 - q0 * q3) + 2.0 * bz * (q0 * q1 + q2 * q3) - m.y,
            2.0 * bx * (q0 * q2 + q1 * q3) + 2.0 * bz * (0.5 - q1 * q1 - q2 * q2) - m.z,
        );

        let j = Matrix3x4::new(
            -2.0 * bz * q2,
            2.0 * bz * q3,
            -4.0 * bx * q2 - 2.0 * bz * q0,
            -4.0 * bx * q3 + 2.0 * bz * q1,

            -2.0 * bx * q3 + 2.0 * bz * q1,
            2.0 * bx * q2 + 2.0 * bz * q0,
            2.0 * bx * q1 + 2.0 * bz * q3,
            -2.0 * bx * q0 + 2.0 * bz * q2,

            2.0 * bx * q2,
            2.0 * bx * q3 - 4.0 * bz * q1,
            2.0 * bx * q0 - 4.0 * bz * q2,
            2.0 * bx * q1,
        );

        j.transpose() * f
    }

    fn components(&self) -> (f64, f64, f64, f64) {
        (self.q.w, self.q.i, self.q.j, self.q.k)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Normalise a reading, or `None` if it has zero (or non finite) norm.
fn normalised(v: &Axes) -> Option<Vector3<f64>> {
    let v = Vector3::new(v[0], v[1], v[2]);
    let norm = v.norm();

    if norm.is_finite() && norm > 0.0 {
        Some(v / norm)
    } else {
        None
    }
}
