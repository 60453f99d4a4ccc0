//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

/// Clamp a value into `[min, max]`, returning the clamped value and which
/// bound was hit: `-1` for the minimum, `1` for the maximum, `0` otherwise.
pub fn sat_limit<T>(value: T, min: T, max: T) -> (T, i8)
where
    T: PartialOrd + Copy
{
    if value < min {
        (min, -1)
    }
    else if value > max {
        (max, 1)
    }
    else {
        (value, 0)
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap an angle into the range `[-half_turn, half_turn)`.
///
/// The unit is set by `half_turn`, e.g. `PI` for radians or `18000` for
/// hundredths of a degree.
pub fn wrap_half_turn<T>(value: T, half_turn: T) -> T
where
    T: Float
{
    let full_turn = half_turn + half_turn;
    rem_euclid(value + half_turn, full_turn) - half_turn
}
