//! Common

use num_traits::Num;
use std::ops::{Add, Mul, Neg};

/// Use 64-bit precision for floating point numbers. The paraxial lens traces
/// place flat surfaces on spheres with radii in the thousands, which leaves
/// too few significant digits in 32-bit precision.
pub type Float = f64;

/// Default signed integer to 32-bit.
pub type Int = i32;

/// PI (π)
pub const PI: Float = std::f64::consts::PI;

/// PI/2 (π/2)
pub const PI_OVER_TWO: Float = PI * 0.5;

/// PI/4 (π/4)
pub const PI_OVER_FOUR: Float = PI * 0.25;

/// Returns the absolute value of a number.
///
/// * `n` - The number.
#[inline(always)]
pub fn abs<T>(n: T) -> T
where
    T: Num + Neg<Output = T> + PartialOrd + Copy,
{
    if n < T::zero() {
        -n
    } else {
        n
    }
}

/// Returns the minimum of 2 numbers.
///
/// * `a` - First number.
/// * `b` - Second number.
#[inline(always)]
pub fn min<T>(a: T, b: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if a < b {
        a
    } else {
        b
    }
}

/// Returns the maximum of 2 numbers.
///
/// * `a` - First number.
/// * `b` - Second number.
#[inline(always)]
pub fn max<T>(a: T, b: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if a > b {
        a
    } else {
        b
    }
}

/// Clamps a value to the closed interval [low, high].
///
/// * `val`  - The value.
/// * `low`  - Lower bound.
/// * `high` - Upper bound.
#[inline(always)]
pub fn clamp<T>(val: T, low: T, high: T) -> T
where
    T: PartialOrd + Copy,
{
    if val < low {
        low
    } else if val > high {
        high
    } else {
        val
    }
}

/// Returns -1, 0 or 1 depending on the sign of a value. Zero maps to 1 so a
/// surface with a degenerate radius still keeps its orientation.
///
/// * `v` - The value.
#[inline(always)]
pub fn sgn(v: Float) -> Float {
    if v < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Linearly interpolate between two points for parameters in [0, 1] and
/// extrapolate for parameters outside that interval.
///
/// * `t` - Parameter.
/// * `p0` - Point at t=0.
/// * `p1` - Point at t=1.
#[inline(always)]
pub fn lerp<P>(t: Float, p0: P, p1: P) -> P
where
    Float: Mul<P, Output = P>,
    P: Add<P, Output = P>,
{
    (1.0 - t) * p0 + t * p1
}

/// Bilinearly interpolate four corner values.
///
/// * `tx`  - Fractional position along the first axis.
/// * `ty`  - Fractional position along the second axis.
/// * `v00` - Value at (0, 0).
/// * `v10` - Value at (1, 0).
/// * `v01` - Value at (0, 1).
/// * `v11` - Value at (1, 1).
#[inline(always)]
pub fn bilerp<P>(tx: Float, ty: Float, v00: P, v10: P, v01: P, v11: P) -> P
where
    Float: Mul<P, Output = P>,
    P: Add<P, Output = P>,
{
    lerp(ty, lerp(tx, v00, v10), lerp(tx, v01, v11))
}

/// Emulates the behavior of `lower_bound`: returns the index of the first
/// element for which `pred` is false, or `size` if there is none. The
/// predicate must be true for a prefix of the indices and false afterwards.
///
/// * `size` - Size of array.
/// * `pred` - Function that returns a value at a given index.
pub fn partition_point<Predicate>(size: usize, pred: Predicate) -> usize
where
    Predicate: Fn(usize) -> bool,
{
    let (mut first, mut len) = (0, size);

    while len > 0 {
        let half = len >> 1;
        let middle = first + half;

        // Bisect range based on value of `pred` at `middle`.
        if pred(middle) {
            first = middle + 1;
            len -= half + 1;
        } else {
            len = half;
        }
    }

    first
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
