//! 2-D Points

use crate::pbrt::*;
use num_traits::{Num, Zero};
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// A 2-D point containing numeric values.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point2<T> {
    /// X-coordinate.
    pub x: T,

    /// Y-coordinate.
    pub y: T,
}

/// 2-D point containing `Float` values.
pub type Point2f = Point2<Float>;

/// 2-D point containing `Int` values.
pub type Point2i = Point2<Int>;

impl Point2f {
    /// Point with largest representable coordinates.
    pub const MAX: Self = Self {
        x: Float::MAX,
        y: Float::MAX,
    };

    /// Point with smallest representable coordinates.
    pub const MIN: Self = Self {
        x: Float::MIN,
        y: Float::MIN,
    };
}

impl<T: Num> Point2<T> {
    /// Creates a new 2-D point.
    ///
    /// * `x` - X-coordinate.
    /// * `y` - Y-coordinate.
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    /// Creates a new 2-D zero point.
    pub fn zero() -> Self
    where
        T: Zero,
    {
        Self::new(T::zero(), T::zero())
    }

    /// Return the component-wise minimum coordinate values with another point.
    ///
    /// * `other` - The other point.
    pub fn min(&self, other: &Self) -> Self
    where
        T: PartialOrd + Copy,
    {
        Self::new(min(self.x, other.x), min(self.y, other.y))
    }

    /// Return the component-wise maximum coordinate values with another point.
    ///
    /// * `other` - The other point.
    pub fn max(&self, other: &Self) -> Self
    where
        T: PartialOrd + Copy,
    {
        Self::new(max(self.x, other.x), max(self.y, other.y))
    }

    /// Returns the distance from the origin.
    pub fn length(&self) -> T
    where
        T: num_traits::Float,
    {
        self.x.hypot(self.y)
    }
}

impl<T: Num> Add for Point2<T> {
    type Output = Self;

    /// Adds the given point and returns the result.
    ///
    /// * `other` - The point to add.
    fn add(self, other: Self) -> Self::Output {
        Self::Output::new(self.x + other.x, self.y + other.y)
    }
}

impl<T: Num> Sub for Point2<T> {
    type Output = Self;

    /// Subtracts the given point and returns the result.
    ///
    /// * `other` - The point to subtract.
    fn sub(self, other: Self) -> Self::Output {
        Self::Output::new(self.x - other.x, self.y - other.y)
    }
}

impl<T: Num + Copy> Mul<T> for Point2<T> {
    type Output = Self;

    /// Scales the point.
    ///
    /// * `f` - The scaling factor.
    fn mul(self, f: T) -> Self::Output {
        Self::Output::new(f * self.x, f * self.y)
    }
}

impl Mul<Point2f> for Float {
    type Output = Point2f;

    /// Scales the point.
    ///
    /// * `p` - The point.
    fn mul(self, p: Point2f) -> Self::Output {
        Self::Output::new(self * p.x, self * p.y)
    }
}

impl<T> fmt::Display for Point2<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    prop_range!(range_f64, f64, -100.0..100.0f64);

    prop_point2!(point2_f64, f64, range_f64(), range_f64());

    #[test]
    fn zero_point() {
        assert!(Point2::zero() == Point2::new(0, 0));
        assert!(Point2::zero() == Point2::new(0.0, 0.0));
    }

    #[test]
    fn length_is_hypotenuse() {
        assert_eq!(Point2::new(3.0, 4.0).length(), 5.0);
    }

    proptest! {
        #[test]
        fn add_then_sub_f64(p1 in point2_f64(), p2 in point2_f64()) {
            let p = (p1 + p2) - p2;
            prop_assert!((p.x - p1.x).abs() < 1e-9);
            prop_assert!((p.y - p1.y).abs() < 1e-9);
        }

        #[test]
        fn mul_commutes_f64(p in point2_f64(), f in range_f64()) {
            prop_assert_eq!(p * f, f * p);
        }

        #[test]
        fn min_max_f64(p1 in point2_f64(), p2 in point2_f64()) {
            let lo = p1.min(&p2);
            let hi = p1.max(&p2);
            prop_assert!(lo.x <= hi.x && lo.y <= hi.y);
        }
    }
}
