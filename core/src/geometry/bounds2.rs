//! 2D Axis Aligned Bounding Boxes.

use super::Point2f;
use crate::pbrt::*;
use std::fmt;

/// 2D Axis Aligned Bounding Box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds2f {
    /// Minimum bounds.
    pub p_min: Point2f,

    /// Maximum bounds.
    pub p_max: Point2f,
}

impl Bounds2f {
    /// 2-D bounding box where minimum and maximum bounds are maximum and minimum
    /// floating point values. This is so we can easily grow the bounding box
    /// from nothing iteratively.
    pub const EMPTY: Self = Self {
        p_min: Point2f::MAX,
        p_max: Point2f::MIN,
    };

    /// Creates a new 2D bounding box from 2 points. The minimum and maximum bounds
    /// are used for each coordinate axis.
    ///
    /// * `p1` - First point.
    /// * `p2` - Second point.
    pub fn new(p1: Point2f, p2: Point2f) -> Self {
        Self {
            p_min: p1.min(&p2),
            p_max: p1.max(&p2),
        }
    }

    /// Returns true if the bounding box has not been grown to include any point.
    pub fn is_empty(&self) -> bool {
        self.p_max.x < self.p_min.x || self.p_max.y < self.p_min.y
    }

    /// Returns the bounding box grown to include a point.
    ///
    /// * `p` - The point.
    pub fn union(&self, p: &Point2f) -> Self {
        Self {
            p_min: self.p_min.min(p),
            p_max: self.p_max.max(p),
        }
    }

    /// Returns the midpoint of the bounding box.
    pub fn centroid(&self) -> Point2f {
        0.5 * (self.p_min + self.p_max)
    }

    /// Returns the larger of the half-widths along x and y.
    pub fn max_half_extent(&self) -> Float {
        let c = self.centroid();
        max(self.p_max.x - c.x, self.p_max.y - c.y)
    }
}

impl Default for Bounds2f {
    /// Returns the empty bounding box.
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for Bounds2f {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ {} - {} ]", self.p_min, self.p_max)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::super::Point2;
    use super::*;
    use proptest::prelude::*;

    prop_range!(range_f64, f64, -100.0..100.0f64);

    prop_point2!(point2_f64, f64, range_f64(), range_f64());

    #[test]
    fn empty_bounds() {
        assert!(Bounds2f::EMPTY.is_empty());
        assert!(!Bounds2f::EMPTY.union(&Point2f::new(1.0, 1.0)).is_empty());
    }

    #[test]
    fn centroid_and_half_extent() {
        let b = Bounds2f::new(Point2f::new(-1.0, 0.0), Point2f::new(3.0, 1.0));
        assert_eq!(b.centroid(), Point2f::new(1.0, 0.5));
        assert_eq!(b.max_half_extent(), 2.0);
    }

    proptest! {
        #[test]
        fn union_contains_points(p1 in point2_f64(), p2 in point2_f64()) {
            let b = Bounds2f::EMPTY.union(&p1).union(&p2);
            prop_assert_eq!(b, Bounds2f::new(p1, p2));
        }
    }
}
