//! Rays

use super::{Point3f, Vector3f};
use crate::pbrt::*;
use std::fmt;

/// A ray with an origin and a direction.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Ray {
    /// Origin.
    pub o: Point3f,

    /// Direction.
    pub d: Vector3f,
}

impl Ray {
    /// Returns a new ray.
    ///
    /// * `o` - Origin.
    /// * `d` - Direction.
    pub fn new(o: Point3f, d: Vector3f) -> Self {
        Self { o, d }
    }

    /// Returns the position along the ray at a given parameter.
    ///
    /// * `t` - The parameter.
    pub fn at(&self, t: Float) -> Point3f {
        self.o + self.d * t
    }

    /// Returns the z-coordinate where the ray crosses the optical axis in the
    /// y-z plane, or `None` if it runs parallel to the axis.
    pub fn axis_crossing_z(&self) -> Option<Float> {
        if self.d.y == 0.0 {
            None
        } else {
            let t = -self.o.y / self.d.y;
            Some(self.o.z + t * self.d.z)
        }
    }
}

impl fmt::Display for Ray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[o={}, d={}]", self.o, self.d)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
