//! Lens Calibration

use super::LensStack;
use crate::optics::*;
use crate::{require_positive, LensError};
use lenscore::geometry::*;
use lenscore::pbrt::*;

/// Fraction of the entry element's semi-aperture used as the height of the
/// paraxial ray.
const PARAXIAL_HEIGHT: Float = 0.2;

/// Fraction of the front element's semi-aperture used as the slope of the ray
/// traced back from the object.
const OBJECT_RAY_SLOPE: Float = 0.05;

/// Axial positions measured with a paraxial ray.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CardinalPoints {
    /// z-coordinate of the principal plane.
    pub principal_plane_z: Float,

    /// z-coordinate of the focal point.
    pub focal_point_z: Float,
}

impl CardinalPoints {
    /// Returns the distance from the principal plane to the focal point.
    pub fn focal_length(&self) -> Float {
        self.focal_point_z - self.principal_plane_z
    }
}

/// Summary of a calibration pass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CalibrationReport {
    /// Focal length of the lens stack as loaded.
    pub traced_focal_length: Float,

    /// Scale applied to every element.
    pub focal_length_ratio: Float,

    /// Focal length measured after scaling.
    pub calibrated_focal_length: Float,

    /// Radius of the opening of the aperture stop.
    pub user_aperture_radius: Float,

    /// True when the requested f-number exceeded the physical stop.
    pub aperture_clamped: bool,

    /// z-coordinate of the film plane that focuses the focus distance.
    pub image_distance: Float,

    /// Axial distance from the rear vertex to the aperture stop.
    pub aperture_distance: Float,
}

impl LensStack {
    /// Trace a ray parallel to the axis from the film side and measure where
    /// the exiting ray crosses the axis and where it meets the extension of
    /// the incoming ray. Intersections are never enforced.
    pub fn cardinal_points(&self) -> Option<CardinalPoints> {
        let h = PARAXIAL_HEIGHT * self.elements[0].semi_aperture;
        let start = Ray::new(
            Point3f::new(0.0, h, self.vertex_z(0) - 1.0),
            Vector3f::new(0.0, 0.0, 1.0),
        );
        let exit = self.trace_paraxial(&start);

        let principal_plane_z =
            line_intersection_z(&start.o, &start.at(1.0), &exit.o, &exit.at(1.0))?;
        let focal_point_z = exit.axis_crossing_z()?;

        Some(CardinalPoints {
            principal_plane_z,
            focal_point_z,
        })
    }

    /// Returns the focal length measured with a paraxial ray.
    pub fn traced_focal_length(&self) -> Result<Float, LensError> {
        let points = self
            .cardinal_points()
            .ok_or(LensError::Unmeasurable("focal length"))?;
        debug!(
            "{:<40} {:>12.8}",
            "Principal plane distance [cm]", points.principal_plane_z
        );
        debug!(
            "{:<40} {:>12.8}",
            "Focal point distance [cm]", points.focal_point_z
        );

        let f = points.focal_length();
        if f.is_finite() && f > 0.0 {
            Ok(f)
        } else {
            Err(LensError::Unmeasurable("focal length"))
        }
    }

    /// Trace a ray from a point on the axis at a given distance in front of
    /// the lens back through the stack and return the z-coordinate where it
    /// crosses the axis behind the rear element.
    ///
    /// * `object_distance` - Distance of the object from the front vertex.
    pub fn image_distance(&self, object_distance: Float) -> Result<Float, LensError> {
        let n = self.elements.len();
        let slope = self.elements[n - 1].semi_aperture * OBJECT_RAY_SLOPE;
        let mut ray = Ray::new(
            Point3f::new(0.0, 0.0, object_distance),
            Vector3f::new(0.0, slope, -object_distance),
        );

        for k in (0..n).rev() {
            let e = &self.elements[k];
            let center = Point3f::new(0.0, 0.0, e.center);
            let hit = intersect_sphere(&ray, &center, e.curvature, true, false)
                .ok_or(LensError::Unmeasurable("image distance"))?;
            let normal = surface_normal(&hit, &center, -e.curvature);

            let ior1 = if k == n - 1 { 1.0 } else { self.elements[k + 1].ior };
            ray = match refract(ior1, e.ior, &ray.d, &normal, false) {
                Refraction::Transmitted(d) => Ray::new(hit, d),
                Refraction::TotalInternalReflection => {
                    return Err(LensError::Unmeasurable("image distance"))
                }
            };
        }

        match ray.axis_crossing_z() {
            Some(z) if z.is_finite() => Ok(z),
            _ => Err(LensError::Unmeasurable("image distance")),
        }
    }

    /// Returns the axial distance from the rear vertex to the aperture stop.
    pub fn aperture_distance(&self) -> Float {
        self.vertex_z(self.stop_index) - self.vertex_z(0)
    }

    /// Scale the stack to a requested focal length, open the aperture stop for
    /// the requested f-number and place the film plane so that the focus
    /// distance is sharp.
    ///
    /// * `focal_length`   - Requested focal length.
    /// * `f_stop`         - Requested f-number.
    /// * `focus_distance` - Distance of the plane in focus.
    pub fn calibrate(
        &mut self,
        focal_length: Float,
        f_stop: Float,
        focus_distance: Float,
    ) -> Result<CalibrationReport, LensError> {
        require_positive("focal length", focal_length)?;
        require_positive("f-stop", f_stop)?;
        require_positive("focus distance", focus_distance)?;

        let traced_focal_length = self.traced_focal_length()?;
        info!(
            "{:<40} {:>12.8}",
            "Raytraced focal length [cm]", traced_focal_length
        );

        let ratio = focal_length / traced_focal_length;
        info!("{:<40} {:>12.8}", "Focal length ratio", ratio);
        self.scale(ratio);
        self.focal_length_ratio = ratio;

        let calibrated_focal_length = self.traced_focal_length()?;
        info!(
            "{:<40} {:>12.8}",
            "Adj. raytraced focal length [cm]", calibrated_focal_length
        );

        let mut radius = calibrated_focal_length / (2.0 * f_stop);
        let max_radius = self.elements[self.stop_index].semi_aperture;
        let aperture_clamped = radius > max_radius;
        if aperture_clamped {
            warn!("Given f-stop is wider than the maximum aperture of the lens data.");
            warn!("Clamping aperture radius from [{radius:.9}] to [{max_radius:.9}]");
            radius = max_radius;
        }
        self.user_aperture_radius = radius;
        info!("{:<40} {:>12.8}", "User aperture radius [cm]", radius);

        let image_distance = self.image_distance(focus_distance)?;
        self.origin_shift = image_distance;
        info!("{:<40} {:>12.8}", "Object distance [cm]", focus_distance);
        info!("{:<40} {:>12.8}", "Image distance [cm]", image_distance);

        let aperture_distance = self.aperture_distance();
        info!(
            "{:<40} {:>12.8}",
            "Aperture distance [cm]", aperture_distance
        );

        Ok(CalibrationReport {
            traced_focal_length,
            focal_length_ratio: ratio,
            calibrated_focal_length,
            user_aperture_radius: radius,
            aperture_clamped,
            image_distance,
            aperture_distance,
        })
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
