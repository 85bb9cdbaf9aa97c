//! Lens Stack Trace

use super::LensElement;
use crate::optics::*;
use crate::{LensError, Prescription, RayCounters};
use lenscore::geometry::*;
use lenscore::pbrt::*;

/// Outcome of tracing a ray through the lens stack.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Trace {
    /// The ray left the front element; holds the exiting ray.
    Exited(Ray),

    /// The ray missed a surface or fell outside a clear aperture.
    Vignetted,

    /// The ray was totally internally reflected.
    TotalInternalReflection,
}

impl Trace {
    /// Returns the exiting ray, if any.
    pub fn exited(self) -> Option<Ray> {
        match self {
            Trace::Exited(r) => Some(r),
            _ => None,
        }
    }
}

/// An ordered stack of spherical lens elements from the rearmost (nearest
/// the sensor, index 0) to the frontmost, with exactly one aperture stop.
///
/// The stack is built and calibrated once per configuration and is read-only
/// afterwards. Only the diagnostic counters change while rays are traced.
#[derive(Debug)]
pub struct LensStack {
    /// The elements from rear to front.
    pub(super) elements: Vec<LensElement>,

    /// Index of the aperture stop.
    pub(super) stop_index: usize,

    /// Radius of the opening of the aperture stop.
    pub(super) user_aperture_radius: Float,

    /// Scale applied to reach the requested focal length.
    pub(super) focal_length_ratio: Float,

    /// z-coordinate of the film plane.
    pub(super) origin_shift: Float,

    /// Ray outcome counters.
    counters: RayCounters,
}

impl LensStack {
    /// Builds a lens stack from a parsed prescription. The rows are reversed so
    /// the element nearest the sensor comes first, and the rearmost thickness is
    /// replaced so the front vertex lies at z=0.
    ///
    /// * `prescription` - The parsed prescription in file order.
    pub fn from_prescription(prescription: &Prescription) -> Result<Self, LensError> {
        let mut stop_line: Option<usize> = None;
        for row in prescription.rows.iter().filter(|r| r.curvature == 0.0) {
            if let Some(first) = stop_line {
                return Err(LensError::MultipleApertureStops {
                    first,
                    second: row.line,
                });
            }
            stop_line = Some(row.line);
        }
        if stop_line.is_none() {
            return Err(LensError::MissingApertureStop);
        }

        let mut elements: Vec<LensElement> = prescription
            .rows
            .iter()
            .rev()
            .map(LensElement::from_row)
            .collect();

        let stop_index = elements
            .iter()
            .position(|e| e.is_stop)
            .ok_or(LensError::MissingApertureStop)?;

        let total: Float = elements.iter().map(|e| e.thickness).sum();
        elements[0].thickness -= total;

        let user_aperture_radius = elements[stop_index].semi_aperture;
        let mut stack = Self {
            elements,
            stop_index,
            user_aperture_radius,
            focal_length_ratio: 1.0,
            origin_shift: 0.0,
            counters: RayCounters::new(),
        };
        stack.compute_centers();

        info!("{:<40} {:>12}", "Aperture stop index", stop_index);
        stack.log_elements();
        Ok(stack)
    }

    /// Returns the elements from rear to front.
    pub fn elements(&self) -> &[LensElement] {
        &self.elements
    }

    /// Returns the index of the aperture stop.
    pub fn stop_index(&self) -> usize {
        self.stop_index
    }

    /// Returns the radius of the opening of the aperture stop.
    pub fn user_aperture_radius(&self) -> Float {
        self.user_aperture_radius
    }

    /// Returns the scale applied to reach the requested focal length.
    pub fn focal_length_ratio(&self) -> Float {
        self.focal_length_ratio
    }

    /// Returns the z-coordinate of the film plane.
    pub fn origin_shift(&self) -> Float {
        self.origin_shift
    }

    /// Place the film plane at a given z-coordinate.
    ///
    /// * `z` - The z-coordinate.
    pub fn set_origin_shift(&mut self, z: Float) {
        self.origin_shift = z;
    }

    /// Returns the ray outcome counters.
    pub fn counters(&self) -> &RayCounters {
        &self.counters
    }

    /// Returns the clear diameter of the first element a film ray meets.
    pub fn entry_aperture(&self) -> Float {
        self.elements[0].aperture()
    }

    /// Returns the axial component of a film ray aimed at the entry element.
    pub fn entry_axial_length(&self) -> Float {
        -self.elements[0].thickness
    }

    /// Returns the z-coordinate of an element's vertex.
    ///
    /// * `i` - Element index.
    pub fn vertex_z(&self, i: usize) -> Float {
        self.elements[..=i].iter().map(|e| e.thickness).sum()
    }

    /// Recompute the absolute centers of curvature.
    pub fn compute_centers(&mut self) {
        let mut z = 0.0;
        for e in self.elements.iter_mut() {
            z += e.thickness;
            e.center = z - e.curvature;
        }
    }

    /// Scale every element uniformly and update the derived centers.
    ///
    /// * `ratio` - The scale factor.
    pub fn scale(&mut self, ratio: Float) {
        for e in self.elements.iter_mut() {
            e.scale(ratio);
        }
        self.compute_centers();
    }

    /// Trace a ray from the film out through the front of the stack, counting
    /// total internal reflections.
    ///
    /// * `ray` - Ray leaving the film towards +z.
    pub fn trace(&self, ray: &Ray) -> Trace {
        self.trace_elements(ray, true, Some(&self.counters))
    }

    /// Trace a ray like `trace()` without touching the counters. Used while
    /// building the exit pupil table, so total internal reflection found
    /// there is not counted. The paraxial calibration traces never test for
    /// it at all. The counters only describe rays handed out for rendering.
    ///
    /// * `ray` - Ray leaving the film towards +z.
    pub fn trace_uncounted(&self, ray: &Ray) -> Trace {
        self.trace_elements(ray, true, None)
    }

    /// Trace an idealized ray that is never vignetted or reflected.
    ///
    /// * `ray` - Ray travelling towards +z.
    pub fn trace_paraxial(&self, ray: &Ray) -> Ray {
        match self.trace_elements(ray, false, None) {
            Trace::Exited(r) => r,
            _ => *ray,
        }
    }

    /// Trace through every element in order.
    ///
    /// * `ray`      - The ray.
    /// * `enforce`  - Enforce intersections, clear apertures and total
    ///                internal reflection.
    /// * `counters` - Counters to record total internal reflection in.
    fn trace_elements(&self, ray: &Ray, enforce: bool, counters: Option<&RayCounters>) -> Trace {
        let mut ray = *ray;
        let last = self.elements.len() - 1;

        for (i, e) in self.elements.iter().enumerate() {
            let center = Point3f::new(0.0, 0.0, e.center);
            let hit = match intersect_sphere(&ray, &center, e.curvature, false, enforce) {
                Some(hit) => hit,
                None => return Trace::Vignetted,
            };

            if enforce {
                let r2 = hit.radial_squared();
                if r2 > e.semi_aperture * e.semi_aperture
                    || (i == self.stop_index
                        && r2 > self.user_aperture_radius * self.user_aperture_radius)
                {
                    return Trace::Vignetted;
                }
            }

            let normal = surface_normal(&hit, &center, e.curvature);
            let ior2 = if i < last { self.elements[i + 1].ior } else { 1.0 };
            match refract(e.ior, ior2, &ray.d, &normal, enforce) {
                Refraction::Transmitted(d) => ray = Ray::new(hit, d),
                Refraction::TotalInternalReflection => {
                    if let Some(c) = counters {
                        c.add_total_internal_reflection();
                    }
                    return Trace::TotalInternalReflection;
                }
            }
        }

        Trace::Exited(ray)
    }

    /// Log the elements as a table.
    pub fn log_elements(&self) {
        info!(
            "{:>4} {:>14} {:>12} {:>10} {:>10} {:>12}",
            "#", "Curvature", "Thickness", "IOR", "Abbe", "Semi-ap."
        );
        for (i, e) in self.elements.iter().enumerate() {
            info!("{:>4} {}", i, e);
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
