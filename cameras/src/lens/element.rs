//! Lens Elements

use crate::PrescriptionRow;
use lenscore::pbrt::*;
use std::fmt;

/// Curvature substituted for the flat aperture stop, in prescription units.
pub const APERTURE_STOP_CURVATURE: Float = 99999.0;

/// Prescriptions are given in millimeters; the lens stack works in
/// centimeters.
pub const PRESCRIPTION_UNIT_SCALE: Float = 0.1;

/// A spherical refracting surface of a lens stack.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LensElement {
    /// Signed radius of curvature. Positive when the center of curvature lies
    /// on the sensor side of the vertex.
    pub curvature: Float,

    /// Axial distance to the neighbouring surface. The rearmost element holds
    /// the negated length of the assembly so the front vertex sits at z=0.
    pub thickness: Float,

    /// Index of refraction of the medium on the sensor side of the surface.
    pub ior: Float,

    /// Abbe number, if the prescription provided one.
    pub abbe: Option<Float>,

    /// Clear radius of the surface.
    pub semi_aperture: Float,

    /// True for the aperture stop.
    pub is_stop: bool,

    /// Absolute z-coordinate of the center of curvature.
    pub center: Float,
}

impl LensElement {
    /// Converts a prescription row into a lens element in stack units. The
    /// aperture stop receives a flat placeholder curvature and an index of
    /// refraction of 0 becomes air.
    ///
    /// * `row` - The prescription row.
    pub fn from_row(row: &PrescriptionRow) -> Self {
        let is_stop = row.curvature == 0.0;
        let curvature = if is_stop {
            info!(
                "Line {}: aperture stop curvature set to {}",
                row.line, APERTURE_STOP_CURVATURE
            );
            APERTURE_STOP_CURVATURE
        } else {
            row.curvature
        };

        let ior = if row.ior == 0.0 {
            debug!("Line {}: index of refraction 0 set to 1", row.line);
            1.0
        } else {
            row.ior
        };

        Self {
            curvature: curvature * PRESCRIPTION_UNIT_SCALE,
            thickness: row.thickness * PRESCRIPTION_UNIT_SCALE,
            ior,
            abbe: row.abbe,
            semi_aperture: 0.5 * row.aperture * PRESCRIPTION_UNIT_SCALE,
            is_stop,
            center: 0.0,
        }
    }

    /// Returns the clear diameter of the surface.
    pub fn aperture(&self) -> Float {
        2.0 * self.semi_aperture
    }

    /// Scale the dimensions of the element.
    ///
    /// * `ratio` - The scale factor.
    pub fn scale(&mut self, ratio: Float) {
        self.curvature *= ratio;
        self.thickness *= ratio;
        self.semi_aperture *= ratio;
    }
}

impl fmt::Display for LensElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abbe = self.abbe.map_or(String::from("-"), |a| format!("{a:.4}"));
        write!(
            f,
            "{:>14.6} {:>12.6} {:>10.6} {:>10} {:>12.6}{}",
            self.curvature,
            self.thickness,
            self.ior,
            abbe,
            self.semi_aperture,
            if self.is_stop { "  (stop)" } else { "" }
        )
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
