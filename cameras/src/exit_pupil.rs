//! Exit Pupil Lookup Table

use crate::{ExitPupilSettings, LensStack};
use indicatif::ProgressBar;
use itertools::iproduct;
use lenscore::geometry::*;
use lenscore::pbrt::*;
use lenscore::rng::RNG;

/// Multiplier applied to the interpolated footprint scale so the circular
/// footprint covers the whole exit pupil.
pub const SAMPLING_ERROR_CORRECTION: Float = 1.5;

/// Circular footprint of the exit pupil seen from a film position, in target
/// disc coordinates of the entry element.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PupilFootprint {
    /// Center of the footprint.
    pub centroid: Point2f,

    /// Largest half-extent of the footprint.
    pub scale: Float,
}

impl PupilFootprint {
    /// Maps a point on the unit disc into the footprint, enlarged by
    /// `SAMPLING_ERROR_CORRECTION`.
    ///
    /// * `lens` - Point on the unit disc.
    pub fn target(&self, lens: &Point2f) -> Point2f {
        *lens * (self.scale * SAMPLING_ERROR_CORRECTION) + self.centroid
    }
}

/// Regular grid of exit pupil bounds over the film plane. Entries are stored
/// row by row with `(grid_x + 1) * (grid_y + 1)` keys spanning
/// `[-extent/2, extent/2]` on both axes.
#[derive(Clone, Debug)]
pub struct ExitPupilLut {
    /// Number of intervals along x and y.
    grid: Point2<usize>,

    /// Film position of the first key.
    p_min: Point2f,

    /// Distance between neighbouring keys.
    spacing: Point2f,

    /// Bounds of accepted targets per key.
    cells: Vec<Bounds2f>,
}

impl ExitPupilLut {
    /// Create a table from precomputed bounds.
    ///
    /// * `grid_x` - Number of intervals along x.
    /// * `grid_y` - Number of intervals along y.
    /// * `extent` - Film extent covered by the table.
    /// * `cells`  - `(grid_x + 1) * (grid_y + 1)` bounds, x varying fastest.
    pub fn from_cells(
        grid_x: usize,
        grid_y: usize,
        extent: Float,
        cells: Vec<Bounds2f>,
    ) -> Result<Self, String> {
        if grid_x == 0 || grid_y == 0 {
            return Err(format!("invalid exit pupil grid {grid_x} x {grid_y}"));
        }
        if cells.len() != (grid_x + 1) * (grid_y + 1) {
            return Err(format!(
                "exit pupil grid {grid_x} x {grid_y} needs {} cells, got {}",
                (grid_x + 1) * (grid_y + 1),
                cells.len()
            ));
        }
        let half = 0.5 * extent;
        Ok(Self {
            grid: Point2::new(grid_x, grid_y),
            p_min: Point2f::new(-half, -half),
            spacing: Point2f::new(extent / grid_x as Float, extent / grid_y as Float),
            cells,
        })
    }

    /// Build the table by tracing random rays from every key towards the
    /// entry element and recording the bounds of the targets that exit the
    /// stack.
    ///
    /// * `stack`    - The calibrated lens stack.
    /// * `settings` - Grid size and number of rays per key.
    /// * `extent`   - Film extent covered by the table.
    pub fn build(stack: &LensStack, settings: &ExitPupilSettings, extent: Float) -> Self {
        let grid_x = max(1, settings.grid_x);
        let grid_y = max(1, settings.grid_y);
        let n_cells = (grid_x + 1) * (grid_y + 1);
        info!(
            "{:<40} {:>12}",
            "Calculating LUT of size",
            format!("{} x {}", grid_x + 1, grid_y + 1)
        );

        let half = 0.5 * extent;
        let spacing = Point2f::new(extent / grid_x as Float, extent / grid_y as Float);
        let aperture = stack.entry_aperture();
        let axial = stack.entry_axial_length();
        let full = Bounds2f::new(
            Point2f::new(-aperture, -aperture),
            Point2f::new(aperture, aperture),
        );

        let progress = ProgressBar::new(n_cells as u64);
        let mut n_empty = 0;
        let mut cells = Vec::with_capacity(n_cells);
        for (j, i) in iproduct!(0..=grid_y, 0..=grid_x) {
            let origin = Point3f::new(
                -half + i as Float * spacing.x,
                -half + j as Float * spacing.y,
                stack.origin_shift(),
            );

            let mut rng = RNG::new((j * (grid_x + 1) + i) as u64);
            let mut bounds = Bounds2f::EMPTY;
            for _ in 0..settings.bounds_samples {
                let target = Point2f::new(
                    rng.uniform_signed() * aperture,
                    rng.uniform_signed() * aperture,
                );
                let d = Vector3f::new(target.x - origin.x, target.y - origin.y, axial);
                if stack.trace_uncounted(&Ray::new(origin, d)).exited().is_some() {
                    bounds = bounds.union(&target);
                }
            }

            if bounds.is_empty() {
                n_empty += 1;
                bounds = full;
            }
            cells.push(bounds);
            progress.inc(1);
        }
        progress.finish_and_clear();

        if n_empty > 0 {
            warn!(
                "{n_empty} of {n_cells} exit pupil positions had no rays leaving the lens; \
                 using the full entry aperture there"
            );
        }

        Self {
            grid: Point2::new(grid_x, grid_y),
            p_min: Point2f::new(-half, -half),
            spacing,
            cells,
        }
    }

    /// Returns the film position of a key.
    ///
    /// * `i` - Index along x.
    /// * `j` - Index along y.
    pub fn key(&self, i: usize, j: usize) -> Point2f {
        Point2f::new(
            self.p_min.x + i as Float * self.spacing.x,
            self.p_min.y + j as Float * self.spacing.y,
        )
    }

    /// Returns the bounds stored at a key.
    ///
    /// * `i` - Index along x.
    /// * `j` - Index along y.
    pub fn cell(&self, i: usize, j: usize) -> &Bounds2f {
        &self.cells[j * (self.grid.x + 1) + i]
    }

    /// Returns the lower key index bracketing a coordinate and the fractional
    /// position towards the next key. Coordinates outside the grid clamp to
    /// the border.
    ///
    /// * `v`       - The coordinate.
    /// * `v_min`   - Coordinate of the first key.
    /// * `spacing` - Distance between keys.
    /// * `n`       - Number of intervals.
    fn bracket(v: Float, v_min: Float, spacing: Float, n: usize) -> (usize, Float) {
        let mut u = clamp((v - v_min) / spacing, 0.0, n as Float);
        let r = u.round();
        if abs(u - r) < 1e-9 {
            u = r;
        }
        let i = min(u.floor() as usize, n - 1);
        (i, u - i as Float)
    }

    /// Returns the footprint at a film position by bilinearly interpolating
    /// the scale and centroid of the four surrounding keys.
    ///
    /// * `p` - Film position.
    pub fn lookup(&self, p: &Point2f) -> PupilFootprint {
        let (i, tx) = Self::bracket(p.x, self.p_min.x, self.spacing.x, self.grid.x);
        let (j, ty) = Self::bracket(p.y, self.p_min.y, self.spacing.y, self.grid.y);

        let b00 = self.cell(i, j);
        let b10 = self.cell(i + 1, j);
        let b01 = self.cell(i, j + 1);
        let b11 = self.cell(i + 1, j + 1);

        PupilFootprint {
            centroid: bilerp(
                tx,
                ty,
                b00.centroid(),
                b10.centroid(),
                b01.centroid(),
                b11.centroid(),
            ),
            scale: bilerp(
                tx,
                ty,
                b00.max_half_extent(),
                b10.max_half_extent(),
                b01.max_half_extent(),
                b11.max_half_extent(),
            ),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_prescription;
    use float_cmp::approx_eq;

    fn square(cx: Float, cy: Float, half: Float) -> Bounds2f {
        Bounds2f::new(
            Point2f::new(cx - half, cy - half),
            Point2f::new(cx + half, cy + half),
        )
    }

    /// 2 x 2 intervals over [-2, 2]; keys at -2, 0, 2.
    fn table() -> ExitPupilLut {
        let mut cells = vec![];
        for j in 0..3 {
            for i in 0..3 {
                cells.push(square(i as Float, -(j as Float), 0.5 + 0.25 * (i + j) as Float));
            }
        }
        ExitPupilLut::from_cells(2, 2, 4.0, cells).unwrap()
    }

    #[test]
    fn invalid_tables() {
        assert!(ExitPupilLut::from_cells(0, 2, 4.0, vec![]).is_err());
        assert!(ExitPupilLut::from_cells(2, 2, 4.0, vec![Bounds2f::EMPTY; 8]).is_err());
    }

    #[test]
    fn keys_are_symmetric() {
        let lut = table();
        assert_eq!(lut.key(0, 0), Point2f::new(-2.0, -2.0));
        assert_eq!(lut.key(1, 1), Point2f::new(0.0, 0.0));
        assert_eq!(lut.key(2, 2), Point2f::new(2.0, 2.0));
    }

    #[test]
    fn exact_at_keys() {
        let lut = table();
        for j in 0..3 {
            for i in 0..3 {
                let f = lut.lookup(&lut.key(i, j));
                let b = lut.cell(i, j);
                assert_eq!(f.centroid, b.centroid());
                assert_eq!(f.scale, b.max_half_extent());
            }
        }
    }

    #[test]
    fn mean_at_midpoint() {
        let lut = table();
        let f = lut.lookup(&Point2f::new(1.0, -1.0));
        let cells = [lut.cell(1, 0), lut.cell(2, 0), lut.cell(1, 1), lut.cell(2, 1)];

        let scale = cells.iter().map(|b| b.max_half_extent()).sum::<Float>() / 4.0;
        let cx = cells.iter().map(|b| b.centroid().x).sum::<Float>() / 4.0;
        let cy = cells.iter().map(|b| b.centroid().y).sum::<Float>() / 4.0;
        assert!(approx_eq!(f64, f.scale, scale, epsilon = 1e-12));
        assert!(approx_eq!(f64, f.centroid.x, cx, epsilon = 1e-12));
        assert!(approx_eq!(f64, f.centroid.y, cy, epsilon = 1e-12));
    }

    #[test]
    fn clamps_outside_grid() {
        let lut = table();
        assert_eq!(
            lut.lookup(&Point2f::new(-10.0, 10.0)),
            lut.lookup(&lut.key(0, 2))
        );
        assert_eq!(
            lut.lookup(&Point2f::new(10.0, -10.0)),
            lut.lookup(&lut.key(2, 0))
        );
    }

    #[test]
    fn target_scales_and_translates() {
        let f = PupilFootprint {
            centroid: Point2f::new(0.5, -0.5),
            scale: 2.0,
        };
        assert_eq!(f.target(&Point2f::zero()), Point2f::new(0.5, -0.5));
        assert_eq!(f.target(&Point2f::new(1.0, 0.0)), Point2f::new(3.5, -0.5));
    }

    #[test]
    fn build_follows_the_pupil() {
        // A stop 2mm behind a weak surface, both in air; film 2mm behind the stop.
        let p = parse_prescription("1000 2 0 20\n0 5 0 20\n", "test").unwrap();
        let mut stack = LensStack::from_prescription(&p).unwrap();
        stack.set_origin_shift(-0.4);

        let settings = ExitPupilSettings {
            grid_x: 2,
            grid_y: 2,
            bounds_samples: 4000,
            film_extent: 0.8,
        };
        let lut = ExitPupilLut::build(&stack, &settings, 0.8);

        let center = lut.lookup(&Point2f::zero());
        assert!(abs(center.centroid.x) < 0.05);
        assert!(abs(center.centroid.y) < 0.05);
        assert!(center.scale > 0.4 && center.scale < 0.55);

        let side = lut.lookup(&Point2f::new(0.4, 0.0));
        assert!(abs(side.centroid.x - 0.2) < 0.05);
        assert!(abs(side.centroid.y) < 0.05);

        // No tracing here touches the counters.
        assert_eq!(stack.counters().total_internal_reflection(), 0);
    }
}
