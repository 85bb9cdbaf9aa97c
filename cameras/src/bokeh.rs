//! Bokeh Image Sampler

use crate::LensError;
use lenscore::geometry::*;
use lenscore::image_io::{read_image, FloatImage};
use lenscore::pbrt::*;
use std::cmp::Ordering;

/// Returns the luminance of a pixel. With fewer than 3 channels the missing
/// ones are taken from the last available channel.
///
/// * `px` - Channel values of the pixel.
pub fn luminance(px: &[Float]) -> Float {
    if px.is_empty() {
        return 0.0;
    }
    let o1 = if px.len() >= 2 { 1 } else { 0 };
    let o2 = if px.len() >= 3 { 2 } else { o1 };
    0.3 * px[0] + 0.59 * px[o1] + 0.11 * px[o2]
}

/// Returns the indices of `values` ordered by descending value. Equal values
/// keep their original order.
///
/// * `values` - The values.
fn descending_order(values: &[Float]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| {
        values[b]
            .partial_cmp(&values[a])
            .unwrap_or(Ordering::Equal)
    });
    indices
}

/// Returns the index of the first entry of a non-decreasing `cdf` that is not
/// below `u`, clamped to the last entry.
///
/// * `cdf` - The cumulative distribution.
/// * `u`   - The sample value.
fn find_interval(cdf: &[Float], u: Float) -> usize {
    let i = partition_point(cdf.len(), |i| cdf[i] < u);
    min(i, cdf.len() - 1)
}

/// Piecewise-constant 2D distribution over an image's luminance. Rows are
/// ranked by their total luminance and, within each row, columns by their
/// share of the row.
#[derive(Clone, Debug)]
pub struct BokehSampler {
    /// Image width and height.
    resolution: Point2<usize>,

    /// Whether the image could be turned into a distribution.
    valid: bool,

    /// Image rows by descending luminance.
    row_indices: Vec<usize>,

    /// Cumulative luminance over `row_indices`.
    row_cdf: Vec<Float>,

    /// Per image row, the columns by descending luminance.
    column_indices: Vec<usize>,

    /// Per image row, the cumulative share of the row over `column_indices`.
    column_cdf: Vec<Float>,
}

impl BokehSampler {
    /// Load an image and build its distribution.
    ///
    /// * `path` - Path to the image.
    pub fn from_file(path: &str) -> Result<Self, LensError> {
        if path.is_empty() {
            return Err(LensError::EmptyPath("bokeh image"));
        }
        let image = read_image(path).map_err(|reason| LensError::Image {
            path: path.to_string(),
            reason,
        })?;
        info!("{:<40} {:>12}", "Image Width", image.width());
        info!("{:<40} {:>12}", "Image Height", image.height());
        info!("{:<40} {:>12}", "Image Channels", image.n_channels);
        Self::new(&image)
    }

    /// Checks that an image has pixels and red, green and blue channels.
    ///
    /// * `image` - The image.
    pub fn validate(image: &FloatImage) -> Result<(), LensError> {
        let (w, h, n) = (image.width(), image.height(), image.n_channels);
        if w * h * n == 0 || n < 3 {
            Err(LensError::InvalidImage {
                width: w,
                height: h,
                channels: n,
            })
        } else {
            Ok(())
        }
    }

    /// Build the distribution for an image. An image without pixels or with
    /// fewer than 3 channels yields a sampler that only returns the origin.
    /// An image whose luminance sums to zero is an error.
    ///
    /// * `image` - The image.
    pub fn new(image: &FloatImage) -> Result<Self, LensError> {
        let (w, h) = (image.width(), image.height());
        if let Err(err) = Self::validate(image) {
            warn!("Invalid bokeh image data: {err}");
            return Ok(Self {
                resolution: Point2::new(w, h),
                valid: false,
                row_indices: vec![],
                row_cdf: vec![],
                column_indices: vec![],
                column_cdf: vec![],
            });
        }

        let n = image.n_channels;
        let mut lum: Vec<Float> = image.pixels.chunks_exact(n).map(luminance).collect();
        let total: Float = lum.iter().sum();
        if !(total > 0.0 && total.is_finite()) {
            return Err(LensError::ZeroLuminance);
        }
        let inv_total = 1.0 / total;
        lum.iter_mut().for_each(|v| *v *= inv_total);

        let row_sums: Vec<Float> = lum.chunks_exact(w).map(|row| row.iter().sum()).collect();
        let row_indices = descending_order(&row_sums);
        let row_cdf: Vec<Float> = row_indices
            .iter()
            .scan(0.0, |acc, &r| {
                *acc += row_sums[r];
                Some(*acc)
            })
            .collect();

        let mut column_indices = Vec::with_capacity(w * h);
        let mut column_cdf = Vec::with_capacity(w * h);
        for (r, row) in lum.chunks_exact(w).enumerate() {
            let sum = row_sums[r];
            let share: Vec<Float> = row
                .iter()
                .map(|&v| if v != 0.0 && sum != 0.0 { v / sum } else { 0.0 })
                .collect();

            let order = descending_order(&share);
            let mut acc = 0.0;
            for &c in order.iter() {
                acc += share[c];
                column_cdf.push(acc);
            }
            column_indices.extend(order);
        }

        Ok(Self {
            resolution: Point2::new(w, h),
            valid: true,
            row_indices,
            row_cdf,
            column_indices,
            column_cdf,
        })
    }

    /// Returns true if the sampler has a distribution.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Returns the cumulative distribution over rows in rank order.
    pub fn row_cdf(&self) -> &[Float] {
        &self.row_cdf
    }

    /// Returns the cumulative distribution over the columns of an image row
    /// in rank order.
    ///
    /// * `row` - The image row.
    pub fn column_cdf(&self, row: usize) -> &[Float] {
        let w = self.resolution.x;
        &self.column_cdf[row * w..(row + 1) * w]
    }

    /// Returns the image pixel (column, row) selected by two uniform values.
    ///
    /// * `u` - Uniform values; `x` selects the row and `y` the column.
    pub fn sample_pixel(&self, u: &Point2f) -> Option<(usize, usize)> {
        if !self.valid {
            return None;
        }
        let w = self.resolution.x;
        let row = self.row_indices[find_interval(&self.row_cdf, u.x)];
        let rank = find_interval(self.column_cdf(row), u.y);
        Some((self.column_indices[row * w + rank], row))
    }

    /// Returns a lens position for two uniform values. The image center maps
    /// to the origin, the top of the image to positive y and the image extent
    /// to [-1, 1].
    ///
    /// * `u` - Uniform values.
    pub fn sample(&self, u: &Point2f) -> Point2f {
        match self.sample_pixel(u) {
            Some((col, row)) => {
                let (w, h) = (self.resolution.x, self.resolution.y);
                let col = col as Float - ((w - 1) / 2) as Float;
                let row = row as Float - ((h - 1) / 2) as Float;
                Point2f::new(col / w as Float * 2.0, -row / h as Float * 2.0)
            }
            None => {
                warn!("Invalid bokeh image data.");
                Point2f::zero()
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    /// Gray RGB image from luminance values, rows top to bottom.
    fn gray(width: usize, height: usize, values: &[Float]) -> FloatImage {
        let pixels = values.iter().flat_map(|&v| [v, v, v]).collect();
        FloatImage::new(pixels, width, height, 3).unwrap()
    }

    #[test]
    fn luminance_weights() {
        assert!(approx_eq!(f64, luminance(&[1.0, 0.0, 0.0]), 0.3, ulps = 2));
        assert!(approx_eq!(f64, luminance(&[0.0, 1.0, 0.0, 5.0]), 0.59, ulps = 2));
        assert!(approx_eq!(f64, luminance(&[2.0]), 2.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, luminance(&[1.0, 2.0]), 1.7, epsilon = 1e-12));
        assert_eq!(luminance(&[]), 0.0);
    }

    #[test]
    fn columns_ranked_by_brightness() {
        let s = BokehSampler::new(&gray(3, 1, &[1.0, 2.0, 1.0])).unwrap();
        assert_eq!(s.row_cdf(), &[1.0]);
        assert_eq!(s.column_cdf(0), &[0.5, 0.75, 1.0]);

        assert_eq!(s.sample_pixel(&Point2f::new(0.5, 0.3)), Some((1, 0)));
        assert_eq!(s.sample_pixel(&Point2f::new(0.5, 0.6)), Some((0, 0)));
        assert_eq!(s.sample_pixel(&Point2f::new(0.5, 0.9)), Some((2, 0)));

        let p = s.sample(&Point2f::new(0.5, 0.6));
        assert!(approx_eq!(f64, p.x, -2.0 / 3.0, ulps = 2));
        assert_eq!(p.y, 0.0);
    }

    #[test]
    fn bottom_of_image_is_negative_y() {
        let s = BokehSampler::new(&gray(1, 3, &[0.0, 0.0, 1.0])).unwrap();
        let p = s.sample(&Point2f::new(0.5, 0.5));
        assert_eq!(p.x, 0.0);
        assert!(approx_eq!(f64, p.y, -2.0 / 3.0, ulps = 2));
    }

    #[test]
    fn single_bright_pixel_maps_to_origin() {
        let mut values = vec![0.0; 9];
        values[4] = 1.0;
        let s = BokehSampler::new(&gray(3, 3, &values)).unwrap();
        for u in [0.0, 0.25, 0.999, 1.0] {
            assert_eq!(s.sample(&Point2f::new(u, u)), Point2f::zero());
        }
    }

    #[test]
    fn first_rank_at_zero_last_rank_beyond_one() {
        // Both rows sum to 0.5; ties keep image order.
        let s = BokehSampler::new(&gray(2, 2, &[3.0, 1.0, 2.0, 2.0])).unwrap();
        assert_eq!(s.row_cdf(), &[0.5, 1.0]);
        assert_eq!(s.sample_pixel(&Point2f::new(0.0, 0.0)), Some((0, 0)));
        assert_eq!(s.sample_pixel(&Point2f::new(1.5, 1.5)), Some((1, 1)));
        assert_eq!(s.sample_pixel(&Point2f::new(1.0, 1.0)), Some((1, 1)));
    }

    #[test]
    fn zero_luminance_is_rejected() {
        assert!(matches!(
            BokehSampler::new(&gray(2, 2, &[0.0; 4])),
            Err(LensError::ZeroLuminance)
        ));
    }

    #[test]
    fn invalid_image_samples_origin() {
        let image = FloatImage::new(vec![1.0; 4], 2, 2, 1).unwrap();
        assert!(BokehSampler::validate(&image).is_err());

        let s = BokehSampler::new(&image).unwrap();
        assert!(!s.is_valid());
        assert_eq!(s.sample(&Point2f::new(0.3, 0.7)), Point2f::zero());

        let empty = FloatImage::new(vec![], 0, 4, 3).unwrap();
        assert!(!BokehSampler::new(&empty).unwrap().is_valid());
    }

    #[test]
    fn missing_path() {
        assert!(matches!(
            BokehSampler::from_file(""),
            Err(LensError::EmptyPath(_))
        ));
        assert!(matches!(
            BokehSampler::from_file("/nonexistent/bokeh.png"),
            Err(LensError::Image { .. })
        ));
    }

    prop_compose! {
        fn image_strategy()(w in 1usize..6, h in 1usize..6)
            (values in proptest::collection::vec(0.0..1.0f64, w * h), w in Just(w), h in Just(h))
            -> FloatImage {
            let mut values = values;
            values[0] += 0.01;
            gray(w, h, &values)
        }
    }

    proptest! {
        #[test]
        fn cdfs_are_monotone(image in image_strategy()) {
            let s = BokehSampler::new(&image).unwrap();
            let rows = s.row_cdf();
            prop_assert!(rows.windows(2).all(|p| p[0] <= p[1]));
            prop_assert!(approx_eq!(f64, rows[rows.len() - 1], 1.0, epsilon = 1e-9));

            for r in 0..image.height() {
                let cols = s.column_cdf(r);
                prop_assert!(cols.windows(2).all(|p| p[0] <= p[1]));
                let last = cols[cols.len() - 1];
                prop_assert!(last == 0.0 || approx_eq!(f64, last, 1.0, epsilon = 1e-9));
            }
        }

        #[test]
        fn samples_stay_inside(image in image_strategy(), u in 0.0..=1.0f64, v in 0.0..=1.0f64) {
            let s = BokehSampler::new(&image).unwrap();
            let p = s.sample(&Point2f::new(u, v));
            prop_assert!(p.x.is_finite() && p.y.is_finite());
            prop_assert!(abs(p.x) <= 1.0 && abs(p.y) <= 1.0);
        }
    }
}
