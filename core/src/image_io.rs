//! Image I/O

use crate::geometry::*;
use crate::pbrt::*;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use exr::prelude as exrs;
use exr::prelude::*;
use regex::Regex;
use std::fs::File;
use std::io::BufReader;
use std::result::Result;
use std::sync::OnceLock;

/// Stores floating point image data with an arbitrary number of interleaved
/// channels. Rows are stored top to bottom.
#[derive(Clone, Debug, Default)]
pub struct FloatImage {
    /// The channel values, `n_channels` per pixel.
    pub pixels: Vec<Float>,

    /// Image resolution.
    pub resolution: Point2<usize>,

    /// Number of channels per pixel.
    pub n_channels: usize,
}

impl FloatImage {
    /// Creates a new `FloatImage` from pixel data.
    ///
    /// * `pixels`     - Interleaved channel data.
    /// * `width`      - Width of image.
    /// * `height`     - Height of image.
    /// * `n_channels` - Number of channels per pixel.
    pub fn new(
        pixels: Vec<Float>,
        width: usize,
        height: usize,
        n_channels: usize,
    ) -> Result<Self, String> {
        if pixels.len() != width * height * n_channels {
            return Err(format!(
                "Image data has {} values, expected {width} x {height} x {n_channels}",
                pixels.len()
            ));
        }
        Ok(Self {
            pixels,
            resolution: Point2::new(width, height),
            n_channels,
        })
    }

    /// Returns the image width.
    pub fn width(&self) -> usize {
        self.resolution.x
    }

    /// Returns the image height.
    pub fn height(&self) -> usize {
        self.resolution.y
    }

    /// Returns a channel value.
    ///
    /// * `x` - Column.
    /// * `y` - Row.
    /// * `c` - Channel.
    #[inline]
    pub fn channel(&self, x: usize, y: usize, c: usize) -> Float {
        self.pixels[(y * self.resolution.x + x) * self.n_channels + c]
    }
}

/// Read an image.
///
/// * `path` - Input file path.
pub fn read_image(path: &str) -> Result<FloatImage, String> {
    match get_extension_from_filename(path) {
        Some(".exr") => read_exr(path),
        Some(".pfm") => read_pfm(path),
        Some(_extension) => read_8_bit(path),
        None => Err(format!(
            "Can't determine file type from suffix of filename {path}."
        )),
    }
}

/// Read a single layer OpenEXR file. Alpha is kept as a fourth channel.
///
/// * `path` - Input file path.
fn read_exr(path: &str) -> Result<FloatImage, String> {
    let reader = exrs::read()
        .no_deep_data()
        .largest_resolution_level()
        .rgba_channels(
            |resolution, _channels| {
                let width = resolution.width();
                let height = resolution.height();
                FloatImage {
                    pixels: vec![0.0; width * height * 4],
                    resolution: Point2::new(width, height),
                    n_channels: 4,
                }
            },
            |img, position, (r, g, b, a): (f32, f32, f32, f32)| {
                let offset = 4 * (position.y() * img.resolution.x + position.x());
                img.pixels[offset] = r as Float;
                img.pixels[offset + 1] = g as Float;
                img.pixels[offset + 2] = b as Float;
                img.pixels[offset + 3] = a as Float;
            },
        )
        .first_valid_layer()
        .all_attributes();

    match reader.from_file(path) {
        Ok(image) => {
            let pixels = image.layer_data.channel_data.pixels;
            info!(
                "Read EXR image {path} ({} x {})",
                pixels.resolution.x, pixels.resolution.y,
            );
            Ok(pixels)
        }
        Err(err) => Err(err.to_string()),
    }
}

/// Returns true if the character is a space, newline or tab.
///
/// * `c` - The character to check.
#[inline(always)]
fn is_white_space(c: char) -> bool {
    c == ' ' || c == '\n' || c == '\t' || c == '\r'
}

// Reads a whitespace terminated word of at most `len` bytes.
//
// * `reader` - Source to read.
// * `len`    - Maximum number of bytes to read.
fn read_pfm_word<R: ReadBytesExt>(reader: &mut R, len: usize) -> Result<String, String> {
    let mut s = String::new();

    let mut c = reader
        .read_u8()
        .map_err(|e| format!("read_pfm_word(): {e}"))?;
    while !is_white_space(c as char) {
        if s.len() == len {
            return Err("read_pfm_word(): filled buffer before finding whitespace.".to_string());
        }
        s.push(c as char);
        c = reader
            .read_u8()
            .map_err(|e| format!("read_pfm_word(): {e}"))?;
    }

    Ok(s)
}

/// Read a PFM (Portable FloatMap) file.
///
/// * `path` - Input file path.
fn read_pfm(path: &str) -> Result<FloatImage, String> {
    let file = File::open(path)
        .map_err(|e| format!("read_pfm(): Error reading PFM file '{path}': {e}"))?;
    let mut reader = BufReader::new(file);

    // Read either "Pf" or "PF".
    let ty = read_pfm_word(&mut reader, 2)?;
    let n_channels = match ty.as_str() {
        "Pf" => Ok(1),
        "PF" => Ok(3),
        s => Err(format!("read_pfm(): Invalid PFM type '{s}'")),
    }?;

    let width = read_pfm_word(&mut reader, 80)?
        .parse::<usize>()
        .map_err(|e| format!("Error parsing PFM width: {e}"))?;
    let height = read_pfm_word(&mut reader, 80)?
        .parse::<usize>()
        .map_err(|e| format!("Error parsing PFM height: {e}"))?;

    // The sign of the scale encodes endianness.
    let scale = read_pfm_word(&mut reader, 80)?
        .parse::<f32>()
        .map_err(|e| format!("Error parsing PFM scale: {e}"))?;
    let file_little_endian = scale < 0.0;
    let scale = scale.abs();

    // Rows are stored bottom to top.
    let row_len = width
        .checked_mul(n_channels)
        .ok_or_else(|| format!("read_pfm(): PFM width {width} is too large"))?;
    let len = row_len
        .checked_mul(height)
        .ok_or_else(|| format!("read_pfm(): PFM size {width} x {height} is too large"))?;
    let mut data = vec![0.0; len];
    for y in (0..height).rev() {
        for j in 0..row_len {
            let f = if file_little_endian {
                reader.read_f32::<LittleEndian>()
            } else {
                reader.read_f32::<BigEndian>()
            }
            .map_err(|e| format!("Error reading PFM pixel data y={y}, j={j}: {e}"))?;
            data[y * row_len + j] = (f * scale) as Float;
        }
    }

    info!("Read PFM image {path} ({width} x {height} x {n_channels})");

    FloatImage::new(data, width, height, n_channels)
}

/// Read an 8-bit image format keeping the file's channel layout.
///
/// * `path` - Input file path.
fn read_8_bit(path: &str) -> Result<FloatImage, String> {
    let img = image::open(path).map_err(|err| format!("{err}"))?;

    let width = img.width() as usize;
    let height = img.height() as usize;
    let n_channels = img.color().channel_count() as usize;

    let bytes = match n_channels {
        1 => img.into_luma8().into_raw(),
        2 => img.into_luma_alpha8().into_raw(),
        3 => img.into_rgb8().into_raw(),
        _ => img.into_rgba8().into_raw(),
    };
    let n_channels = bytes.len() / max(1, width * height);
    let pixels: Vec<Float> = bytes.iter().map(|&b| b as Float / 255.0).collect();

    info!("Read 8-bit image {path} ({width} x {height} x {n_channels})");

    FloatImage::new(pixels, width, height, n_channels)
}

/// Returns regular expression for extracting the file extension. This will match the last occurrence of a period
/// followed by no periods or slashes.
fn regex_file_ext() -> &'static Regex {
    static DATA: OnceLock<Regex> = OnceLock::new();
    DATA.get_or_init(|| Regex::new(r"(\.[^./\\]+)$").unwrap())
}

/// Retrieve the extension from a file path.
///
/// * `path` - The file path.
fn get_extension_from_filename(path: &str) -> Option<&str> {
    regex_file_ext()
        .captures(path)
        .map(|c| c.get(1).map_or("", |m| m.as_str()))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Write;

    fn temp_path(name: &str) -> String {
        let mut p = std::env::temp_dir();
        p.push(format!("lenscore-{}-{name}", std::process::id()));
        p.to_string_lossy().into_owned()
    }

    #[test]
    fn extension() {
        assert_eq!(get_extension_from_filename("a/b/c.exr"), Some(".exr"));
        assert_eq!(get_extension_from_filename("c.tar.png"), Some(".png"));
        assert_eq!(get_extension_from_filename("a.b/c"), None);
    }

    #[test]
    fn unknown_extension_is_error() {
        assert!(read_image("no_extension").is_err());
    }

    #[test]
    fn new_checks_length() {
        assert!(FloatImage::new(vec![0.0; 5], 2, 1, 3).is_err());
        let img = FloatImage::new(vec![0.0, 0.1, 0.2, 1.0, 1.1, 1.2], 2, 1, 3).unwrap();
        assert_eq!(img.width(), 2);
        assert_eq!(img.height(), 1);
        assert_eq!(img.channel(1, 0, 2), 1.2);
    }

    #[test]
    fn read_little_endian_pfm_flips_rows() {
        let path = temp_path("flip.pfm");
        {
            let mut f = File::create(&path).unwrap();
            f.write_all(b"Pf\n1 2\n-1.0\n").unwrap();
            // Bottom row first.
            f.write_f32::<LittleEndian>(0.25).unwrap();
            f.write_f32::<LittleEndian>(0.75).unwrap();
        }
        let img = read_image(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(img.n_channels, 1);
        assert_eq!(img.resolution, Point2::new(1, 2));
        assert_eq!(img.channel(0, 0, 0), 0.75);
        assert_eq!(img.channel(0, 1, 0), 0.25);
    }

    #[test]
    fn oversized_pfm_header_is_error() {
        let path = temp_path("huge.pfm");
        {
            let mut f = File::create(&path).unwrap();
            f.write_all(format!("PF\n{} 2\n-1.0\n", usize::MAX).as_bytes())
                .unwrap();
        }
        let result = read_image(&path);
        std::fs::remove_file(&path).ok();

        assert!(result.unwrap_err().contains("too large"));
    }

    #[test]
    fn read_big_endian_pfm_with_scale() {
        let path = temp_path("scale.pfm");
        {
            let mut f = File::create(&path).unwrap();
            f.write_all(b"PF\n1 1\n2.0\n").unwrap();
            for v in [0.5, 1.0, 1.5] {
                f.write_f32::<BigEndian>(v).unwrap();
            }
        }
        let img = read_image(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(img.n_channels, 3);
        assert_eq!(img.pixels, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn read_png_keeps_rgb() {
        let path = temp_path("rgb.png");
        let mut buf = image::RgbImage::new(2, 1);
        buf.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        buf.put_pixel(1, 0, image::Rgb([0, 0, 255]));
        buf.save(&path).unwrap();

        let img = read_image(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(img.n_channels, 3);
        assert_eq!(img.channel(0, 0, 0), 1.0);
        assert_eq!(img.channel(1, 0, 2), 1.0);
        assert_eq!(img.channel(1, 0, 0), 0.0);
    }

    #[test]
    fn missing_file_is_error() {
        assert!(read_image(&temp_path("missing.pfm")).is_err());
        assert!(read_image(&temp_path("missing.png")).is_err());
    }
}
