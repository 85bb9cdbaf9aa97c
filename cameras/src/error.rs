//! Lens Errors

use lenscore::pbrt::Float;
use thiserror::Error;

/// Fatal configuration errors. Any of these aborts the current camera
/// configuration; sampling failures are never reported through this type.
#[derive(Debug, Error)]
pub enum LensError {
    #[error("error reading '{path}': {reason}")]
    Io { path: String, reason: String },

    #[error("error parsing lens data '{path}': {reason}")]
    Grammar { path: String, reason: String },

    #[error("lens data has {0} columns; expected 4 or 5")]
    ColumnCount(usize),

    #[error("lens data line {line} has {found} columns; expected {expected}")]
    RowWidth {
        line: usize,
        found: usize,
        expected: usize,
    },

    #[error("lens data '{0}' contains no lens elements")]
    Empty(String),

    #[error("lens data has no aperture stop (a row with curvature 0)")]
    MissingApertureStop,

    #[error("lens data has more than one aperture stop (lines {first} and {second})")]
    MultipleApertureStops { first: usize, second: usize },

    #[error("required path '{0}' is empty")]
    EmptyPath(&'static str),

    #[error("error reading bokeh image '{path}': {reason}")]
    Image { path: String, reason: String },

    #[error("bokeh image is {width} x {height} with {channels} channels; need at least 3 channels")]
    InvalidImage {
        width: usize,
        height: usize,
        channels: usize,
    },

    #[error("bokeh image has zero total luminance")]
    ZeroLuminance,

    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: Float },

    #[error("unable to measure the {0} of the lens stack")]
    Unmeasurable(&'static str),
}

/// Returns an error unless the value is positive.
///
/// * `name`  - Name of the value.
/// * `value` - The value.
pub fn require_positive(name: &'static str, value: Float) -> Result<Float, LensError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(LensError::NonPositive { name, value })
    }
}
