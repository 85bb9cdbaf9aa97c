//! Camera Settings

use lenscore::paramset::ParamSet;
use lenscore::pbrt::*;
use std::fmt;

/// Model used to generate camera rays.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LensModel {
    /// Analytic thin lens.
    ThinLens,

    /// Trace through the lens prescription.
    Raytraced,
}

impl LensModel {
    /// Returns the lens model for a name. Unknown names fall back to the
    /// thin lens.
    ///
    /// * `name` - The name.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "thinlens" | "thin-lens" | "thin_lens" => Self::ThinLens,
            "raytraced" | "kolb" => Self::Raytraced,
            _ => {
                warn!("Unknown lens model '{name}'. Using thin lens.");
                Self::ThinLens
            }
        }
    }
}

impl fmt::Display for LensModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThinLens => write!(f, "thinlens"),
            Self::Raytraced => write!(f, "raytraced"),
        }
    }
}

/// Size of the exit pupil lookup table.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ExitPupilSettings {
    /// Number of intervals along x.
    pub grid_x: usize,

    /// Number of intervals along y.
    pub grid_y: usize,

    /// Rays traced per grid position.
    pub bounds_samples: usize,

    /// Smallest film extent covered by the grid.
    pub film_extent: Float,
}

impl Default for ExitPupilSettings {
    fn default() -> Self {
        Self {
            grid_x: 64,
            grid_y: 64,
            bounds_samples: 25000,
            film_extent: 6.0,
        }
    }
}

/// All camera inputs. Lengths are in centimeters.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraSettings {
    pub sensor_width: Float,
    pub sensor_height: Float,
    pub focal_length: Float,
    pub f_stop: Float,
    pub focus_distance: Float,

    /// Sample the lens through the bokeh image instead of a disc.
    pub use_image: bool,
    pub bokeh_path: String,

    pub lens_model: LensModel,
    pub lens_data_path: String,

    /// Sample the lens through the exit pupil lookup table.
    pub use_lut: bool,
    pub use_dof: bool,

    /// Distance of the virtual vignetting aperture; 0 disables it.
    pub optical_vignetting_distance: Float,

    /// Radius of the virtual vignetting aperture relative to the aperture
    /// radius.
    pub optical_vignetting_radius: Float,

    /// Exposure adjustment in stops.
    pub exposure_control: Float,

    pub exit_pupil: ExitPupilSettings,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            sensor_width: 3.6,
            sensor_height: 2.4,
            focal_length: 5.0,
            f_stop: 1.4,
            focus_distance: 50.0,
            use_image: true,
            bokeh_path: String::new(),
            lens_model: LensModel::ThinLens,
            lens_data_path: String::new(),
            use_lut: true,
            use_dof: true,
            optical_vignetting_distance: 0.0,
            optical_vignetting_radius: 1.0,
            exposure_control: 0.0,
            exit_pupil: ExitPupilSettings::default(),
        }
    }
}

impl From<&ParamSet> for CameraSettings {
    /// Create settings from a parameter set. Missing parameters keep their
    /// default values.
    ///
    /// * `params` - Parameter set.
    fn from(params: &ParamSet) -> Self {
        let d = Self::default();
        let lens_model = params.find_one_string("lensModel", String::new());
        let grid = |name: &str, default: usize| {
            max(params.find_one_int(name, default as Int), 1) as usize
        };

        Self {
            sensor_width: params.find_one_float("sensorWidth", d.sensor_width),
            sensor_height: params.find_one_float("sensorHeight", d.sensor_height),
            focal_length: params.find_one_float("focalLength", d.focal_length),
            f_stop: params.find_one_float("fStop", d.f_stop),
            focus_distance: params.find_one_float("focalDistance", d.focus_distance),
            use_image: params.find_one_bool("useImage", d.use_image),
            bokeh_path: params
                .find_one_filename("bokehPath")
                .unwrap_or(d.bokeh_path),
            lens_model: if lens_model.is_empty() {
                d.lens_model
            } else {
                LensModel::from_name(&lens_model)
            },
            lens_data_path: params
                .find_one_filename("lensDataPath")
                .unwrap_or(d.lens_data_path),
            use_lut: params.find_one_bool("kolbSamplingLUT", d.use_lut),
            use_dof: params.find_one_bool("useDof", d.use_dof),
            optical_vignetting_distance: params
                .find_one_float("opticalVignettingDistance", d.optical_vignetting_distance),
            optical_vignetting_radius: params
                .find_one_float("opticalVignettingRadius", d.optical_vignetting_radius),
            exposure_control: params.find_one_float("exposureControl", d.exposure_control),
            exit_pupil: ExitPupilSettings {
                grid_x: grid("lutGridX", d.exit_pupil.grid_x),
                grid_y: grid("lutGridY", d.exit_pupil.grid_y),
                bounds_samples: max(
                    params.find_one_int("lutBoundsSamples", d.exit_pupil.bounds_samples as Int),
                    1,
                ) as usize,
                film_extent: params.find_one_float("lutFilmExtent", d.exit_pupil.film_extent),
            },
        }
    }
}

impl CameraSettings {
    /// Returns the inputs that require rebuilding the raytraced lens.
    pub fn raytraced_snapshot(&self) -> RaytracedSnapshot {
        RaytracedSnapshot {
            sensor_width: self.sensor_width,
            sensor_height: self.sensor_height,
            focal_length: self.focal_length,
            f_stop: self.f_stop,
            focus_distance: self.focus_distance,
            use_image: self.use_image,
            bokeh_path: self.bokeh_path.clone(),
            lens_data_path: self.lens_data_path.clone(),
            use_lut: self.use_lut,
        }
    }

    /// Returns the weight multiplier for the exposure adjustment.
    pub fn exposure_multiplier(&self) -> Float {
        let e = self.exposure_control;
        let e2 = e * e;
        if e > 0.0 {
            1.0 + e2
        } else if e < 0.0 {
            1.0 / (1.0 + e2)
        } else {
            1.0
        }
    }
}

/// The raytraced model inputs from the last rebuild.
#[derive(Clone, Debug, PartialEq)]
pub struct RaytracedSnapshot {
    pub sensor_width: Float,
    pub sensor_height: Float,
    pub focal_length: Float,
    pub f_stop: Float,
    pub focus_distance: Float,
    pub use_image: bool,
    pub bokeh_path: String,
    pub lens_data_path: String,
    pub use_lut: bool,
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
