//! Camera

use crate::*;
use lenscore::geometry::*;
use lenscore::pbrt::*;
use lenscore::rng::RNG;
use lenscore::sampling::concentric_sample_disk;
use std::sync::Arc;

/// Number of new lens samples drawn after a rejected one before a camera
/// ray is given up.
pub const MAX_TRIES: usize = 15;

/// Runs `attempt` for the first sample and up to `MAX_TRIES` retries,
/// stopping at the first success. Returns whether any attempt succeeded.
///
/// * `attempt` - Closure called with the attempt number.
fn with_retries<F>(attempt: F) -> bool
where
    F: FnMut(usize) -> bool,
{
    (0..=MAX_TRIES).any(attempt)
}

/// Stores the sample values needed to generate a camera ray.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CameraSample {
    /// Film position in normalized device coordinates.
    pub p_film: Point2f,

    /// Uniform values for the point on the lens.
    pub p_lens: Point2f,
}

impl CameraSample {
    /// Create a new `CameraSample`.
    ///
    /// * `p_film` - Film position in normalized device coordinates.
    /// * `p_lens` - Uniform values for the point on the lens.
    pub fn new(p_film: Point2f, p_lens: Point2f) -> Self {
        Self { p_film, p_lens }
    }

    /// Returns a random number generator for retries of this sample.
    fn rng(&self) -> RNG {
        RNG::from_points(&[self.p_film, self.p_lens])
    }
}

/// Camera interface.
pub trait Camera: Send + Sync {
    /// Returns a ray corresponding to a given sample. It also returns a
    /// weight; 0 means the sample was rejected.
    ///
    /// * `sample` - The sample.
    fn generate_ray(&self, sample: &CameraSample) -> (Ray, Float);

    /// Returns the ray outcome counters.
    fn counters(&self) -> &RayCounters;
}

/// Maps uniform values to a point on the lens within the unit disc.
#[derive(Clone, Debug)]
pub enum LensSampler {
    /// Uniform disc.
    Disk,

    /// Importance sampled bokeh image.
    Image(Arc<BokehSampler>),
}

impl LensSampler {
    /// Returns a point on the lens.
    ///
    /// * `u` - Uniform values.
    pub fn sample(&self, u: &Point2f) -> Point2f {
        match self {
            Self::Disk => concentric_sample_disk(u),
            Self::Image(image) => image.sample(u),
        }
    }
}

/// Thin lens camera.
#[derive(Debug)]
pub struct ThinLensCamera {
    /// Horizontal field of view in radians.
    fov: Float,

    /// Tangent of half the field of view.
    tan_fov: Float,

    /// Aperture radius from focal length and f-number.
    aperture_radius: Float,

    focus_distance: Float,
    use_dof: bool,
    optical_vignetting_distance: Float,
    optical_vignetting_radius: Float,
    lens: LensSampler,
    counters: RayCounters,
}

impl ThinLensCamera {
    /// Create a new thin lens camera.
    ///
    /// * `settings` - Camera settings.
    /// * `lens`     - Lens sampler.
    pub fn new(settings: &CameraSettings, lens: LensSampler) -> Result<Self, LensError> {
        let sensor_width = require_positive("sensor width", settings.sensor_width)?;
        let focal_length = require_positive("focal length", settings.focal_length)?;
        let f_stop = require_positive("f-stop", settings.f_stop)?;
        if settings.use_dof {
            require_positive("focus distance", settings.focus_distance)?;
        }

        let fov = 2.0 * (sensor_width / (2.0 * focal_length)).atan();
        let aperture_radius = focal_length / (2.0 * f_stop);
        debug!("{:<40} {:>12.8}", "Field of view [rad]", fov);
        debug!("{:<40} {:>12.8}", "Aperture radius [cm]", aperture_radius);

        Ok(Self {
            fov,
            tan_fov: (fov / 2.0).tan(),
            aperture_radius,
            focus_distance: settings.focus_distance,
            use_dof: settings.use_dof,
            optical_vignetting_distance: settings.optical_vignetting_distance,
            optical_vignetting_radius: settings.optical_vignetting_radius,
            lens,
            counters: RayCounters::new(),
        })
    }

    /// Returns the horizontal field of view in radians.
    pub fn fov(&self) -> Float {
        self.fov
    }

    /// Returns the aperture radius.
    pub fn aperture_radius(&self) -> Float {
        self.aperture_radius
    }

    /// Returns true if a ray passes the virtual vignetting aperture, found by
    /// scaling its lens position linearly to the vignetting distance.
    ///
    /// * `origin` - Ray origin on the lens.
    /// * `d`      - Ray direction.
    fn passes_optical_vignetting(&self, origin: &Point3f, d: &Vector3f) -> bool {
        let p = *d * self.optical_vignetting_distance - Vector3f::from(*origin);
        p.x.hypot(p.y) < self.aperture_radius * self.optical_vignetting_radius
    }
}

impl Camera for ThinLensCamera {
    /// Returns a ray corresponding to a given sample. Without depth of field
    /// the ray leaves the lens center. The weight is 0 when every lens sample
    /// was rejected by optical vignetting.
    ///
    /// * `sample` - The sample.
    fn generate_ray(&self, sample: &CameraSample) -> (Ray, Float) {
        let dir = Vector3f::new(
            sample.p_film.x * self.tan_fov,
            sample.p_film.y * self.tan_fov,
            1.0,
        )
        .normalize();

        let mut origin = Point3f::zero();
        let mut d = dir;
        let mut weight = 1.0;

        if self.use_dof {
            let mut rng = sample.rng();
            let vignetting = self.optical_vignetting_distance > 0.0;

            let accepted = with_retries(|attempt| {
                let u = if attempt == 0 {
                    sample.p_lens
                } else {
                    rng.uniform_point2()
                };
                let lens = self.lens.sample(&u) * self.aperture_radius;
                origin = Point3f::new(lens.x, lens.y, 0.0);

                // Point on the plane of focus.
                let focus = Point3f::from(dir * abs(self.focus_distance / dir.z));
                d = (focus - origin).normalize();

                !vignetting || self.passes_optical_vignetting(&origin, &d)
            });

            if accepted {
                self.counters.add_successful();
            } else {
                weight = 0.0;
                self.counters.add_vignetted();
            }
        }

        d.z = -d.z;
        (Ray::new(origin, d), weight)
    }

    fn counters(&self) -> &RayCounters {
        &self.counters
    }
}

/// Camera tracing rays through a calibrated lens stack.
#[derive(Debug)]
pub struct RaytracedCamera {
    stack: LensStack,
    lut: Option<ExitPupilLut>,
    lens: LensSampler,

    /// Half the sensor width; film positions scale by it on both axes.
    film_half_width: Float,
}

impl RaytracedCamera {
    /// Load the lens prescription, calibrate it and build the exit pupil
    /// lookup table if it is enabled.
    ///
    /// * `settings` - Camera settings.
    /// * `lens`     - Lens sampler.
    pub fn new(settings: &CameraSettings, lens: LensSampler) -> Result<Self, LensError> {
        if settings.lens_data_path.is_empty() {
            return Err(LensError::EmptyPath("lens data"));
        }
        info!("{:<40} {:>12}", "Lens data path", settings.lens_data_path);

        let prescription = parse_prescription_file(&settings.lens_data_path)?;
        let mut stack = LensStack::from_prescription(&prescription)?;
        stack.calibrate(
            settings.focal_length,
            settings.f_stop,
            settings.focus_distance,
        )?;
        stack.log_elements();

        Self::from_stack(stack, settings, lens)
    }

    /// Create a camera from a lens stack whose film plane is already placed.
    ///
    /// * `stack`    - The lens stack.
    /// * `settings` - Camera settings.
    /// * `lens`     - Lens sampler.
    pub fn from_stack(
        stack: LensStack,
        settings: &CameraSettings,
        lens: LensSampler,
    ) -> Result<Self, LensError> {
        let sensor_width = require_positive("sensor width", settings.sensor_width)?;
        let lut = if settings.use_lut {
            let extent = max(settings.exit_pupil.film_extent, sensor_width);
            Some(ExitPupilLut::build(&stack, &settings.exit_pupil, extent))
        } else {
            None
        };

        Ok(Self {
            stack,
            lut,
            lens,
            film_half_width: 0.5 * sensor_width,
        })
    }

    /// Returns the lens stack.
    pub fn stack(&self) -> &LensStack {
        &self.stack
    }

    /// Returns the exit pupil lookup table if it is enabled.
    pub fn lut(&self) -> Option<&ExitPupilLut> {
        self.lut.as_ref()
    }
}

impl Camera for RaytracedCamera {
    /// Returns a ray corresponding to a given sample. The ray leaves the
    /// front of the lens stack; its weight is 0 when no lens sample made it
    /// through.
    ///
    /// * `sample` - The sample.
    fn generate_ray(&self, sample: &CameraSample) -> (Ray, Float) {
        let origin = Point3f::new(
            sample.p_film.x * self.film_half_width,
            sample.p_film.y * self.film_half_width,
            self.stack.origin_shift(),
        );
        let footprint = self
            .lut
            .as_ref()
            .map(|lut| lut.lookup(&Point2f::new(origin.x, origin.y)));
        let aperture = self.stack.entry_aperture();
        let axial = self.stack.entry_axial_length();

        let mut rng = sample.rng();
        let mut d = Vector3f::new(0.0, 0.0, axial);
        let mut exited = None;

        with_retries(|attempt| {
            let u = if attempt == 0 {
                sample.p_lens
            } else {
                rng.uniform_point2()
            };
            let lens = self.lens.sample(&u);
            let target = match footprint {
                Some(f) => f.target(&lens),
                None => lens * aperture,
            };
            d = Vector3f::new(target.x - origin.x, target.y - origin.y, axial);
            exited = self.stack.trace(&Ray::new(origin, d)).exited();
            exited.is_some()
        });

        let counters = self.stack.counters();
        match exited {
            Some(ray) => {
                counters.add_successful();
                (Ray::new(-ray.o, -ray.d), 1.0)
            }
            None => {
                counters.add_vignetted();
                (Ray::new(-origin, -d.normalize()), 0.0)
            }
        }
    }

    fn counters(&self) -> &RayCounters {
        self.stack.counters()
    }
}

/// Camera that switches between the thin lens and the raytraced lens model
/// and applies the exposure adjustment.
#[derive(Debug)]
pub struct LensCamera {
    settings: CameraSettings,
    thin_lens: ThinLensCamera,
    raytraced: Option<RaytracedCamera>,

    /// Inputs the raytraced camera was last built from.
    snapshot: Option<RaytracedSnapshot>,

    /// Path and distribution of the loaded bokeh image.
    bokeh: Option<(String, Arc<BokehSampler>)>,
}

impl LensCamera {
    /// Create a new camera.
    ///
    /// * `settings` - Camera settings.
    pub fn new(settings: CameraSettings) -> Result<Self, LensError> {
        let bokeh = Self::load_bokeh(&settings, None)?;
        let lens = Self::lens_sampler(&bokeh);
        let thin_lens = ThinLensCamera::new(&settings, lens)?;

        let (raytraced, snapshot) = match Self::build_raytraced(&settings, &bokeh, None)? {
            Some((camera, snapshot)) => (Some(camera), Some(snapshot)),
            None => (None, None),
        };

        Ok(Self {
            settings,
            thin_lens,
            raytraced,
            snapshot,
            bokeh,
        })
    }

    /// Apply new settings. The raytraced lens is only rebuilt when an input
    /// it depends on changed. Returns true if it was rebuilt. On error the
    /// camera keeps its previous settings and lenses.
    ///
    /// * `settings` - Camera settings.
    pub fn update(&mut self, settings: CameraSettings) -> Result<bool, LensError> {
        let bokeh = Self::load_bokeh(&settings, self.bokeh.as_ref())?;
        let thin_lens = ThinLensCamera::new(&settings, Self::lens_sampler(&bokeh))?;
        let built = self.raytraced.as_ref().and(self.snapshot.as_ref());
        let rebuilt = Self::build_raytraced(&settings, &bokeh, built)?;

        self.thin_lens = thin_lens;
        self.bokeh = bokeh;
        self.settings = settings;
        match rebuilt {
            Some((camera, snapshot)) => {
                self.raytraced = Some(camera);
                self.snapshot = Some(snapshot);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Build a raytraced camera if the settings call for it and its inputs
    /// differ from the ones the current camera was built from.
    ///
    /// * `settings` - Camera settings.
    /// * `bokeh`    - The loaded bokeh image.
    /// * `built`    - Inputs of the current raytraced camera.
    fn build_raytraced(
        settings: &CameraSettings,
        bokeh: &Option<(String, Arc<BokehSampler>)>,
        built: Option<&RaytracedSnapshot>,
    ) -> Result<Option<(RaytracedCamera, RaytracedSnapshot)>, LensError> {
        if settings.lens_model != LensModel::Raytraced {
            return Ok(None);
        }

        let snapshot = settings.raytraced_snapshot();
        if built == Some(&snapshot) {
            warn!("Skipping raytraced camera update, parameters didn't change.");
            return Ok(None);
        }

        let camera = RaytracedCamera::new(settings, Self::lens_sampler(bokeh))?;
        Ok(Some((camera, snapshot)))
    }

    /// Returns true if the lens is sampled at all for the settings.
    ///
    /// * `settings` - Camera settings.
    fn samples_lens(settings: &CameraSettings) -> bool {
        settings.use_dof || settings.lens_model == LensModel::Raytraced
    }

    /// Load the bokeh image if one is needed, reusing the current one when
    /// the path did not change.
    ///
    /// * `settings` - Camera settings.
    /// * `current`  - The currently loaded image.
    fn load_bokeh(
        settings: &CameraSettings,
        current: Option<&(String, Arc<BokehSampler>)>,
    ) -> Result<Option<(String, Arc<BokehSampler>)>, LensError> {
        if !settings.use_image || !Self::samples_lens(settings) {
            return Ok(None);
        }
        match current {
            Some((path, sampler)) if *path == settings.bokeh_path => {
                Ok(Some((path.clone(), Arc::clone(sampler))))
            }
            _ => {
                let sampler = BokehSampler::from_file(&settings.bokeh_path)?;
                Ok(Some((settings.bokeh_path.clone(), Arc::new(sampler))))
            }
        }
    }

    /// Returns the lens sampler for a loaded bokeh image.
    ///
    /// * `bokeh` - The loaded bokeh image.
    fn lens_sampler(bokeh: &Option<(String, Arc<BokehSampler>)>) -> LensSampler {
        match bokeh {
            Some((_, sampler)) => LensSampler::Image(Arc::clone(sampler)),
            None => LensSampler::Disk,
        }
    }

    /// Returns the current settings.
    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Returns the thin lens camera.
    pub fn thin_lens(&self) -> &ThinLensCamera {
        &self.thin_lens
    }

    /// Returns the raytraced camera once it has been built.
    pub fn raytraced(&self) -> Option<&RaytracedCamera> {
        self.raytraced.as_ref()
    }

    /// Returns the camera for the active lens model.
    fn active(&self) -> &dyn Camera {
        match (self.settings.lens_model, self.raytraced.as_ref()) {
            (LensModel::Raytraced, Some(raytraced)) => raytraced,
            _ => &self.thin_lens,
        }
    }

    /// Log the ray statistics of both lens models.
    pub fn report(&self) {
        self.thin_lens.counters().report("Thin lens");
        if let Some(raytraced) = self.raytraced.as_ref() {
            raytraced.counters().report("Raytraced");
        }
    }
}

impl Camera for LensCamera {
    /// Returns a ray from the active lens model with the exposure adjustment
    /// applied to its weight.
    ///
    /// * `sample` - The sample.
    fn generate_ray(&self, sample: &CameraSample) -> (Ray, Float) {
        let (ray, weight) = self.active().generate_ray(sample);
        (ray, weight * self.settings.exposure_multiplier())
    }

    fn counters(&self) -> &RayCounters {
        self.active().counters()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use std::fs;
    use std::thread;

    fn thin_lens_settings() -> CameraSettings {
        CameraSettings {
            use_image: false,
            use_dof: false,
            ..CameraSettings::default()
        }
    }

    fn center() -> CameraSample {
        CameraSample::new(Point2f::zero(), Point2f::new(0.5, 0.5))
    }

    /// A weak surface 2mm in front of a 20mm stop with the film 2mm behind
    /// the stop.
    fn pupil_stack() -> LensStack {
        let p = parse_prescription("1000 2 0 20\n0 5 0 20\n", "test").unwrap();
        let mut stack = LensStack::from_prescription(&p).unwrap();
        stack.set_origin_shift(-0.4);
        stack
    }

    fn pupil_settings(use_lut: bool, sensor_width: Float) -> CameraSettings {
        CameraSettings {
            sensor_width,
            use_image: false,
            lens_model: LensModel::Raytraced,
            use_lut,
            exit_pupil: ExitPupilSettings {
                grid_x: 2,
                grid_y: 2,
                bounds_samples: 4000,
                film_extent: 0.8,
            },
            ..CameraSettings::default()
        }
    }

    fn write_lens_file(name: &str) -> String {
        let path = std::env::temp_dir().join(name);
        fs::write(
            &path,
            "# r t n a\n100.0 0.1 1.5 20.0\n-100.0 5.0 0 20.0\n0 50.0 0 10.0\n",
        )
        .unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn retries_are_bounded() {
        let mut n = 0;
        assert!(!with_retries(|_| {
            n += 1;
            false
        }));
        assert_eq!(n, MAX_TRIES + 1);

        assert!(with_retries(|attempt| attempt == MAX_TRIES));
    }

    #[test]
    fn center_pixel_looks_down_the_axis() {
        let camera = LensCamera::new(thin_lens_settings()).unwrap();
        let (ray, weight) = camera.generate_ray(&center());
        assert_eq!(ray.o, Point3f::zero());
        assert!(approx_eq!(f64, ray.d.x, 0.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, ray.d.y, 0.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, ray.d.z, -1.0, epsilon = 1e-12));
        assert_eq!(weight, 1.0);
        assert_eq!(camera.counters().successful(), 0);
    }

    #[test]
    fn field_of_view_from_sensor() {
        let camera = ThinLensCamera::new(&thin_lens_settings(), LensSampler::Disk).unwrap();
        assert!(approx_eq!(f64, camera.fov(), 2.0 * (0.36 as Float).atan(), ulps = 4));
        assert!(approx_eq!(f64, camera.aperture_radius(), 5.0 / 2.8, ulps = 4));

        // The film corner maps to tan(fov / 2) on the unit plane.
        let (ray, _) = camera.generate_ray(&CameraSample::new(
            Point2f::new(1.0, 0.0),
            Point2f::new(0.5, 0.5),
        ));
        assert!(approx_eq!(f64, ray.d.x / -ray.d.z, 0.36, epsilon = 1e-12));
    }

    #[test]
    fn exposure_scales_weight() {
        let mut settings = thin_lens_settings();
        settings.exposure_control = 2.0;
        let camera = LensCamera::new(settings).unwrap();
        assert_eq!(camera.generate_ray(&center()).1, 5.0);

        let mut settings = thin_lens_settings();
        settings.exposure_control = -1.0;
        let camera = LensCamera::new(settings).unwrap();
        assert_eq!(camera.generate_ray(&center()).1, 0.5);
    }

    #[test]
    fn depth_of_field_rays_meet_on_the_focus_plane() {
        let settings = CameraSettings {
            use_image: false,
            ..CameraSettings::default()
        };
        let camera = ThinLensCamera::new(&settings, LensSampler::Disk).unwrap();

        for u in [(0.1, 0.9), (0.7, 0.3), (0.95, 0.5)] {
            let sample = CameraSample::new(Point2f::new(0.2, -0.1), Point2f::new(u.0, u.1));
            let (ray, weight) = camera.generate_ray(&sample);
            assert_eq!(weight, 1.0);
            assert!(ray.o.x.hypot(ray.o.y) <= camera.aperture_radius() + 1e-12);

            // Rays look down -z and reach z = -50 at the pinhole image.
            let t = -50.0 / ray.d.z;
            let p = ray.at(t);
            let pinhole = 50.0 * 0.36 * Vector3f::new(0.2, -0.1, 0.0);
            assert!(approx_eq!(f64, p.x, pinhole.x, epsilon = 1e-9));
            assert!(approx_eq!(f64, p.y, pinhole.y, epsilon = 1e-9));
        }
        assert_eq!(camera.counters().successful(), 3);
    }

    #[test]
    fn optical_vignetting() {
        let mut settings = CameraSettings {
            use_image: false,
            optical_vignetting_distance: 1e-9,
            ..CameraSettings::default()
        };
        let camera = ThinLensCamera::new(&settings, LensSampler::Disk).unwrap();
        let (_, weight) = camera.generate_ray(&center());
        assert_eq!(weight, 1.0);
        assert_eq!(camera.counters().successful(), 1);

        settings.optical_vignetting_distance = 10.0;
        settings.optical_vignetting_radius = 1e-6;
        let camera = ThinLensCamera::new(&settings, LensSampler::Disk).unwrap();
        let sample = CameraSample::new(Point2f::zero(), Point2f::new(0.9, 0.2));
        let (_, weight) = camera.generate_ray(&sample);
        assert_eq!(weight, 0.0);
        assert_eq!(camera.counters().vignetted(), 1);
        assert_eq!(camera.counters().successful(), 0);
    }

    #[test]
    fn invalid_thin_lens() {
        let mut settings = thin_lens_settings();
        settings.focal_length = 0.0;
        assert!(matches!(
            LensCamera::new(settings),
            Err(LensError::NonPositive { .. })
        ));
    }

    #[test]
    fn bokeh_image_needed_only_when_sampled() {
        let mut settings = CameraSettings::default();
        settings.use_dof = false;
        assert!(LensCamera::new(settings.clone()).is_ok());

        settings.use_dof = true;
        assert!(matches!(
            LensCamera::new(settings),
            Err(LensError::EmptyPath("bokeh image"))
        ));
    }

    #[test]
    fn raytraced_through_lut() {
        let settings = pupil_settings(true, 0.8);
        let camera = RaytracedCamera::from_stack(pupil_stack(), &settings, LensSampler::Disk)
            .unwrap();
        assert!(camera.lut().is_some());

        let (ray, weight) = camera.generate_ray(&center());
        assert_eq!(weight, 1.0);
        assert!(ray.d.z < 0.0);
        assert!(abs(ray.o.z) < 0.01);
        assert_eq!(camera.counters().successful(), 1);

        let side = CameraSample::new(Point2f::new(1.0, 0.0), Point2f::new(0.3, 0.6));
        let (_, weight) = camera.generate_ray(&side);
        assert_eq!(weight, 1.0);
    }

    #[test]
    fn raytraced_naive() {
        let settings = pupil_settings(false, 0.8);
        let camera = RaytracedCamera::from_stack(pupil_stack(), &settings, LensSampler::Disk)
            .unwrap();
        assert!(camera.lut().is_none());

        let (ray, weight) = camera.generate_ray(&center());
        assert_eq!(weight, 1.0);
        assert!(approx_eq!(f64, ray.d.x, 0.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, ray.d.y, 0.0, epsilon = 1e-12));
        assert!(ray.d.z < 0.0);
    }

    #[test]
    fn raytraced_gives_up_outside_the_lens() {
        let settings = pupil_settings(false, 100.0);
        let camera = RaytracedCamera::from_stack(pupil_stack(), &settings, LensSampler::Disk)
            .unwrap();
        let sample = CameraSample::new(Point2f::new(1.0, 1.0), Point2f::new(0.5, 0.5));
        let (ray, weight) = camera.generate_ray(&sample);
        assert_eq!(weight, 0.0);
        assert_eq!(ray.o, Point3f::new(-50.0, -50.0, 0.4));
        assert_eq!(camera.counters().vignetted(), 1);
        assert_eq!(camera.counters().successful(), 0);
    }

    #[test]
    fn missing_lens_data() {
        let settings = CameraSettings {
            use_image: false,
            lens_model: LensModel::Raytraced,
            ..CameraSettings::default()
        };
        assert!(matches!(
            LensCamera::new(settings),
            Err(LensError::EmptyPath("lens data"))
        ));
    }

    #[test]
    fn update_skips_unchanged_lens() {
        let path = write_lens_file("lenscam_update_biconvex.txt");
        let settings = CameraSettings {
            focal_length: 10.0,
            f_stop: 8.0,
            use_image: false,
            lens_model: LensModel::Raytraced,
            lens_data_path: path,
            use_lut: false,
            ..CameraSettings::default()
        };

        let mut camera = LensCamera::new(settings.clone()).unwrap();
        let shift = camera.raytraced().unwrap().stack().origin_shift();
        assert!(shift < 0.0);

        let mut changed = settings.clone();
        changed.exposure_control = 2.0;
        assert!(!camera.update(changed.clone()).unwrap());
        assert_eq!(camera.settings().exposure_control, 2.0);

        changed.focus_distance = 500.0;
        assert!(camera.update(changed).unwrap());
        let new_shift = camera.raytraced().unwrap().stack().origin_shift();
        assert!(new_shift > shift);
    }

    #[test]
    fn failed_update_keeps_raytraced_lens() {
        let path = write_lens_file("lenscam_failed_update_biconvex.txt");
        let settings = CameraSettings {
            focal_length: 10.0,
            f_stop: 8.0,
            use_image: false,
            lens_model: LensModel::Raytraced,
            lens_data_path: path.clone(),
            use_lut: false,
            ..CameraSettings::default()
        };

        let mut camera = LensCamera::new(settings.clone()).unwrap();
        let sample = CameraSample::new(Point2f::new(0.0, 0.0), Point2f::new(0.5, 0.5));
        let before = camera.generate_ray(&sample);

        let mut broken = settings;
        broken.lens_data_path = "/definitely/not/here.dat".to_string();
        broken.exposure_control = 2.0;
        assert!(camera.update(broken).is_err());

        assert_eq!(camera.settings().lens_model, LensModel::Raytraced);
        assert_eq!(camera.settings().lens_data_path, path);
        assert_eq!(camera.settings().exposure_control, 0.0);
        assert!(camera.raytraced().is_some());
        assert_eq!(camera.generate_ray(&sample), before);
    }

    #[test]
    fn concurrent_sampling() {
        let settings = CameraSettings {
            use_image: false,
            ..CameraSettings::default()
        };
        let camera = LensCamera::new(settings).unwrap();

        thread::scope(|s| {
            for t in 0..4 {
                let camera = &camera;
                s.spawn(move || {
                    let mut rng = RNG::new(t);
                    for _ in 0..1000 {
                        let sample = CameraSample::new(
                            Point2f::new(rng.uniform_signed(), rng.uniform_signed()),
                            rng.uniform_point2(),
                        );
                        let (ray, weight) = camera.generate_ray(&sample);
                        assert_eq!(weight, 1.0);
                        assert!(!ray.d.has_nans());
                    }
                });
            }
        });
        assert_eq!(camera.counters().successful(), 4000);
    }
}
