#[macro_use]
extern crate log;

use cameras::*;
use lenscore::app::*;
use lenscore::geometry::*;
use lenscore::pbrt::*;
use lenscore::rng::RNG;

fn main() {
    // Initialize `env_logger`.
    env_logger::init();
    if OPTIONS.quiet {
        log::set_max_level(log::LevelFilter::Error);
    }

    if let Err(e) = run() {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let params = OPTIONS.param_set()?;
    debug!("Camera parameters:\n{params}");

    let settings = CameraSettings::from(&params);
    info!("{:<40} {:>12}", "Lens model", settings.lens_model);
    let camera = LensCamera::new(settings).map_err(|e| e.to_string())?;

    // Screen window is [-1, 1] horizontally and keeps the film aspect ratio
    // vertically.
    let (width, height) = OPTIONS.film_resolution();
    let aspect = height as Float / width as Float;
    let mut rng = RNG::new(OPTIONS.seed);

    let mut n_rays = 0_usize;
    let mut n_rejected = 0_usize;
    let mut total_weight = 0.0;
    for y in 0..height {
        for x in 0..width {
            for _ in 0..OPTIONS.spp {
                let p = Point2f::new(
                    x as Float + rng.uniform_float(),
                    y as Float + rng.uniform_float(),
                );
                let p_film = Point2f::new(
                    2.0 * p.x / width as Float - 1.0,
                    (1.0 - 2.0 * p.y / height as Float) * aspect,
                );
                let sample = CameraSample::new(p_film, rng.uniform_point2());

                let (_ray, weight) = camera.generate_ray(&sample);
                n_rays += 1;
                total_weight += weight;
                if weight == 0.0 {
                    n_rejected += 1;
                }
            }
        }
    }

    info!("{:<40} {:>12}", "Camera rays", n_rays);
    info!("{:<40} {:>12}", "Zero weight rays", n_rejected);
    if n_rays > 0 {
        info!(
            "{:<40} {:>12.8}",
            "Mean weight",
            total_weight / n_rays as Float
        );
    }
    camera.report();
    Ok(())
}
