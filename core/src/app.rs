//! Application related stuff

use crate::paramset::ParamSet;
use clap::Parser;

lazy_static! {
    /// The global application options.
    pub static ref OPTIONS: Options = Options::parse();
}

/// System wide options.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Options {
    /// Camera parameters.
    #[arg(
        long = "set",
        short = 's',
        value_name = "NAME=VALUE",
        help = "Set a camera parameter, e.g. --set lensModel=raytraced."
    )]
    pub params: Vec<String>,

    /// Film resolution.
    #[arg(
        long = "resolution",
        short = 'r',
        value_name = "NUM",
        num_args = 2,
        default_values_t = [64, 48],
        help = "Film resolution in pixels (width height)."
    )]
    pub resolution: Vec<usize>,

    /// Samples per pixel.
    #[arg(
        long = "spp",
        value_name = "NUM",
        default_value_t = 4,
        help = "Number of camera rays generated per pixel."
    )]
    pub spp: usize,

    /// Random sequence seed.
    #[arg(
        long = "seed",
        value_name = "NUM",
        default_value_t = 0,
        help = "Seed for the lens sample sequence."
    )]
    pub seed: u64,

    /// Suppress all text output other than error messages.
    #[arg(long, help = "Suppress all text output other than error messages.")]
    pub quiet: bool,
}

impl Options {
    /// Returns the film resolution as (width, height), falling back to a 1x1
    /// film when a dimension is zero.
    pub fn film_resolution(&self) -> (usize, usize) {
        let w = self.resolution.first().copied().unwrap_or(1);
        let h = self.resolution.get(1).copied().unwrap_or(1);
        if w == 0 || h == 0 {
            warn!("Invalid resolution {w} x {h}; using 1 x 1");
            (1, 1)
        } else {
            (w, h)
        }
    }

    /// Returns the `--set` values collected into a parameter set.
    pub fn param_set(&self) -> Result<ParamSet, String> {
        let mut ps = ParamSet::new();
        for assignment in self.params.iter() {
            ps.add_assignment(assignment)?;
        }
        Ok(ps)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
