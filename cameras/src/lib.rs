//! Lens Cameras

#[macro_use]
extern crate log;
#[macro_use]
extern crate pest_derive;

mod bokeh;
mod camera;
mod counters;
mod error;
mod exit_pupil;
mod lens;
mod optics;
mod parser;
mod settings;

// Re-export
pub use bokeh::*;
pub use camera::*;
pub use counters::*;
pub use error::*;
pub use exit_pupil::*;
pub use lens::*;
pub use optics::*;
pub use parser::*;
pub use settings::*;
