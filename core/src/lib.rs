//! Core

#[macro_use]
extern crate hexf;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

// Re-export.
pub mod app;
pub mod fileutil;
pub mod geometry;
pub mod image_io;
pub mod paramset;
pub mod pbrt;
pub mod rng;
pub mod sampling;
