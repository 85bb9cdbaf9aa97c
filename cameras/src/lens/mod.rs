//! Lens Stack

mod calibration;
mod element;
mod stack;

// Re-export
pub use calibration::*;
pub use element::*;
pub use stack::*;
