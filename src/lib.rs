//! Animated stochastic heat field.
//!
//! Each [`Grid::update`] draws fresh noise, smooths it over a torus, nudges
//! every cell along its recent trend, blends in a ring of past frames, and
//! stores the result. [`Grid::color_buffer`] turns the latest frame into RGBA.

pub mod blend;
pub mod color;
pub mod config;
pub mod error;
pub mod grid;
pub mod noise;
pub mod smooth;
pub mod trend;

pub use config::FieldConfig;
pub use error::FieldError;
pub use grid::{FieldStats, Grid};
