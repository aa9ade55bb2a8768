//! Dense row-major matrix used to hold feature vectors for the solver.
pub mod matrix;

pub use matrix::{Array2, ShapeError};
