//! Closed-form fitting of the eye-to-screen transformation.
//!
//! This crate turns paired (eye, screen) observations into a
//! [`TransformModel`](model::TransformModel):
//! robust percentile trimming, ridge-regularized linear/quadratic design
//! matrices, model selection, and application of a fitted model to new
//! observations. All solves are closed-form double-precision normal
//! equations; the regularization term keeps them well-conditioned, so there
//! is no iterative solver and no observable singular-matrix failure mode.

mod apply;
mod fit;
mod model;
mod outliers;
mod ridge;

pub use apply::*;
pub use fit::*;
pub use model::*;
pub use outliers::*;
pub use ridge::*;
