//! The fitted eye-to-screen transformation model.

use serde::{Deserialize, Serialize};

use gazecal_core::Real;

/// Uniform coefficient vector length shared by both model kinds. Linear
/// models zero-pad the three unused higher-order terms.
pub const COEFF_LEN: usize = 6;

/// Which design-matrix shape a model was fit with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    /// Design columns `[1, x, y]`.
    Linear,
    /// Design columns `[1, x, y, x², y², xy]`.
    Polynomial,
}

/// Per-axis normalization statistics captured at fit time.
///
/// `eye_std` already carries the `1e-8` stabilizer added during fitting, so
/// application divides by it directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub eye_mean: [Real; 2],
    pub eye_std: [Real; 2],
}

/// Training-set accuracy of a fitted model, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accuracy {
    pub rmse_x: Real,
    pub rmse_y: Real,
    pub total_rmse: Real,
}

/// A fitted transformation from normalized eye space to screen pixels.
///
/// Immutable once fit. The retained training pairs are diagnostic; only the
/// coefficients, normalization, and kind are needed to map new points.
/// The serde layout matches the `transformation_matrix` object of the
/// persisted calibration artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformModel {
    pub x_coeffs: [Real; COEFF_LEN],
    pub y_coeffs: [Real; COEFF_LEN],
    pub eye_data: Vec<[Real; 2]>,
    pub screen_data: Vec<[Real; 2]>,
    pub normalization: Normalization,
    pub transformation_type: TransformKind,
    pub accuracy: Accuracy,
}
