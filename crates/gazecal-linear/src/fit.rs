//! Transformation fitting with linear/polynomial model selection.
//!
//! # Algorithm Overview
//!
//! 1. Normalize eye points per axis: `(p − mean) / (std + 1e-8)`.
//! 2. Fit the linear model `[1, x, y]` with ridge α = 0.1, one solve per
//!    screen axis, and measure the mean Euclidean training error.
//! 3. Attempt the quadratic model `[1, x, y, x², y², xy]` (ridge α = 1.0,
//!    heavier because of the extra flexibility) only when there are at
//!    least 50 points **and** the linear error exceeds 80 px.
//! 4. Keep the quadratic fit only when its error is under 80% of the
//!    linear error; otherwise keep linear with zero-padded coefficients so
//!    both kinds share one schema.
//! 5. Report training-set RMSE per axis and combined.
//!
//! # Limitations
//!
//! Errors are measured on the training set; with sparse data the selection
//! gate, not a held-out split, is what guards against overfitting.

use log::{debug, warn};
use nalgebra::DVector;
use thiserror::Error;

use gazecal_core::{Real, Vec2};

use crate::apply::apply_batch;
use crate::model::{Accuracy, Normalization, TransformKind, TransformModel, COEFF_LEN};
use crate::ridge::{design_linear, design_quadratic, ridge_solve, RegressionError, LINEAR_TERMS};

/// Absolute minimum paired samples for a solvable fit.
pub const MIN_FIT_POINTS: usize = 3;

#[derive(Debug, Error, Clone, Copy)]
pub enum FitError {
    #[error("need at least {MIN_FIT_POINTS} paired samples to fit, got {0}")]
    NotEnoughPoints(usize),
    #[error(transparent)]
    Regression(#[from] RegressionError),
}

/// Options controlling transformation fitting and model selection.
#[derive(Debug, Clone, Copy)]
pub struct FitOptions {
    /// Ridge strength for the linear model.
    pub linear_ridge: Real,

    /// Ridge strength for the quadratic model. Heavier than the linear
    /// term: six free parameters overfit sparse gaze data quickly.
    pub quadratic_ridge: Real,

    /// Minimum sample count before a quadratic fit is attempted.
    pub poly_min_points: usize,

    /// Linear mean error (px) that must be exceeded before a quadratic fit
    /// is attempted.
    pub poly_error_gate: Real,

    /// The quadratic fit wins only when its mean error is below this
    /// fraction of the linear error.
    pub poly_improvement: Real,

    /// Below this sample count the fit proceeds but logs a warning.
    pub sparse_warning: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            linear_ridge: 0.1,
            quadratic_ridge: 1.0,
            poly_min_points: 50,
            poly_error_gate: 80.0,
            poly_improvement: 0.8,
            sparse_warning: 20,
        }
    }
}

fn mean_euclidean_error(predicted: &[Vec2], actual: &[Vec2]) -> Real {
    let n = predicted.len() as Real;
    predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).norm())
        .sum::<Real>()
        / n
}

fn axis_column(points: &[Vec2], axis: usize) -> DVector<Real> {
    DVector::from_iterator(points.len(), points.iter().map(|p| p[axis]))
}

/// Fit a transformation from already-filtered (eye, screen) pairs.
///
/// Inputs are expected to have passed outlier trimming; the fit itself only
/// refuses sample counts too small to normalize.
pub fn fit_transform(
    eye: &[Vec2],
    screen: &[Vec2],
    opts: &FitOptions,
) -> Result<TransformModel, FitError> {
    debug_assert_eq!(eye.len(), screen.len());

    let n = eye.len();
    if n < MIN_FIT_POINTS {
        return Err(FitError::NotEnoughPoints(n));
    }
    if n < opts.sparse_warning {
        warn!("fitting transformation from only {n} samples; expect poor accuracy");
    }

    // Normalization statistics; the stabilizer is folded into the stored
    // std so application divides by it directly.
    let mean = eye.iter().fold(Vec2::zeros(), |acc, p| acc + p) / n as Real;
    let var = eye.iter().fold(Vec2::zeros(), |acc, p| {
        let d = p - mean;
        acc + d.component_mul(&d)
    }) / n as Real;
    let std = Vec2::new(var.x.sqrt() + 1e-8, var.y.sqrt() + 1e-8);

    let normalized: Vec<Vec2> = eye
        .iter()
        .map(|p| Vec2::new((p.x - mean.x) / std.x, (p.y - mean.y) / std.y))
        .collect();

    let a_linear = design_linear(&normalized);
    let bx = axis_column(screen, 0);
    let by = axis_column(screen, 1);

    let x_linear = ridge_solve(&a_linear, &bx, opts.linear_ridge)?;
    let y_linear = ridge_solve(&a_linear, &by, opts.linear_ridge)?;

    let linear_pred: Vec<Vec2> = normalized
        .iter()
        .map(|p| {
            Vec2::new(
                x_linear[0] + x_linear[1] * p.x + x_linear[2] * p.y,
                y_linear[0] + y_linear[1] * p.x + y_linear[2] * p.y,
            )
        })
        .collect();
    let linear_error = mean_euclidean_error(&linear_pred, screen);
    debug!("linear transformation error: {linear_error:.1} px");

    let mut x_coeffs = [0.0; COEFF_LEN];
    let mut y_coeffs = [0.0; COEFF_LEN];
    let mut kind = TransformKind::Linear;
    for i in 0..LINEAR_TERMS {
        x_coeffs[i] = x_linear[i];
        y_coeffs[i] = y_linear[i];
    }

    if n >= opts.poly_min_points && linear_error > opts.poly_error_gate {
        let a_quad = design_quadratic(&normalized);
        let x_quad = ridge_solve(&a_quad, &bx, opts.quadratic_ridge)?;
        let y_quad = ridge_solve(&a_quad, &by, opts.quadratic_ridge)?;

        let quad_pred: Vec<Vec2> = normalized
            .iter()
            .map(|p| {
                let row = [1.0, p.x, p.y, p.x * p.x, p.y * p.y, p.x * p.y];
                let px: Real = row.iter().zip(x_quad.iter()).map(|(r, c)| r * c).sum();
                let py: Real = row.iter().zip(y_quad.iter()).map(|(r, c)| r * c).sum();
                Vec2::new(px, py)
            })
            .collect();
        let quad_error = mean_euclidean_error(&quad_pred, screen);
        debug!("polynomial transformation error: {quad_error:.1} px");

        if quad_error < linear_error * opts.poly_improvement {
            kind = TransformKind::Polynomial;
            for i in 0..COEFF_LEN {
                x_coeffs[i] = x_quad[i];
                y_coeffs[i] = y_quad[i];
            }
        }
    }

    let mut model = TransformModel {
        x_coeffs,
        y_coeffs,
        eye_data: eye.iter().map(|p| [p.x, p.y]).collect(),
        screen_data: screen.iter().map(|p| [p.x, p.y]).collect(),
        normalization: Normalization {
            eye_mean: [mean.x, mean.y],
            eye_std: [std.x, std.y],
        },
        transformation_type: kind,
        accuracy: Accuracy {
            rmse_x: 0.0,
            rmse_y: 0.0,
            total_rmse: 0.0,
        },
    };

    // Training-set RMSE with the chosen model.
    let predicted = apply_batch(&model, eye);
    let (mut sx, mut sy) = (0.0, 0.0);
    for (p, s) in predicted.iter().zip(screen) {
        sx += (p.x - s.x) * (p.x - s.x);
        sy += (p.y - s.y) * (p.y - s.y);
    }
    let rmse_x = (sx / n as Real).sqrt();
    let rmse_y = (sy / n as Real).sqrt();
    model.accuracy = Accuracy {
        rmse_x,
        rmse_y,
        total_rmse: (rmse_x * rmse_x + rmse_y * rmse_y).sqrt(),
    };
    debug!(
        "fit complete: {:?}, rmse x={rmse_x:.1} y={rmse_y:.1}",
        model.transformation_type
    );

    Ok(model)
}
