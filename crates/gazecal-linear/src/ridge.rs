//! Design matrices and the ridge-regularized normal-equations solve.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use gazecal_core::{Real, Vec2};

/// Columns of the linear design matrix `[1, x, y]`.
pub const LINEAR_TERMS: usize = 3;

/// Columns of the quadratic design matrix `[1, x, y, x², y², xy]`.
pub const QUADRATIC_TERMS: usize = 6;

#[derive(Debug, Error, Clone, Copy)]
pub enum RegressionError {
    /// The regularized normal equations could not be factorized. With a
    /// positive ridge term this indicates non-finite input data.
    #[error("ridge-regularized normal equations could not be solved")]
    SolveFailed,
}

/// Linear design matrix over normalized eye coordinates.
pub fn design_linear(points: &[Vec2]) -> DMatrix<Real> {
    let mut a = DMatrix::zeros(points.len(), LINEAR_TERMS);
    for (i, p) in points.iter().enumerate() {
        a[(i, 0)] = 1.0;
        a[(i, 1)] = p.x;
        a[(i, 2)] = p.y;
    }
    a
}

/// Quadratic design matrix over normalized eye coordinates.
pub fn design_quadratic(points: &[Vec2]) -> DMatrix<Real> {
    let mut a = DMatrix::zeros(points.len(), QUADRATIC_TERMS);
    for (i, p) in points.iter().enumerate() {
        a[(i, 0)] = 1.0;
        a[(i, 1)] = p.x;
        a[(i, 2)] = p.y;
        a[(i, 3)] = p.x * p.x;
        a[(i, 4)] = p.y * p.y;
        a[(i, 5)] = p.x * p.y;
    }
    a
}

/// Solve `(AᵀA + αI) c = Aᵀ b` for the coefficient vector `c`.
///
/// The Tikhonov term makes the system symmetric positive definite for any
/// `alpha > 0`, so the Cholesky factorization is the whole solver.
pub fn ridge_solve(
    a: &DMatrix<Real>,
    b: &DVector<Real>,
    alpha: Real,
) -> Result<DVector<Real>, RegressionError> {
    let at = a.transpose();
    let mut ata = &at * a;
    for i in 0..ata.nrows() {
        ata[(i, i)] += alpha;
    }
    let atb = &at * b;

    ata.cholesky()
        .map(|chol| chol.solve(&atb))
        .ok_or(RegressionError::SolveFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_linear_relation() {
        // screen_x = 10 + 3x + 2y, sampled on a grid.
        let mut points = Vec::new();
        let mut targets = Vec::new();
        for ix in 0..8 {
            for iy in 0..8 {
                let p = Vec2::new(ix as Real - 3.5, iy as Real - 3.5);
                points.push(p);
                targets.push(10.0 + 3.0 * p.x + 2.0 * p.y);
            }
        }

        let a = design_linear(&points);
        let b = DVector::from_vec(targets);
        let c = ridge_solve(&a, &b, 0.1).unwrap();

        // Ridge shrinkage keeps coefficients close to, not exactly at, the
        // generating values.
        assert!((c[0] - 10.0).abs() < 0.1);
        assert!((c[1] - 3.0).abs() < 0.05);
        assert!((c[2] - 2.0).abs() < 0.05);
    }

    #[test]
    fn quadratic_design_has_cross_term() {
        let a = design_quadratic(&[Vec2::new(2.0, 3.0)]);
        assert_eq!(a[(0, 0)], 1.0);
        assert_eq!(a[(0, 3)], 4.0);
        assert_eq!(a[(0, 4)], 9.0);
        assert_eq!(a[(0, 5)], 6.0);
    }

    #[test]
    fn solve_is_deterministic() {
        let points = vec![
            Vec2::new(-1.0, 0.5),
            Vec2::new(0.0, -0.5),
            Vec2::new(1.0, 0.25),
            Vec2::new(0.5, 1.0),
        ];
        let b = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        let a = design_linear(&points);

        let c1 = ridge_solve(&a, &b, 0.1).unwrap();
        let c2 = ridge_solve(&a, &b, 0.1).unwrap();
        assert_eq!(c1, c2);
    }

    #[test]
    fn regularization_handles_degenerate_data() {
        // All points identical: AᵀA is singular, but the ridge term keeps
        // the factorization valid.
        let points = vec![Vec2::new(1.0, 1.0); 5];
        let b = DVector::from_element(5, 7.0);
        let a = design_linear(&points);
        assert!(ridge_solve(&a, &b, 0.1).is_ok());
    }
}
