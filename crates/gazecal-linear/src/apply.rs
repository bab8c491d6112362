//! Application of a fitted transformation to new eye observations.

use gazecal_core::{Real, Vec2};

use crate::model::{TransformKind, TransformModel};

fn normalize(model: &TransformModel, eye: Vec2) -> Vec2 {
    let [mx, my] = model.normalization.eye_mean;
    let [sx, sy] = model.normalization.eye_std;
    Vec2::new((eye.x - mx) / sx, (eye.y - my) / sy)
}

/// Design row matching the model's kind; unused terms stay zero.
fn design_row(kind: TransformKind, p: Vec2) -> [Real; 6] {
    match kind {
        TransformKind::Linear => [1.0, p.x, p.y, 0.0, 0.0, 0.0],
        TransformKind::Polynomial => [1.0, p.x, p.y, p.x * p.x, p.y * p.y, p.x * p.y],
    }
}

/// Map one eye-space point to screen pixels.
pub fn apply(model: &TransformModel, eye: Vec2) -> Vec2 {
    let row = design_row(model.transformation_type, normalize(model, eye));
    let x = row
        .iter()
        .zip(model.x_coeffs.iter())
        .map(|(r, c)| r * c)
        .sum();
    let y = row
        .iter()
        .zip(model.y_coeffs.iter())
        .map(|(r, c)| r * c)
        .sum();
    Vec2::new(x, y)
}

/// Map a batch of eye-space points to screen pixels.
pub fn apply_batch(model: &TransformModel, eye: &[Vec2]) -> Vec<Vec2> {
    eye.iter().map(|&p| apply(model, p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Accuracy, Normalization, COEFF_LEN};

    fn identity_ish_model(kind: TransformKind) -> TransformModel {
        let mut x_coeffs = [0.0; COEFF_LEN];
        let mut y_coeffs = [0.0; COEFF_LEN];
        // screen = 100 + 50 * normalized coordinate
        x_coeffs[0] = 100.0;
        x_coeffs[1] = 50.0;
        y_coeffs[0] = 100.0;
        y_coeffs[2] = 50.0;
        TransformModel {
            x_coeffs,
            y_coeffs,
            eye_data: Vec::new(),
            screen_data: Vec::new(),
            normalization: Normalization {
                eye_mean: [320.0, 240.0],
                eye_std: [10.0, 10.0],
            },
            transformation_type: kind,
            accuracy: Accuracy {
                rmse_x: 0.0,
                rmse_y: 0.0,
                total_rmse: 0.0,
            },
        }
    }

    #[test]
    fn linear_model_ignores_padded_terms() {
        let mut model = identity_ish_model(TransformKind::Linear);
        // Garbage in the padded slots must not affect a linear model.
        model.x_coeffs[3] = 1e9;
        model.y_coeffs[5] = -1e9;

        let p = apply(&model, Vec2::new(330.0, 250.0));
        assert!((p.x - 150.0).abs() < 1e-9);
        assert!((p.y - 150.0).abs() < 1e-9);
    }

    #[test]
    fn polynomial_model_uses_higher_terms() {
        let mut model = identity_ish_model(TransformKind::Polynomial);
        model.x_coeffs[3] = 10.0; // + 10·x²

        let p = apply(&model, Vec2::new(340.0, 240.0)); // normalized x = 2
        assert!((p.x - (100.0 + 50.0 * 2.0 + 10.0 * 4.0)).abs() < 1e-9);
    }

    #[test]
    fn batch_matches_single_application() {
        let model = identity_ish_model(TransformKind::Linear);
        let points = vec![
            Vec2::new(320.0, 240.0),
            Vec2::new(300.0, 250.0),
            Vec2::new(345.0, 228.0),
        ];
        let batch = apply_batch(&model, &points);
        assert_eq!(batch.len(), points.len());
        for (p, b) in points.iter().zip(&batch) {
            assert_eq!(apply(&model, *p), *b);
        }
    }

    #[test]
    fn mean_point_maps_to_intercept() {
        let model = identity_ish_model(TransformKind::Linear);
        let p = apply(&model, Vec2::new(320.0, 240.0));
        assert_eq!(p, Vec2::new(100.0, 100.0));
    }
}
