use nalgebra::{Point2, Vector2};

pub type Real = f64;

pub type Vec2 = Vector2<Real>;
pub type Pt2 = Point2<Real>;

/// Unweighted mean of a point set. `None` for an empty slice.
pub fn mean_point(points: &[Vec2]) -> Option<Vec2> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Vec2::zeros(), |acc, p| acc + p);
    Some(sum / points.len() as Real)
}

/// Population variance per axis. Zero vector for an empty slice.
pub fn variance_per_axis(points: &[Vec2]) -> Vec2 {
    let Some(mean) = mean_point(points) else {
        return Vec2::zeros();
    };
    let n = points.len() as Real;
    let sum = points.iter().fold(Vec2::zeros(), |acc, p| {
        let d = p - mean;
        acc + d.component_mul(&d)
    });
    sum / n
}
