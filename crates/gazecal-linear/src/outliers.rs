//! Robust trimming of paired eye/screen observations.
//!
//! Points are scored by Euclidean distance from the per-axis median in
//! their own space; a point survives only if it sits within the 95th
//! percentile of those distances in **both** eye space and screen space.
//! Below ten points the percentile is meaningless and the filter is an
//! identity.

use log::debug;

use gazecal_core::{Real, Vec2};

/// Minimum paired sample count before trimming is attempted.
pub const MIN_POINTS_FOR_FILTER: usize = 10;

/// Distance percentile kept in each space.
pub const TRIM_PERCENTILE: Real = 95.0;

fn median(values: &mut [Real]) -> Real {
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

fn median_per_axis(points: &[Vec2]) -> Vec2 {
    let mut xs: Vec<Real> = points.iter().map(|p| p.x).collect();
    let mut ys: Vec<Real> = points.iter().map(|p| p.y).collect();
    Vec2::new(median(&mut xs), median(&mut ys))
}

/// Linearly interpolated percentile of an unsorted sample.
fn percentile(values: &[Real], pct: Real) -> Real {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = pct / 100.0 * (sorted.len() - 1) as Real;
    let lower = rank.floor() as usize;
    let frac = rank - lower as Real;
    if lower + 1 < sorted.len() {
        sorted[lower] + frac * (sorted[lower + 1] - sorted[lower])
    } else {
        sorted[lower]
    }
}

/// Remove the most extreme observations before fitting.
///
/// Returns filtered copies with index pairing preserved. Inputs shorter
/// than [`MIN_POINTS_FOR_FILTER`] are returned unchanged.
pub fn remove_outliers(eye: &[Vec2], screen: &[Vec2]) -> (Vec<Vec2>, Vec<Vec2>) {
    debug_assert_eq!(eye.len(), screen.len());

    if eye.len() < MIN_POINTS_FOR_FILTER {
        return (eye.to_vec(), screen.to_vec());
    }

    let eye_median = median_per_axis(eye);
    let screen_median = median_per_axis(screen);

    let eye_distances: Vec<Real> = eye.iter().map(|p| (p - eye_median).norm()).collect();
    let screen_distances: Vec<Real> = screen.iter().map(|p| (p - screen_median).norm()).collect();

    let eye_threshold = percentile(&eye_distances, TRIM_PERCENTILE);
    let screen_threshold = percentile(&screen_distances, TRIM_PERCENTILE);

    let mut kept_eye = Vec::with_capacity(eye.len());
    let mut kept_screen = Vec::with_capacity(screen.len());
    for i in 0..eye.len() {
        if eye_distances[i] <= eye_threshold && screen_distances[i] <= screen_threshold {
            kept_eye.push(eye[i]);
            kept_screen.push(screen[i]);
        }
    }

    debug!(
        "outlier trim: removed {} of {} points",
        eye.len() - kept_eye.len(),
        eye.len()
    );

    (kept_eye, kept_screen)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paired_cluster(n: usize) -> (Vec<Vec2>, Vec<Vec2>) {
        // Deterministic jittered cluster around (100, 100) / (500, 400).
        let mut eye = Vec::new();
        let mut screen = Vec::new();
        for i in 0..n {
            let dx = ((i * 37) % 11) as Real - 5.0;
            let dy = ((i * 53) % 13) as Real - 6.0;
            eye.push(Vec2::new(100.0 + dx, 100.0 + dy));
            screen.push(Vec2::new(500.0 + dx * 3.0, 400.0 + dy * 3.0));
        }
        (eye, screen)
    }

    #[test]
    fn short_input_is_untouched() {
        let (eye, screen) = paired_cluster(9);
        let (fe, fs) = remove_outliers(&eye, &screen);
        assert_eq!(fe, eye);
        assert_eq!(fs, screen);
    }

    #[test]
    fn keeps_pairing_and_length_invariant() {
        let (eye, screen) = paired_cluster(60);
        let (fe, fs) = remove_outliers(&eye, &screen);
        assert_eq!(fe.len(), fs.len());
        assert!(fe.len() <= eye.len());
    }

    #[test]
    fn unimodal_data_loses_at_most_a_few_points() {
        let (eye, screen) = paired_cluster(100);
        let (fe, _) = remove_outliers(&eye, &screen);
        // Each space trims ~5%; the joint filter cannot remove more than
        // the union of the two tails.
        assert!(fe.len() >= 90);
    }

    #[test]
    fn gross_outliers_are_removed() {
        let (mut eye, mut screen) = paired_cluster(50);
        eye.push(Vec2::new(5000.0, 5000.0));
        screen.push(Vec2::new(500.0, 400.0));
        eye.push(Vec2::new(100.0, 100.0));
        screen.push(Vec2::new(-9000.0, 9000.0));

        let (fe, fs) = remove_outliers(&eye, &screen);
        assert!(!fe.iter().any(|p| p.x > 1000.0));
        assert!(!fs.iter().any(|p| p.x < -1000.0));
    }

    #[test]
    fn percentile_matches_linear_interpolation() {
        let values = vec![0.0, 1.0, 2.0, 3.0];
        assert!((percentile(&values, 50.0) - 1.5).abs() < 1e-12);
        assert!((percentile(&values, 100.0) - 3.0).abs() < 1e-12);
        assert!((percentile(&values, 0.0) - 0.0).abs() < 1e-12);
    }

    #[test]
    fn median_even_and_odd() {
        let mut odd = vec![3.0, 1.0, 2.0];
        assert_eq!(median(&mut odd), 2.0);
        let mut even = vec![4.0, 1.0, 3.0, 2.0];
        assert_eq!(median(&mut even), 2.5);
    }
}
