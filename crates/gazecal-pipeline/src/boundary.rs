//! Gaze boundary and engagement classification.
//!
//! Predictions near the screen edge are noisy, so the viewing area is the
//! screen rectangle expanded by a 15% margin per side rather than the exact
//! bounds. Engagement is a coarse stability heuristic over the recent gaze
//! history, not a classifier with guarantees.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use gazecal_core::{variance_per_axis, Real, Vec2};
use gazecal_linear::{apply, TransformModel};

/// Margin fraction added to each screen side for boundary classification.
pub const BOUNDARY_MARGIN_FRAC: Real = 0.15;

/// Gaze-history samples considered by the engagement heuristic.
pub const ENGAGEMENT_WINDOW: usize = 10;

/// Combined x/y variance below which gaze counts as static/engaged.
pub const ENGAGEMENT_VARIANCE_LIMIT: Real = 50.0;

/// The screen rectangle expanded by the boundary margin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ViewingBounds {
    width: Real,
    height: Real,
    margin_frac: Real,
}

impl ViewingBounds {
    pub fn new(screen_w: u32, screen_h: u32) -> Self {
        Self {
            width: screen_w as Real,
            height: screen_h as Real,
            margin_frac: BOUNDARY_MARGIN_FRAC,
        }
    }

    /// Whether a predicted screen point falls inside the expanded viewing
    /// area. The margin is strictly positive, so exact screen corners are
    /// always inside.
    pub fn contains(&self, predicted: Vec2) -> bool {
        let margin_x = self.width * self.margin_frac;
        let margin_y = self.height * self.margin_frac;
        predicted.x >= -margin_x
            && predicted.x <= self.width + margin_x
            && predicted.y >= -margin_y
            && predicted.y <= self.height + margin_y
    }
}

/// Whether the recent gaze history is stable enough to count as engaged.
///
/// Fewer than [`ENGAGEMENT_WINDOW`] samples default to engaged.
pub fn is_engaged(history: &[Vec2]) -> bool {
    if history.len() < ENGAGEMENT_WINDOW {
        return true;
    }
    let recent = &history[history.len() - ENGAGEMENT_WINDOW..];
    let var = variance_per_axis(recent);
    var.x + var.y < ENGAGEMENT_VARIANCE_LIMIT
}

/// One classified gaze observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeSample {
    /// Predicted screen position.
    pub screen: Vec2,
    /// Inside the expanded viewing area.
    pub within_bounds: bool,
    /// Gaze history stable (static fixation).
    pub engaged: bool,
}

/// Applies a fitted transformation to eye observations and classifies them.
///
/// Construction requires a model: a host without a stored calibration has
/// no classifier and keeps its own permissive default instead.
#[derive(Debug, Clone)]
pub struct GazeClassifier {
    model: TransformModel,
    bounds: ViewingBounds,
    history: VecDeque<Vec2>,
}

impl GazeClassifier {
    pub fn new(model: TransformModel, screen_w: u32, screen_h: u32) -> Self {
        Self {
            model,
            bounds: ViewingBounds::new(screen_w, screen_h),
            history: VecDeque::with_capacity(ENGAGEMENT_WINDOW),
        }
    }

    pub fn model(&self) -> &TransformModel {
        &self.model
    }

    pub fn bounds(&self) -> &ViewingBounds {
        &self.bounds
    }

    /// Map one eye-space observation to screen space and classify it.
    pub fn classify(&mut self, eye: Vec2) -> GazeSample {
        let screen = apply(&self.model, eye);

        if self.history.len() == ENGAGEMENT_WINDOW {
            self.history.pop_front();
        }
        self.history.push_back(eye);
        let history: Vec<Vec2> = self.history.iter().copied().collect();

        GazeSample {
            screen,
            within_bounds: self.bounds.contains(screen),
            engaged: is_engaged(&history),
        }
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazecal_linear::{Accuracy, Normalization, TransformKind};

    fn bounds() -> ViewingBounds {
        ViewingBounds::new(1920, 1080)
    }

    #[test]
    fn screen_corners_are_within_bounds() {
        let b = bounds();
        assert!(b.contains(Vec2::new(0.0, 0.0)));
        assert!(b.contains(Vec2::new(1920.0, 1080.0)));
        assert!(b.contains(Vec2::new(0.0, 1080.0)));
    }

    #[test]
    fn margin_edge_is_inclusive_and_beyond_is_outside() {
        let b = bounds();
        let margin_x = 1920.0 * BOUNDARY_MARGIN_FRAC;
        assert!(b.contains(Vec2::new(-margin_x, 540.0)));
        assert!(!b.contains(Vec2::new(-margin_x - 1.0, 540.0)));
        let margin_y = 1080.0 * BOUNDARY_MARGIN_FRAC;
        assert!(!b.contains(Vec2::new(960.0, 1080.0 + margin_y + 1.0)));
    }

    #[test]
    fn short_history_defaults_to_engaged() {
        let history = vec![Vec2::new(100.0, 100.0); 5];
        assert!(is_engaged(&history));
    }

    #[test]
    fn static_gaze_is_engaged_and_scatter_is_not() {
        let steady = vec![Vec2::new(300.0, 200.0); 12];
        assert!(is_engaged(&steady));

        let scattered: Vec<Vec2> = (0..12)
            .map(|i| Vec2::new(300.0 + 15.0 * i as Real, 200.0))
            .collect();
        assert!(!is_engaged(&scattered));
    }

    #[test]
    fn engagement_only_considers_recent_window() {
        // Wild early samples followed by a long steady tail.
        let mut history: Vec<Vec2> = (0..5)
            .map(|i| Vec2::new(1000.0 * i as Real, 0.0))
            .collect();
        history.extend(std::iter::repeat(Vec2::new(320.0, 240.0)).take(10));
        assert!(is_engaged(&history));
    }

    #[test]
    fn classifier_tracks_history_and_bounds() {
        let model = TransformModel {
            x_coeffs: [960.0, 400.0, 0.0, 0.0, 0.0, 0.0],
            y_coeffs: [540.0, 0.0, 400.0, 0.0, 0.0, 0.0],
            eye_data: Vec::new(),
            screen_data: Vec::new(),
            normalization: Normalization {
                eye_mean: [320.0, 240.0],
                eye_std: [10.0, 10.0],
            },
            transformation_type: TransformKind::Linear,
            accuracy: Accuracy {
                rmse_x: 0.0,
                rmse_y: 0.0,
                total_rmse: 0.0,
            },
        };
        let mut classifier = GazeClassifier::new(model, 1920, 1080);

        // Center of eye space maps to screen center: inside.
        let sample = classifier.classify(Vec2::new(320.0, 240.0));
        assert_eq!(sample.screen, Vec2::new(960.0, 540.0));
        assert!(sample.within_bounds);
        assert!(sample.engaged);

        // A far-off eye position maps well past the margin: outside.
        let sample = classifier.classify(Vec2::new(400.0, 240.0));
        assert!(!sample.within_bounds);
    }
}
