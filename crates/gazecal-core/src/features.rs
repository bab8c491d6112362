//! Per-eye gaze feature extraction and binocular combination.
//!
//! # Algorithm Overview
//!
//! For each eye, five fixed landmark subsets (iris, corners, upper lid,
//! lower lid, center region) are gathered in pixel space:
//!
//! 1. Iris center: depth-weighted mean of the iris landmarks with weight
//!    `1 / (|z| + 0.1)` per point; uniform when the detector provides no
//!    depth channel.
//! 2. Eye geometric center: unweighted mean over every point the five
//!    subsets resolve.
//! 3. Gaze vector: `eye_center + (iris_center − eye_center) × 3.5`. Raw
//!    iris displacement inside the socket spans only a few pixels; the
//!    amplification brings it onto a scale comparable with full-screen
//!    motion before the screen-space regression.
//!
//! The two eyes are combined by quality-weighted average when both are
//! reliable, otherwise the better eye wins alone. A frame where neither
//! eye resolves falls back to the eye-corner midpoint, then to the frame
//! center.
//!
//! # Limitations
//!
//! Quality is a coarse landmark-count heuristic, not a confidence estimate
//! from the detector. Closed eyes keep their iris-based score if the iris
//! landmarks still resolve.

use log::warn;

use crate::landmarks::{EyeIndices, LandmarkFrame, HEAD_ANCHORS, LEFT_EYE, RIGHT_EYE};
use crate::math::{mean_point, Real, Vec2};

/// Amplification applied to the iris displacement from the eye center.
pub const GAZE_SENSITIVITY: Real = 3.5;

/// Minimum resolved iris landmarks for an iris-based estimate.
pub const MIN_IRIS_POINTS: usize = 4;

/// Vertical lid separation (px) above which the eye counts as open.
pub const LID_OPEN_GAP: Real = 8.0;

/// Quality granted by a resolved iris center.
const IRIS_QUALITY: Real = 0.9;

/// Quality bonus for an open eye, capped at 1.0.
const LID_BONUS: Real = 0.1;

/// Both eyes must exceed this quality for binocular combination.
pub const COMBINE_QUALITY_THRESHOLD: Real = 0.7;

/// Derived measurements for a single eye on a single frame.
#[derive(Debug, Clone)]
pub struct EyeAnalysis {
    /// Extraction quality in `[0, 1]`.
    pub quality: Real,
    /// Amplified gaze estimate in frame pixel space.
    pub gaze_vector: Vec2,
    /// Depth-weighted iris centroid, when enough iris landmarks resolved.
    pub iris_center: Option<Vec2>,
    /// Resolved eye corner positions.
    pub eye_corners: Vec<Vec2>,
    /// Vertical separation between the lid means, when both lids resolved.
    pub lid_gap: Option<Real>,
    /// Raw (unamplified) iris displacement from the eye center.
    pub micro_movement: Option<Vec2>,
}

/// Combined best-estimate gaze for a frame.
#[derive(Debug, Clone)]
pub struct GazeEstimate {
    /// Gaze point in frame pixel space.
    pub point: Vec2,
    /// Quality of the estimate in `[0, 1]`.
    pub quality: Real,
    pub left: EyeAnalysis,
    pub right: EyeAnalysis,
}

/// Depth-weighted iris centroid. Weight `1/(|z|+0.1)` down-weights points
/// facing away from the camera; absent depth degrades to a uniform mean.
fn iris_centroid(points: &[(Vec2, Option<Real>)]) -> Option<Vec2> {
    if points.is_empty() {
        return None;
    }
    let mut sum = Vec2::zeros();
    let mut total = 0.0;
    for (p, z) in points {
        let w = 1.0 / (z.unwrap_or(0.0).abs() + 0.1);
        sum += p * w;
        total += w;
    }
    (total > 0.0).then(|| sum / total)
}

/// Unweighted mean over every point the eye's five subsets resolve.
pub fn eye_geometric_center(
    frame: &LandmarkFrame,
    eye: &EyeIndices,
    width: Real,
    height: Real,
) -> Option<Vec2> {
    let mut all = Vec::new();
    for subset in eye.all_subsets() {
        all.extend(frame.gather(subset, width, height));
    }
    mean_point(&all)
}

/// Analyze one eye region. Never fails: missing landmarks lower the
/// quality score and leave the gaze vector at the frame center.
pub fn analyze_eye(
    frame: &LandmarkFrame,
    eye: &EyeIndices,
    width: Real,
    height: Real,
) -> EyeAnalysis {
    let mut analysis = EyeAnalysis {
        quality: 0.0,
        gaze_vector: Vec2::new(width / 2.0, height / 2.0),
        iris_center: None,
        eye_corners: Vec::new(),
        lid_gap: None,
        micro_movement: None,
    };

    let iris_points = frame.gather_with_depth(eye.iris, width, height);
    if iris_points.len() >= MIN_IRIS_POINTS {
        if let (Some(iris_center), Some(center)) = (
            iris_centroid(&iris_points),
            eye_geometric_center(frame, eye, width, height),
        ) {
            let displacement = iris_center - center;
            analysis.gaze_vector = center + displacement * GAZE_SENSITIVITY;
            analysis.iris_center = Some(iris_center);
            analysis.micro_movement = Some(displacement);
            analysis.quality = IRIS_QUALITY;
        }
    }

    analysis.eye_corners = frame.gather(eye.corners, width, height);

    let upper = frame.gather(eye.upper_lid, width, height);
    let lower = frame.gather(eye.lower_lid, width, height);
    if upper.len() >= 3 && lower.len() >= 3 {
        if let (Some(upper_mean), Some(lower_mean)) = (mean_point(&upper), mean_point(&lower)) {
            let gap = lower_mean.y - upper_mean.y;
            analysis.lid_gap = Some(gap);
            if gap > LID_OPEN_GAP {
                analysis.quality = (analysis.quality + LID_BONUS).min(1.0);
            }
        }
    }

    analysis
}

/// Midpoint of the four eye-corner landmarks; the last-resort gaze estimate
/// before the frame center.
fn corner_fallback(frame: &LandmarkFrame, width: Real, height: Real) -> Option<Vec2> {
    let mut corners = frame.gather(LEFT_EYE.corners, width, height);
    corners.extend(frame.gather(RIGHT_EYE.corners, width, height));
    if corners.len() >= 2 {
        mean_point(&corners)
    } else {
        None
    }
}

/// Best-estimate gaze point for a frame.
///
/// Both eyes above the combination threshold are merged by quality-weighted
/// average; otherwise the higher-quality eye stands alone. When neither eye
/// resolves at all, the estimate cascades to the corner midpoint and then
/// the frame center.
pub fn estimate_gaze(frame: &LandmarkFrame, width: Real, height: Real) -> GazeEstimate {
    let left = analyze_eye(frame, &LEFT_EYE, width, height);
    let right = analyze_eye(frame, &RIGHT_EYE, width, height);

    let (point, quality) = if left.quality > COMBINE_QUALITY_THRESHOLD
        && right.quality > COMBINE_QUALITY_THRESHOLD
    {
        let total = left.quality + right.quality;
        let lw = left.quality / total;
        let rw = right.quality / total;
        (
            left.gaze_vector * lw + right.gaze_vector * rw,
            (left.quality + right.quality) / 2.0,
        )
    } else if left.quality > 0.0 || right.quality > 0.0 {
        if left.quality >= right.quality {
            (left.gaze_vector, left.quality)
        } else {
            (right.gaze_vector, right.quality)
        }
    } else {
        match corner_fallback(frame, width, height) {
            Some(p) => (p, 0.0),
            None => {
                warn!("gaze extraction found no usable eye landmarks; using frame center");
                (Vec2::new(width / 2.0, height / 2.0), 0.0)
            }
        }
    };

    GazeEstimate {
        point,
        quality,
        left,
        right,
    }
}

/// Head center position: mean of the fixed anchor landmarks, falling back
/// to the frame center when none resolve.
pub fn head_position(frame: &LandmarkFrame, width: Real, height: Real) -> Vec2 {
    let anchors = frame.gather(HEAD_ANCHORS, width, height);
    mean_point(&anchors).unwrap_or_else(|| Vec2::new(width / 2.0, height / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FaceBuilder;

    const W: Real = 640.0;
    const H: Real = 480.0;

    #[test]
    fn neutral_face_has_high_quality_eyes() {
        let frame = FaceBuilder::new().build();
        let est = estimate_gaze(&frame, W, H);
        assert!(est.left.quality > COMBINE_QUALITY_THRESHOLD);
        assert!(est.right.quality > COMBINE_QUALITY_THRESHOLD);
        assert!(est.quality > COMBINE_QUALITY_THRESHOLD);
    }

    #[test]
    fn gaze_stays_bounded_for_small_iris_shift() {
        // Amplified displacement must remain proportional to the shift, not
        // run away: a shift of a few normalized millipixels stays well
        // inside the frame.
        let neutral = estimate_gaze(&FaceBuilder::new().build(), W, H);
        let shifted = estimate_gaze(
            &FaceBuilder::new().iris_offset(Vec2::new(0.005, 0.0)).build(),
            W,
            H,
        );
        let moved = (shifted.point - neutral.point).norm();
        assert!(moved > 0.0);
        assert!(moved < GAZE_SENSITIVITY * 0.005 * W + 1.0);
        assert!(shifted.point.x > 0.0 && shifted.point.x < W);
        assert!(shifted.point.y > 0.0 && shifted.point.y < H);
    }

    #[test]
    fn iris_shift_moves_gaze_in_same_direction() {
        let neutral = estimate_gaze(&FaceBuilder::new().build(), W, H);
        let shifted = estimate_gaze(
            &FaceBuilder::new().iris_offset(Vec2::new(0.01, 0.004)).build(),
            W,
            H,
        );
        assert!(shifted.point.x > neutral.point.x);
        assert!(shifted.point.y > neutral.point.y);
    }

    #[test]
    fn empty_frame_falls_back_to_frame_center() {
        let frame = LandmarkFrame::new(Vec::new());
        let est = estimate_gaze(&frame, W, H);
        assert_eq!(est.point, Vec2::new(W / 2.0, H / 2.0));
        assert_eq!(est.quality, 0.0);
    }

    #[test]
    fn depth_weighting_pulls_toward_near_points() {
        // Two iris points at equal distance; the one facing the camera
        // (small |z|) should dominate the centroid.
        let pts = vec![
            (Vec2::new(0.0, 0.0), Some(0.0)),
            (Vec2::new(10.0, 0.0), Some(2.0)),
        ];
        let c = iris_centroid(&pts).unwrap();
        assert!(c.x < 5.0);

        // Without depth the same layout is a plain mean.
        let uniform = vec![
            (Vec2::new(0.0, 0.0), None),
            (Vec2::new(10.0, 0.0), None),
        ];
        let c = iris_centroid(&uniform).unwrap();
        assert!((c.x - 5.0).abs() < 1e-12);
    }

    #[test]
    fn head_position_tracks_anchor_offset() {
        let base = head_position(&FaceBuilder::new().build(), W, H);
        let moved = head_position(
            &FaceBuilder::new().head_offset(Vec2::new(0.05, 0.0)).build(),
            W,
            H,
        );
        assert!((moved.x - base.x - 0.05 * W).abs() < 1e-9);
        assert!((moved.y - base.y).abs() < 1e-9);
    }
}
