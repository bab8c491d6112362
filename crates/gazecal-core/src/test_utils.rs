//! Synthetic landmark frames for testing gaze extraction and calibration.
//!
//! This module is public to allow use across workspace test suites, but is
//! not intended for production use. It builds plausible full-face landmark
//! frames with controllable iris and head displacement so tests can drive
//! the extractor and the session state machine without a camera or a
//! detector.

use crate::landmarks::{Landmark, LandmarkFrame, HEAD_ANCHORS, LEFT_EYE, RIGHT_EYE};
use crate::math::{Real, Vec2};

/// Builder for synthetic full-face landmark frames.
///
/// All offsets are in normalized image coordinates (fractions of frame
/// size). The default frame is a neutral face looking straight ahead with
/// both eyes open.
#[derive(Debug, Clone)]
pub struct FaceBuilder {
    landmark_count: usize,
    iris_offset: Vec2,
    head_offset: Vec2,
    depth: Option<Real>,
}

impl Default for FaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceBuilder {
    pub fn new() -> Self {
        Self {
            landmark_count: 478,
            iris_offset: Vec2::zeros(),
            head_offset: Vec2::zeros(),
            depth: None,
        }
    }

    /// Shift both irises by a normalized offset (simulated gaze shift).
    pub fn iris_offset(mut self, offset: Vec2) -> Self {
        self.iris_offset = offset;
        self
    }

    /// Shift the whole face by a normalized offset (simulated head motion).
    pub fn head_offset(mut self, offset: Vec2) -> Self {
        self.head_offset = offset;
        self
    }

    /// Truncate the frame to the first `count` landmarks (sparse detection).
    pub fn landmark_count(mut self, count: usize) -> Self {
        self.landmark_count = count;
        self
    }

    /// Attach a uniform depth estimate to every landmark.
    pub fn uniform_depth(mut self, depth: Real) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn build(&self) -> LandmarkFrame {
        let base = Landmark::new(0.5 + self.head_offset.x, 0.55 + self.head_offset.y);
        let mut points = vec![base; self.landmark_count];

        let mut set = |idx: usize, x: Real, y: Real| {
            if idx < points.len() {
                points[idx] = Landmark::new(x + self.head_offset.x, y + self.head_offset.y);
            }
        };

        // Head anchors: nose tip, chin, face edges, forehead, jaw.
        let anchor_positions: [(Real, Real); 6] = [
            (0.50, 0.52),
            (0.50, 0.68),
            (0.35, 0.50),
            (0.65, 0.50),
            (0.50, 0.32),
            (0.50, 0.66),
        ];
        for (&idx, &(x, y)) in HEAD_ANCHORS.iter().zip(anchor_positions.iter()) {
            set(idx, x, y);
        }

        for (eye, cx) in [(&LEFT_EYE, 0.62), (&RIGHT_EYE, 0.38)] {
            let cy = 0.42;

            // Lids first, corners after, so shared corner indices keep the
            // corner position.
            for (k, &idx) in eye.upper_lid.iter().enumerate() {
                set(idx, cx - 0.03 + 0.015 * k as Real, cy - 0.025);
            }
            for (k, &idx) in eye.lower_lid.iter().enumerate() {
                set(idx, cx - 0.03 + 0.015 * k as Real, cy + 0.025);
            }
            set(eye.corners[0], cx - 0.05, cy);
            set(eye.corners[1], cx + 0.05, cy);

            for (k, &idx) in eye.center_region.iter().enumerate() {
                let (dx, dy) = RING[k % RING.len()];
                set(idx, cx + dx, cy + dy);
            }
        }

        // Irises last: their indices overlap the opposite eye's center
        // region, and the iris position must win.
        for (eye, cx) in [(&LEFT_EYE, 0.62), (&RIGHT_EYE, 0.38)] {
            let cy = 0.42;
            for (k, &idx) in eye.iris.iter().enumerate() {
                let (dx, dy) = RING[k % RING.len()];
                set(
                    idx,
                    cx + dx + self.iris_offset.x,
                    cy + dy + self.iris_offset.y,
                );
            }
        }

        if let Some(z) = self.depth {
            for p in &mut points {
                p.z = Some(z);
            }
        }

        LandmarkFrame::new(points)
    }
}

const RING: [(Real, Real); 4] = [(0.008, 0.0), (-0.008, 0.0), (0.0, 0.008), (0.0, -0.008)];
