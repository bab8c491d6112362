//! Landmark signature extraction.
//!
//! A signature summarizes fixed named landmark groups as centroid, offsets
//! from centroid, and per-axis variance, plus a derived inter-eye
//! relationship. Signatures feed the pattern-quality diagnostics stored in
//! the calibration artifact; the screen-space transform never depends on
//! them. Extraction failure yields an empty signature, not an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::landmarks::LandmarkFrame;
use crate::math::{mean_point, variance_per_axis, Real};

/// Named landmark groups summarized by a signature.
pub const SIGNATURE_GROUPS: &[(&str, &[usize])] = &[
    ("left_iris", &[474, 475, 476, 477]),
    ("left_corners", &[33, 133]),
    ("left_upper", &[159, 158, 157]),
    ("left_lower", &[144, 145, 153]),
    ("right_iris", &[469, 470, 471, 472]),
    ("right_corners", &[362, 263]),
    ("right_upper", &[386, 385, 384]),
    ("right_lower", &[373, 374, 380]),
    ("nose_tip", &[1]),
    ("face_center", &[10]),
    ("chin", &[175]),
];

/// Summary statistics for one landmark group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub centroid: [Real; 2],
    pub relative_positions: Vec<[Real; 2]>,
    pub variance: [Real; 2],
}

/// Geometric relationship between the two iris centroids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EyeRelationship {
    pub distance: Real,
    pub angle: Real,
    pub midpoint: [Real; 2],
}

/// Per-frame signature over the fixed landmark groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSignature {
    pub groups: BTreeMap<String, GroupStats>,
    pub eye_relationship: Option<EyeRelationship>,
}

impl LandmarkSignature {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Extract a signature from a frame. Groups whose landmarks are all missing
/// are omitted; a frame with no resolvable groups yields an empty signature.
pub fn extract_signature(frame: &LandmarkFrame, width: Real, height: Real) -> LandmarkSignature {
    let mut signature = LandmarkSignature::default();

    for (name, indices) in SIGNATURE_GROUPS {
        let points = frame.gather(indices, width, height);
        let Some(centroid) = mean_point(&points) else {
            continue;
        };
        let variance = variance_per_axis(&points);
        let relative_positions = points
            .iter()
            .map(|p| [p.x - centroid.x, p.y - centroid.y])
            .collect();

        signature.groups.insert(
            (*name).to_string(),
            GroupStats {
                centroid: [centroid.x, centroid.y],
                relative_positions,
                variance: [variance.x, variance.y],
            },
        );
    }

    if let (Some(left), Some(right)) = (
        signature.groups.get("left_iris"),
        signature.groups.get("right_iris"),
    ) {
        let dx = right.centroid[0] - left.centroid[0];
        let dy = right.centroid[1] - left.centroid[1];
        signature.eye_relationship = Some(EyeRelationship {
            distance: (dx * dx + dy * dy).sqrt(),
            angle: dy.atan2(dx),
            midpoint: [
                (left.centroid[0] + right.centroid[0]) / 2.0,
                (left.centroid[1] + right.centroid[1]) / 2.0,
            ],
        });
    }

    signature
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::LandmarkFrame;
    use crate::test_utils::FaceBuilder;

    #[test]
    fn full_face_resolves_all_groups() {
        let frame = FaceBuilder::new().build();
        let sig = extract_signature(&frame, 640.0, 480.0);
        assert_eq!(sig.groups.len(), SIGNATURE_GROUPS.len());
        assert!(sig.eye_relationship.is_some());
    }

    #[test]
    fn eye_relationship_distance_is_positive() {
        let frame = FaceBuilder::new().build();
        let sig = extract_signature(&frame, 640.0, 480.0);
        let rel = sig.eye_relationship.unwrap();
        assert!(rel.distance > 0.0);
    }

    #[test]
    fn empty_frame_yields_empty_signature() {
        let sig = extract_signature(&LandmarkFrame::new(Vec::new()), 640.0, 480.0);
        assert!(sig.is_empty());
        assert!(sig.eye_relationship.is_none());
    }

    #[test]
    fn relative_positions_sum_to_zero() {
        let frame = FaceBuilder::new().build();
        let sig = extract_signature(&frame, 640.0, 480.0);
        let iris = &sig.groups["left_iris"];
        let sum: [Real; 2] = iris.relative_positions.iter().fold([0.0, 0.0], |acc, p| {
            [acc[0] + p[0], acc[1] + p[1]]
        });
        assert!(sum[0].abs() < 1e-9);
        assert!(sum[1].abs() < 1e-9);
    }

    #[test]
    fn signature_serializes_deterministically() {
        let frame = FaceBuilder::new().build();
        let sig = extract_signature(&frame, 640.0, 480.0);
        let a = serde_json::to_string(&sig).unwrap();
        let b = serde_json::to_string(&sig).unwrap();
        assert_eq!(a, b);
    }
}
