//! Landmark-pattern diagnostics collected alongside calibration samples.
//!
//! Every accepted sample records the landmark signature seen while the
//! user fixated the active target. Completed targets get an averaged
//! signature with a consistency score, and samples are additionally bucketed
//! into a 5×5 screen-region map. All of it is diagnostic payload for the
//! persisted artifact; the screen-space transform never reads it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use gazecal_core::{LandmarkSignature, Real, Vec2};

/// Screen regions per axis for the region bucket keys.
const REGION_DIVISIONS: i64 = 5;

/// Targets need at least this many patterns for a data-driven consistency
/// score; below it a neutral 0.5 is reported.
const MIN_PATTERNS_FOR_QUALITY: usize = 3;

/// One accepted sample's diagnostic record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkPattern {
    pub screen_position: [Real; 2],
    pub landmark_signature: LandmarkSignature,
    pub eye_position: [Real; 2],
}

/// Group statistics averaged over a target's patterns: mean centroid and
/// the variance of the centroids across the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AveragedGroup {
    pub centroid: [Real; 2],
    pub variance: [Real; 2],
}

/// Per-target mapping from averaged landmark geometry to a screen position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointMapping {
    pub screen_position: [Real; 2],
    pub landmark_signature: BTreeMap<String, AveragedGroup>,
    pub pattern_count: usize,
    pub quality_score: Real,
}

/// Summary of mapping consistency across all completed targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingQuality {
    pub average_quality: Real,
    pub min_quality: Real,
    pub max_quality: Real,
    pub total_mappings: usize,
}

/// Accumulates patterns, region buckets, and per-target mappings over a
/// calibration session.
#[derive(Debug, Clone, Default)]
pub struct PatternRecorder {
    patterns: Vec<LandmarkPattern>,
    regions: BTreeMap<String, Vec<usize>>,
    mappings: BTreeMap<String, PointMapping>,
}

/// Region bucket key for a screen position on a 5×5 grid, clamped at the
/// edges.
pub fn region_key(position: Vec2, screen_w: u32, screen_h: u32) -> String {
    let gx = ((position.x / (screen_w as Real / REGION_DIVISIONS as Real)) as i64)
        .clamp(0, REGION_DIVISIONS - 1);
    let gy = ((position.y / (screen_h as Real / REGION_DIVISIONS as Real)) as i64)
        .clamp(0, REGION_DIVISIONS - 1);
    format!("region_{gx}_{gy}")
}

impl PatternRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Record one accepted sample.
    pub fn record(
        &mut self,
        screen_position: Vec2,
        signature: LandmarkSignature,
        eye_position: Vec2,
        screen_w: u32,
        screen_h: u32,
    ) {
        let index = self.patterns.len();
        self.patterns.push(LandmarkPattern {
            screen_position: [screen_position.x, screen_position.y],
            landmark_signature: signature,
            eye_position: [eye_position.x, eye_position.y],
        });
        self.regions
            .entry(region_key(screen_position, screen_w, screen_h))
            .or_default()
            .push(index);
    }

    /// Build the averaged mapping for a completed target.
    pub fn finalize_point(&mut self, point_index: usize, screen_position: Vec2) {
        let matching: Vec<&LandmarkPattern> = self
            .patterns
            .iter()
            .filter(|p| {
                (p.screen_position[0] - screen_position.x).abs() <= 10.0
                    && (p.screen_position[1] - screen_position.y).abs() <= 10.0
            })
            .collect();
        if matching.is_empty() {
            return;
        }

        let averaged = average_signatures(&matching);
        let quality = pattern_quality(&matching);
        self.mappings.insert(
            format!("point_{point_index}"),
            PointMapping {
                screen_position: [screen_position.x, screen_position.y],
                landmark_signature: averaged,
                pattern_count: matching.len(),
                quality_score: quality,
            },
        );
    }

    pub fn mappings(&self) -> &BTreeMap<String, PointMapping> {
        &self.mappings
    }

    pub fn patterns(&self) -> &[LandmarkPattern] {
        &self.patterns
    }

    /// Region buckets with materialized pattern lists, for persistence.
    pub fn region_patterns(&self) -> BTreeMap<String, Vec<LandmarkPattern>> {
        self.regions
            .iter()
            .map(|(key, indices)| {
                (
                    key.clone(),
                    indices.iter().map(|&i| self.patterns[i].clone()).collect(),
                )
            })
            .collect()
    }

    /// Consistency summary across all completed targets.
    pub fn mapping_quality(&self) -> MappingQuality {
        let scores: Vec<Real> = self.mappings.values().map(|m| m.quality_score).collect();
        if scores.is_empty() {
            return MappingQuality::default();
        }
        MappingQuality {
            average_quality: scores.iter().sum::<Real>() / scores.len() as Real,
            min_quality: scores.iter().cloned().fold(Real::INFINITY, Real::min),
            max_quality: scores.iter().cloned().fold(Real::NEG_INFINITY, Real::max),
            total_mappings: scores.len(),
        }
    }

    pub fn reset(&mut self) {
        self.patterns.clear();
        self.regions.clear();
        self.mappings.clear();
    }
}

/// Average group centroids over signatures, keeping only groups present in
/// every signature of the window.
fn average_signatures(patterns: &[&LandmarkPattern]) -> BTreeMap<String, AveragedGroup> {
    let mut averaged = BTreeMap::new();
    let Some(first) = patterns.first() else {
        return averaged;
    };

    for name in first.landmark_signature.groups.keys() {
        let centroids: Vec<[Real; 2]> = patterns
            .iter()
            .filter_map(|p| p.landmark_signature.groups.get(name))
            .map(|g| g.centroid)
            .collect();
        if centroids.len() != patterns.len() {
            continue; // group missing from part of the window
        }

        let n = centroids.len() as Real;
        let mean = centroids.iter().fold([0.0, 0.0], |acc, c| {
            [acc[0] + c[0] / n, acc[1] + c[1] / n]
        });
        let variance = centroids.iter().fold([0.0, 0.0], |acc, c| {
            let dx = c[0] - mean[0];
            let dy = c[1] - mean[1];
            [acc[0] + dx * dx / n, acc[1] + dy * dy / n]
        });

        averaged.insert(
            name.clone(),
            AveragedGroup {
                centroid: mean,
                variance,
            },
        );
    }

    averaged
}

/// Consistency of the eye positions in a target's window: the tighter the
/// cluster, the closer to 1.
fn pattern_quality(patterns: &[&LandmarkPattern]) -> Real {
    if patterns.len() < MIN_PATTERNS_FOR_QUALITY {
        return 0.5;
    }
    let eye_points: Vec<Vec2> = patterns
        .iter()
        .map(|p| Vec2::new(p.eye_position[0], p.eye_position[1]))
        .collect();
    let var = gazecal_core::variance_per_axis(&eye_points);
    let consistency = 1.0 / (1.0 + (var.x + var.y) / 2.0);
    consistency.clamp(0.0, 1.0)
}
