//! The persisted calibration document and the store that locates it.
//!
//! A completed session is saved as a single JSON file. Consumers only need
//! the `transformation_matrix` object to rebuild a usable
//! [`TransformModel`]; every other field is diagnostic and optional on
//! load. The store owns its search directories explicitly; there is no
//! process-wide "latest calibration" pointer.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gazecal_core::Real;
use gazecal_linear::TransformModel;

use crate::patterns::{LandmarkPattern, MappingQuality, PointMapping};

/// Filename prefix for saved calibrations.
pub const ARTIFACT_PREFIX: &str = "landmark_eye_calibration_";

/// Older filename prefix still honored by the latest-file lookup.
pub const LEGACY_PREFIX: &str = "pure_eye_calibration_";

/// Timestamp layout used in filenames and the artifact body.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read calibration file {path}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse calibration file {path}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("failed to write calibration file {path}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// The full persisted calibration document.
///
/// Only `transformation_matrix` is required on load; missing diagnostic
/// fields deserialize to their defaults so older or trimmed files remain
/// readable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationArtifact {
    pub transformation_matrix: TransformModel,
    #[serde(default)]
    pub landmark_screen_mapping: BTreeMap<String, PointMapping>,
    #[serde(default)]
    pub screen_region_landmarks: BTreeMap<String, Vec<LandmarkPattern>>,
    #[serde(default)]
    pub landmark_patterns: Vec<LandmarkPattern>,
    #[serde(default)]
    pub calibration_points: Vec<[Real; 2]>,
    #[serde(default)]
    pub screen_resolution: [u32; 2],
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub total_data_points: usize,
    #[serde(default)]
    pub calibration_type: String,
    #[serde(default)]
    pub mapping_quality: MappingQuality,
}

impl CalibrationArtifact {
    /// The transformation this artifact carries.
    pub fn model(&self) -> &TransformModel {
        &self.transformation_matrix
    }
}

/// Locates, loads, and saves calibration artifacts.
///
/// Search directories are fixed at construction. The latest-file policy
/// picks the newest modification time among files matching either filename
/// prefix across all directories; there is deliberately no per-user
/// identity check (documented limitation of the reuse-previous flow).
#[derive(Debug, Clone)]
pub struct CalibrationStore {
    search_dirs: Vec<PathBuf>,
}

impl CalibrationStore {
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    pub fn single(dir: impl Into<PathBuf>) -> Self {
        Self {
            search_dirs: vec![dir.into()],
        }
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    fn is_calibration_file(name: &str) -> bool {
        name.ends_with(".json")
            && (name.starts_with(ARTIFACT_PREFIX) || name.starts_with(LEGACY_PREFIX))
    }

    /// Newest matching calibration file across the search directories.
    pub fn latest(&self) -> Option<PathBuf> {
        let mut best: Option<(std::time::SystemTime, PathBuf)> = None;
        for dir in &self.search_dirs {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(err) => {
                    debug!("skipping calibration dir {}: {err}", dir.display());
                    continue;
                }
            };
            for entry in entries.flatten() {
                let name = entry.file_name();
                let Some(name) = name.to_str() else { continue };
                if !Self::is_calibration_file(name) {
                    continue;
                }
                let Ok(meta) = entry.metadata() else { continue };
                let Ok(mtime) = meta.modified() else { continue };
                if best.as_ref().map_or(true, |(t, _)| mtime > *t) {
                    best = Some((mtime, entry.path()));
                }
            }
        }
        best.map(|(_, path)| path)
    }

    /// Load an artifact from a specific path.
    pub fn load(&self, path: &Path) -> Result<CalibrationArtifact, ArtifactError> {
        let data = fs::read_to_string(path).map_err(|source| ArtifactError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ArtifactError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Save an artifact into the first search directory, named by its
    /// embedded timestamp. Returns the written path.
    pub fn save(&self, artifact: &CalibrationArtifact) -> Result<PathBuf, ArtifactError> {
        let dir = self
            .search_dirs
            .first()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("."));
        let path = dir.join(format!("{ARTIFACT_PREFIX}{}.json", artifact.timestamp));

        let json = serde_json::to_string_pretty(artifact).map_err(|source| {
            ArtifactError::Parse {
                path: path.display().to_string(),
                source,
            }
        })?;
        fs::write(&path, json).map_err(|source| ArtifactError::Write {
            path: path.display().to_string(),
            source,
        })?;
        debug!("calibration saved to {}", path.display());
        Ok(path)
    }
}
