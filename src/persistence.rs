//! Versioned JSON storage of calibration records.
//!
//! ```json
//! {
//!   "version": 1,
//!   "cameras": {
//!     "camera1": {
//!       "corners": [[0.0, 0.0], [100.0, 0.0], [0.0, 60.0], [100.0, 60.0]],
//!       "pixelsPerMeter": 20.0,
//!       "edgeDistances": { "P1-P2": 5.0 },
//!       "cameraDistances": { "P1": 10.4 },
//!       "cameraHeight": 3.0
//!     }
//!   }
//! }
//! ```
//!
//! The stored `pixelsPerMeter` is informational: imports recompute the scale
//! from corners and edges so a hand-edited file cannot disagree with itself.

use crate::calibration::{CalibrationRecord, CalibrationStore, RecordParts};
use crate::error::PersistenceError;
use crate::types::{CameraId, Corner, Edge, PixelPoint};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CALIBRATION_FILE_VERSION: u32 = 1;
pub const DEFAULT_CALIBRATION_PATH: &str = "./calibration_data.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationFile {
    pub version: u32,
    #[serde(default)]
    pub cameras: BTreeMap<CameraId, PersistedRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecord {
    pub corners: Vec<PixelPoint>,
    #[serde(default)]
    pub pixels_per_meter: Option<f64>,
    #[serde(default)]
    pub edge_distances: BTreeMap<Edge, f64>,
    #[serde(default)]
    pub camera_distances: BTreeMap<Corner, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_height: Option<f64>,
    #[serde(default)]
    pub degraded: bool,
}

impl From<&CalibrationRecord> for PersistedRecord {
    fn from(record: &CalibrationRecord) -> Self {
        Self {
            corners: record.corners().to_vec(),
            pixels_per_meter: Some(record.pixels_per_meter()),
            edge_distances: record.edge_distances().clone(),
            camera_distances: record.camera_distances().clone(),
            camera_height: record.camera_height(),
            degraded: record.degraded(),
        }
    }
}

fn record_from_persisted(
    camera: CameraId,
    persisted: PersistedRecord,
) -> Result<CalibrationRecord, PersistenceError> {
    let invalid = |reason: String| PersistenceError::InvalidRecord { camera, reason };
    let corners: [PixelPoint; 4] = persisted
        .corners
        .as_slice()
        .try_into()
        .map_err(|_| invalid(format!("expected 4 corners, found {}", persisted.corners.len())))?;
    let record = CalibrationRecord::from_parts(RecordParts {
        corners,
        edge_distances: persisted.edge_distances,
        camera_distances: persisted.camera_distances,
        camera_height: persisted.camera_height,
        degraded: persisted.degraded,
    })
    .map_err(|e| invalid(e.to_string()))?;
    if let Some(stored) = persisted.pixels_per_meter {
        let fresh = record.pixels_per_meter();
        if (stored - fresh).abs() > 1e-6 * fresh.max(1.0) {
            warn!(
                "{camera}: stored pixelsPerMeter {stored:.4} differs from recomputed \
                 {fresh:.4}; using recomputed"
            );
        }
    }
    Ok(record)
}

pub fn to_file(store: &CalibrationStore) -> CalibrationFile {
    CalibrationFile {
        version: CALIBRATION_FILE_VERSION,
        cameras: store
            .iter()
            .map(|(camera, record)| (camera, PersistedRecord::from(record)))
            .collect(),
    }
}

pub fn from_file(file: CalibrationFile) -> Result<CalibrationStore, PersistenceError> {
    if file.version == 0 || file.version > CALIBRATION_FILE_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            found: file.version,
            supported: CALIBRATION_FILE_VERSION,
        });
    }
    let mut store = CalibrationStore::new();
    for (camera, persisted) in file.cameras {
        let record = record_from_persisted(camera, persisted)?;
        debug!("{camera}: imported {} calibration", record.tier().as_str());
        store.insert(camera, record);
    }
    Ok(store)
}

pub fn export_json(store: &CalibrationStore) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string_pretty(&to_file(store))?)
}

pub fn import_json(text: &str) -> Result<CalibrationStore, PersistenceError> {
    let file: CalibrationFile = serde_json::from_str(text)?;
    from_file(file)
}

/// Durable storage used by the calibration manager.
pub trait CalibrationPersistence {
    fn save(&self, store: &CalibrationStore) -> Result<(), PersistenceError>;
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<CalibrationStore>, PersistenceError>;
}

/// Calibration file on local disk.
#[derive(Clone, Debug)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl Default for JsonFilePersistence {
    fn default() -> Self {
        Self::new(DEFAULT_CALIBRATION_PATH)
    }
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CalibrationPersistence for JsonFilePersistence {
    fn save(&self, store: &CalibrationStore) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, export_json(store)?)?;
        debug!("saved {} calibration(s) to {}", store.len(), self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<Option<CalibrationStore>, PersistenceError> {
        if !self.path.exists() {
            debug!("no saved calibration at {}", self.path.display());
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?;
        import_json(&text).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_future_versions() {
        let err = import_json(r#"{"version": 7, "cameras": {}}"#).unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::UnsupportedVersion { found: 7, supported: 1 }
        ));
    }

    #[test]
    fn rejects_records_without_four_corners() {
        let text = r#"{"version":1,"cameras":{"camera2":{
            "corners":[[0,0],[1,0],[0,1]],"edgeDistances":{"P1-P2":1.0}}}}"#;
        let err = import_json(text).unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::InvalidRecord { camera: CameraId::Camera2, .. }
        ));
    }

    #[test]
    fn empty_file_imports_to_empty_store() {
        let store = import_json(r#"{"version":1}"#).unwrap();
        assert!(store.is_empty());
    }
}
