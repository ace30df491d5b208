use crate::detection::SnapshotPair;
use crate::persistence::DEFAULT_CALIBRATION_PATH;
use crate::volume::EstimatorOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Input of the `volume_report` tool.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeReportConfig {
    #[serde(default = "default_calibration")]
    pub calibration: PathBuf,
    /// Site config; supplies the truck-bed height when the estimator
    /// options leave it unset.
    #[serde(default)]
    pub site: Option<PathBuf>,
    pub detections: DetectionSource,
    #[serde(default)]
    pub estimator: EstimatorOptions,
    #[serde(default)]
    pub output: ReportOutputConfig,
}

/// Where the per-camera detection figures come from.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DetectionSource {
    /// Stats document as published by the detector.
    Stats(PathBuf),
    /// Per-object mask images for each camera.
    Masks(MaskSources),
    /// Figures given directly in the config.
    Inline(SnapshotPair),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MaskSources {
    pub fps: f64,
    pub camera1: Vec<PathBuf>,
    pub camera2: Vec<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportOutputConfig {
    pub report_json: Option<PathBuf>,
}

fn default_calibration() -> PathBuf {
    PathBuf::from(DEFAULT_CALIBRATION_PATH)
}

pub fn load_config(path: &Path) -> Result<VolumeReportConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}
