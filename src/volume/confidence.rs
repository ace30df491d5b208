//! Confidence scoring of a volume estimate.
//!
//! `score = 0.40·calibration + 0.25·detection + 0.20·geometry + 0.15·consistency`,
//! every factor in `[0, 1]`.

use super::aggregate::Aggregate;
use crate::calibration::{CalibrationStore, CalibrationTier};
use crate::detection::SnapshotPair;
use crate::types::CameraId;
use serde::Serialize;

pub const CALIBRATION_WEIGHT: f64 = 0.40;
pub const DETECTION_WEIGHT: f64 = 0.25;
pub const GEOMETRY_WEIGHT: f64 = 0.20;
pub const CONSISTENCY_WEIGHT: f64 = 0.15;

/// Object count at which detection richness saturates.
pub const DETECTION_SATURATION: u32 = 15;
/// Geometry factor without any 3D calibration.
pub const DEFAULT_GEOMETRY: f64 = 0.5;
/// Consistency factor when fewer than two cameras report.
pub const DEFAULT_CONSISTENCY: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfidenceLevel {
    VeryLow,
    Low,
    Moderate,
    Good,
    High,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            ConfidenceLevel::High
        } else if score >= 0.6 {
            ConfidenceLevel::Good
        } else if score >= 0.4 {
            ConfidenceLevel::Moderate
        } else if score >= 0.2 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::VeryLow
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Good => "good",
            ConfidenceLevel::Moderate => "moderate",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::VeryLow => "very-low",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceFactors {
    pub calibration: f64,
    pub detection: f64,
    pub geometry: f64,
    pub consistency: f64,
}

impl ConfidenceFactors {
    pub fn score(&self) -> f64 {
        CALIBRATION_WEIGHT * self.calibration
            + DETECTION_WEIGHT * self.detection
            + GEOMETRY_WEIGHT * self.geometry
            + CONSISTENCY_WEIGHT * self.consistency
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceReport {
    pub score: f64,
    pub level: ConfidenceLevel,
    pub factors: ConfidenceFactors,
    pub recommendations: Vec<String>,
}

/// Tier factor: stereo 3D 1.0, single 3D 0.8, stereo 2D 0.6, single 2D 0.4,
/// nothing 0.1.
pub fn calibration_factor(store: &CalibrationStore) -> f64 {
    let full = store.cameras_at_least(CalibrationTier::Full3d).len();
    let basic = store.cameras_at_least(CalibrationTier::Basic2d).len();
    match (full, basic) {
        (2, _) => 1.0,
        (1, _) => 0.8,
        (0, 2) => 0.6,
        (0, 1) => 0.4,
        _ => 0.1,
    }
}

pub fn detection_richness(total_objects: u32) -> f64 {
    (total_objects as f64 / DETECTION_SATURATION as f64).min(1.0)
}

/// Mean quality score of the 3D-calibrated cameras.
pub fn geometry_factor(store: &CalibrationStore) -> f64 {
    let scores: Vec<f64> = store
        .cameras_at_least(CalibrationTier::Full3d)
        .into_iter()
        .filter_map(|c| store.get(c).map(|r| r.quality_score()))
        .collect();
    if scores.is_empty() {
        DEFAULT_GEOMETRY
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// Agreement of the two contributing cameras, `None` unless both report.
pub fn measured_consistency(aggregate: &Aggregate) -> Option<f64> {
    let volumes: Vec<f64> = aggregate
        .contributors()
        .map(|c| c.cubic_meters)
        .filter(|v| *v > 0.0)
        .collect();
    match volumes.as_slice() {
        [v1, v2] => {
            let avg = 0.5 * (v1 + v2);
            Some((1.0 - (v1 - v2).abs() / avg).max(0.0))
        }
        _ => None,
    }
}

pub fn assess(
    store: &CalibrationStore,
    pair: &SnapshotPair,
    aggregate: &Aggregate,
) -> ConfidenceReport {
    let objects = pair.total_objects();
    let consistency = measured_consistency(aggregate);
    let factors = ConfidenceFactors {
        calibration: calibration_factor(store),
        detection: detection_richness(objects),
        geometry: geometry_factor(store),
        consistency: consistency.unwrap_or(DEFAULT_CONSISTENCY),
    };
    let score = factors.score();
    ConfidenceReport {
        score,
        level: ConfidenceLevel::from_score(score),
        factors,
        recommendations: recommendations(store, &factors, consistency, objects),
    }
}

fn recommendations(
    store: &CalibrationStore,
    factors: &ConfidenceFactors,
    consistency: Option<f64>,
    objects: u32,
) -> Vec<String> {
    let mut out = Vec::new();
    let full = store.cameras_at_least(CalibrationTier::Full3d);
    let basic = store.cameras_at_least(CalibrationTier::Basic2d);
    if basic.is_empty() {
        out.push(
            "Calibrate at least one camera; the current figure uses a fixed pixel scale"
                .to_string(),
        );
    } else if full.is_empty() {
        out.push(
            "Add camera height and lens-to-corner distances to enable 3D calibration".to_string(),
        );
    } else if full.len() == 1 {
        out.push(format!(
            "Calibrate {} in 3D for a stereo estimate",
            full[0].other()
        ));
    }
    if factors.geometry < 0.6 && !full.is_empty() {
        out.push(
            "Re-measure the bed edges; the measured lengths disagree with the marked corners"
                .to_string(),
        );
    }
    for camera in CameraId::ALL {
        if store.get(camera).is_some_and(|r| r.degraded()) {
            out.push(format!(
                "{camera}: corners were solved with the planar fallback; \
                 check camera height and distances"
            ));
        }
    }
    if consistency.is_some_and(|c| c < 0.7) {
        out.push("Cameras disagree on the volume; verify both calibrations".to_string());
    }
    if objects < 3 {
        out.push("Very few objects detected; the estimate is unreliable".to_string());
    } else if objects < 5 {
        out.push("Few objects detected; wait until more of the load is visible".to_string());
    }
    out
}
