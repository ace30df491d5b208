use super::camera::{CameraVolume, VolumeMethod};
use super::confidence::{ConfidenceFactors, ConfidenceLevel, ConfidenceReport};
use super::corrections::AppliedCorrections;
use crate::calibration::{CalibrationQuality, CalibrationStore, CalibrationTier};
use crate::detection::SnapshotPair;
use crate::types::CameraId;
use serde::Serialize;

pub const CUBIC_FEET_PER_CUBIC_METER: f64 = 35.3147;
pub const LITERS_PER_CUBIC_METER: f64 = 1000.0;
pub const US_GALLONS_PER_CUBIC_METER: f64 = 264.172;
pub const CUBIC_YARDS_PER_CUBIC_METER: f64 = 1.30795;

/// Volume after corrections, with everything that produced it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeEstimate {
    pub cubic_meters: f64,
    /// Aggregated volume before corrections.
    pub raw_cubic_meters: f64,
    pub method: VolumeMethod,
    pub per_camera_breakdown: Vec<CameraVolume>,
    pub stereo_weighted: bool,
    pub corrections: AppliedCorrections,
    pub confidence_score: f64,
    pub confidence_level: ConfidenceLevel,
    pub confidence_factors: ConfidenceFactors,
    pub recommendations: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeUnits {
    pub cubic_meters: f64,
    pub cubic_feet: f64,
    pub liters: f64,
    pub us_gallons: f64,
    pub cubic_yards: f64,
}

impl VolumeUnits {
    pub fn from_cubic_meters(m3: f64) -> Self {
        Self {
            cubic_meters: m3,
            cubic_feet: m3 * CUBIC_FEET_PER_CUBIC_METER,
            liters: m3 * LITERS_PER_CUBIC_METER,
            us_gallons: m3 * US_GALLONS_PER_CUBIC_METER,
            cubic_yards: m3 * CUBIC_YARDS_PER_CUBIC_METER,
        }
    }
}

/// Calibration state of one camera as shown in reports.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraCalibrationSummary {
    pub camera: CameraId,
    pub tier: CalibrationTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixels_per_meter: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bed_area_square_meters: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<CalibrationQuality>,
    pub degraded: bool,
}

impl CameraCalibrationSummary {
    pub fn of(store: &CalibrationStore, camera: CameraId) -> Self {
        let record = store.get(camera);
        Self {
            camera,
            tier: store.tier(camera),
            pixels_per_meter: record.map(|r| r.pixels_per_meter()),
            bed_area_square_meters: record.map(|r| r.bed_area_m2()),
            quality: record.and_then(|r| r.quality()),
            degraded: record.is_some_and(|r| r.degraded()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeReport {
    pub volume: VolumeUnits,
    pub estimate: VolumeEstimate,
    pub confidence: ConfidenceReport,
    pub calibration: Vec<CameraCalibrationSummary>,
    pub detection: SnapshotPair,
}

impl VolumeReport {
    /// Multi-line plain-text rendering for terminals and logs.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Volume: {:.3} m³ ({:.1} ft³, {:.0} L, {:.1} US gal, {:.3} yd³)",
            self.volume.cubic_meters,
            self.volume.cubic_feet,
            self.volume.liters,
            self.volume.us_gallons,
            self.volume.cubic_yards
        )];
        lines.push(format!(
            "Method: {:?}, confidence {:.2} ({})",
            self.estimate.method,
            self.confidence.score,
            self.confidence.level.as_str()
        ));
        for cam in &self.calibration {
            lines.push(format!(
                "{}: {}{}",
                cam.camera,
                cam.tier.as_str(),
                match cam.pixels_per_meter {
                    Some(ppm) => format!(", {ppm:.2} px/m"),
                    None => String::new(),
                }
            ));
        }
        for rec in &self.confidence.recommendations {
            lines.push(format!("- {rec}"));
        }
        lines.join("\n")
    }
}
