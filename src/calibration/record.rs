use super::measurements::is_valid_measurement;
use super::scale::{estimate_scale, rate_quality, ScaleEstimate};
use crate::error::{CalibrationError, InputValidationError};
use crate::geometry::{polygon_area, quad_cyclic};
use crate::types::{Corner, Edge, Measurement, PixelPoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Derived calibration level; ordered so that `Full3d > Basic2d > Uncalibrated`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CalibrationTier {
    #[serde(rename = "UNCALIBRATED")]
    Uncalibrated,
    #[serde(rename = "BASIC_2D")]
    Basic2d,
    #[serde(rename = "FULL_3D")]
    Full3d,
}

impl CalibrationTier {
    pub fn as_str(self) -> &'static str {
        match self {
            CalibrationTier::Uncalibrated => "UNCALIBRATED",
            CalibrationTier::Basic2d => "BASIC_2D",
            CalibrationTier::Full3d => "FULL_3D",
        }
    }
}

/// Agreement of the measured edges with the pixel geometry.
/// Ordered from worst to best.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl CalibrationQuality {
    /// Score used by the confidence model and stereo weighting.
    pub fn score(self) -> f64 {
        match self {
            CalibrationQuality::Excellent => 1.0,
            CalibrationQuality::Good => 0.8,
            CalibrationQuality::Fair => 0.6,
            CalibrationQuality::Poor => 0.3,
        }
    }
}

/// Score of a calibration that could not be rated.
pub const UNRATED_QUALITY_SCORE: f64 = 0.5;

/// Everything a finished session (or an imported file) knows about a camera.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordParts {
    pub corners: [PixelPoint; 4],
    pub edge_distances: BTreeMap<Edge, f64>,
    pub camera_distances: BTreeMap<Corner, f64>,
    pub camera_height: Option<f64>,
    pub degraded: bool,
}

/// Finalized per-camera calibration.
///
/// Only constructed through [`CalibrationRecord::from_parts`], which derives
/// the scale from the corners and edges, so a record always has four finite
/// corners and a positive pixels-per-meter value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationRecord {
    corners: [PixelPoint; 4],
    edge_distances: BTreeMap<Edge, f64>,
    camera_distances: BTreeMap<Corner, f64>,
    camera_height: Option<f64>,
    pixels_per_meter: f64,
    quality: Option<CalibrationQuality>,
    degraded: bool,
}

impl CalibrationRecord {
    pub fn from_parts(parts: RecordParts) -> Result<Self, CalibrationError> {
        for (i, p) in parts.corners.iter().enumerate() {
            if !p[0].is_finite() || !p[1].is_finite() {
                return Err(CalibrationError::NonFinite(format!(
                    "corner P{} = ({}, {})",
                    i + 1,
                    p[0],
                    p[1]
                )));
            }
        }
        if let Some(h) = parts.camera_height {
            if !is_valid_measurement(h) {
                return Err(InputValidationError {
                    measurement: Measurement::CameraHeight,
                    value: h,
                }
                .into());
            }
        }
        for (corner, d) in &parts.camera_distances {
            if !is_valid_measurement(*d) {
                return Err(InputValidationError {
                    measurement: Measurement::CameraDistance(*corner),
                    value: *d,
                }
                .into());
            }
        }
        let scale = estimate_scale(&parts.corners, &parts.edge_distances)?;
        Ok(Self::with_scale(parts, &scale))
    }

    fn with_scale(parts: RecordParts, scale: &ScaleEstimate) -> Self {
        Self {
            corners: parts.corners,
            edge_distances: parts.edge_distances,
            camera_distances: parts.camera_distances,
            camera_height: parts.camera_height,
            pixels_per_meter: scale.pixels_per_meter,
            quality: rate_quality(scale, parts.degraded),
            degraded: parts.degraded,
        }
    }

    pub fn tier(&self) -> CalibrationTier {
        if self.has_3d() {
            CalibrationTier::Full3d
        } else {
            CalibrationTier::Basic2d
        }
    }

    /// Basic calibration holds for every constructed record.
    #[inline]
    pub fn has_basic(&self) -> bool {
        self.pixels_per_meter.is_finite() && self.pixels_per_meter > 0.0
    }

    pub fn has_3d(&self) -> bool {
        self.has_basic()
            && self.camera_height.is_some()
            && Corner::ALL
                .iter()
                .all(|c| self.camera_distances.contains_key(c))
    }

    #[inline]
    pub fn corners(&self) -> &[PixelPoint; 4] {
        &self.corners
    }

    pub fn corner(&self, corner: Corner) -> PixelPoint {
        self.corners[corner.index()]
    }

    #[inline]
    pub fn pixels_per_meter(&self) -> f64 {
        self.pixels_per_meter
    }

    pub fn edge_distances(&self) -> &BTreeMap<Edge, f64> {
        &self.edge_distances
    }

    pub fn camera_distances(&self) -> &BTreeMap<Corner, f64> {
        &self.camera_distances
    }

    pub fn camera_height(&self) -> Option<f64> {
        self.camera_height
    }

    pub fn quality(&self) -> Option<CalibrationQuality> {
        self.quality
    }

    pub fn quality_score(&self) -> f64 {
        self.quality
            .map(CalibrationQuality::score)
            .unwrap_or(UNRATED_QUALITY_SCORE)
    }

    /// True when some corner came from the planar fallback of the 3D solver.
    pub fn degraded(&self) -> bool {
        self.degraded
    }

    /// Shoelace area of the bed polygon in the cyclic order P1, P2, P4, P3.
    pub fn polygon_area_px(&self) -> f64 {
        polygon_area(&quad_cyclic(&self.corners))
    }

    pub fn bed_area_m2(&self) -> f64 {
        self.polygon_area_px() / (self.pixels_per_meter * self.pixels_per_meter)
    }

    /// Mean lens-to-corner distance, when any distance was measured.
    pub fn average_camera_distance(&self) -> Option<f64> {
        if self.camera_distances.is_empty() {
            return None;
        }
        let sum: f64 = self.camera_distances.values().sum();
        Some(sum / self.camera_distances.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_parts() -> RecordParts {
        let mut edges = BTreeMap::new();
        edges.insert(Edge::P1_P2, 1.0);
        edges.insert(Edge::P1_P3, 1.0);
        RecordParts {
            corners: [[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0]],
            edge_distances: edges,
            ..Default::default()
        }
    }

    #[test]
    fn basic_record_has_scale_and_area() {
        let rec = CalibrationRecord::from_parts(square_parts()).unwrap();
        assert_eq!(rec.tier(), CalibrationTier::Basic2d);
        assert!((rec.pixels_per_meter() - 10.0).abs() < 1e-12);
        assert!((rec.polygon_area_px() - 100.0).abs() < 1e-12);
        assert!((rec.bed_area_m2() - 1.0).abs() < 1e-12);
        assert_eq!(rec.quality(), Some(CalibrationQuality::Excellent));
        assert!(rec.average_camera_distance().is_none());
    }

    #[test]
    fn height_and_all_distances_make_full_3d() {
        let mut parts = square_parts();
        parts.camera_height = Some(3.0);
        for (i, c) in Corner::ALL.iter().enumerate() {
            parts.camera_distances.insert(*c, 5.0 + i as f64);
        }
        let rec = CalibrationRecord::from_parts(parts.clone()).unwrap();
        assert_eq!(rec.tier(), CalibrationTier::Full3d);
        assert!((rec.average_camera_distance().unwrap() - 6.5).abs() < 1e-12);

        parts.camera_distances.remove(&Corner::P4);
        let partial = CalibrationRecord::from_parts(parts).unwrap();
        assert_eq!(partial.tier(), CalibrationTier::Basic2d);
    }

    #[test]
    fn non_finite_corner_is_rejected() {
        let mut parts = square_parts();
        parts.corners[3] = [f64::NAN, 1.0];
        assert!(matches!(
            CalibrationRecord::from_parts(parts),
            Err(CalibrationError::NonFinite(_))
        ));
    }

    #[test]
    fn tiers_are_ordered() {
        assert!(CalibrationTier::Full3d > CalibrationTier::Basic2d);
        assert!(CalibrationTier::Basic2d > CalibrationTier::Uncalibrated);
        assert_eq!(
            serde_json::to_string(&CalibrationTier::Full3d).unwrap(),
            "\"FULL_3D\""
        );
    }
}
