//! Volume aggregator.
//!
//! Per camera, `volume = areaPixels / pixelsPerMeter² × height`. The two
//! cameras are combined by the best method any of them supports (3D, then
//! 2D, then an uncalibrated pixel factor), corrected for detection richness,
//! truck type and material density, and scored for confidence.
//!
//! [`VolumeEstimator`] borrows the calibration store; it never owns or
//! mutates calibration state.

mod aggregate;
mod camera;
mod confidence;
mod corrections;
mod options;
mod report;

pub use aggregate::{aggregate, best_camera_volume, Aggregate};
pub use camera::{
    camera_volume_2d, camera_volume_3d, camera_volume_basic, CameraVolume, VolumeMethod,
};
pub use confidence::{
    assess, calibration_factor, detection_richness, geometry_factor, measured_consistency,
    ConfidenceFactors, ConfidenceLevel, ConfidenceReport, DEFAULT_CONSISTENCY,
};
pub use corrections::{detection_factor, AppliedCorrections};
pub use options::{AggregationOptions, EstimatorOptions, TruckType};
pub use report::{
    CameraCalibrationSummary, VolumeEstimate, VolumeReport, VolumeUnits,
    CUBIC_FEET_PER_CUBIC_METER, CUBIC_YARDS_PER_CUBIC_METER, LITERS_PER_CUBIC_METER,
    US_GALLONS_PER_CUBIC_METER,
};

use crate::calibration::{CalibrationRecord, CalibrationStore};
use crate::detection::SnapshotPair;
use crate::estimator::HeightEstimator;
use crate::types::CameraId;
use log::debug;

/// Read-only view over the calibration store answering volume queries.
pub struct VolumeEstimator<'a> {
    store: &'a CalibrationStore,
    height: HeightEstimator,
    aggregation: AggregationOptions,
}

impl<'a> VolumeEstimator<'a> {
    pub fn new(store: &'a CalibrationStore, options: &EstimatorOptions) -> Self {
        Self {
            store,
            height: HeightEstimator::new(options.height.clone()),
            aggregation: options.aggregation.clone(),
        }
    }

    pub fn get_calibration_data(&self, camera: CameraId) -> Option<&'a CalibrationRecord> {
        self.store.get(camera)
    }

    pub fn is_calibrated(&self, camera: CameraId) -> bool {
        self.store.is_calibrated(camera)
    }

    pub fn has_3d_calibration(&self, camera: CameraId) -> bool {
        self.store.has_3d(camera)
    }

    pub fn has_basic_calibration(&self, camera: CameraId) -> bool {
        self.store.has_basic(camera)
    }

    fn aggregate(&self, pair: &SnapshotPair) -> Aggregate {
        aggregate(self.store, pair, &self.height, &self.aggregation)
    }

    /// Full estimate: corrected volume, breakdown, confidence.
    pub fn estimate(&self, pair: &SnapshotPair) -> VolumeEstimate {
        let agg = self.aggregate(pair);
        let confidence = assess(self.store, pair, &agg);
        let corrections = AppliedCorrections::from_options(pair.total_objects(), &self.aggregation);
        let cubic_meters = agg.cubic_meters * corrections.combined();
        debug!(
            "volume {cubic_meters:.4} m³ (raw {:.4}, corrections {:.3}), confidence {:.2}",
            agg.cubic_meters,
            corrections.combined(),
            confidence.score
        );
        VolumeEstimate {
            cubic_meters,
            raw_cubic_meters: agg.cubic_meters,
            method: agg.method,
            per_camera_breakdown: agg.cameras,
            stereo_weighted: agg.stereo_weighted,
            corrections,
            confidence_score: confidence.score,
            confidence_level: confidence.level,
            confidence_factors: confidence.factors,
            recommendations: confidence.recommendations,
        }
    }

    pub fn calculate_volume(&self, pair: &SnapshotPair) -> f64 {
        self.estimate(pair).cubic_meters
    }

    pub fn get_volume_confidence(&self, pair: &SnapshotPair) -> ConfidenceReport {
        assess(self.store, pair, &self.aggregate(pair))
    }

    pub fn generate_volume_report(&self, pair: &SnapshotPair) -> VolumeReport {
        let estimate = self.estimate(pair);
        let confidence = ConfidenceReport {
            score: estimate.confidence_score,
            level: estimate.confidence_level,
            factors: estimate.confidence_factors,
            recommendations: estimate.recommendations.clone(),
        };
        VolumeReport {
            volume: VolumeUnits::from_cubic_meters(estimate.cubic_meters),
            calibration: CameraId::ALL
                .iter()
                .map(|c| CameraCalibrationSummary::of(self.store, *c))
                .collect(),
            detection: *pair,
            confidence,
            estimate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::RecordParts;
    use crate::detection::DetectionSnapshot;
    use crate::types::{Corner, Edge};
    use std::collections::BTreeMap;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// 10×10 px bed at 10 px/m.
    fn square_record(with_3d: bool) -> CalibrationRecord {
        let mut edges = BTreeMap::new();
        edges.insert(Edge::P1_P2, 1.0);
        edges.insert(Edge::P1_P3, 1.0);
        let mut parts = RecordParts {
            corners: [[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0]],
            edge_distances: edges,
            ..Default::default()
        };
        if with_3d {
            parts.camera_height = Some(4.0);
            for c in Corner::ALL {
                parts.camera_distances.insert(c, 4.0);
            }
        }
        CalibrationRecord::from_parts(parts).unwrap()
    }

    #[test]
    fn basic_example_gives_point_six_five() {
        let mut store = CalibrationStore::new();
        store.insert(CameraId::Camera1, square_record(false));
        let est = VolumeEstimator::new(&store, &EstimatorOptions::default());
        let pair =
            SnapshotPair::new(DetectionSnapshot::new(20, 50.0), DetectionSnapshot::default());
        let e = est.estimate(&pair);
        assert_eq!(e.method, VolumeMethod::Calibrated2d);
        assert!(approx_eq(e.raw_cubic_meters, 0.65));
        assert!(approx_eq(e.cubic_meters, 0.65));
        assert!(approx_eq(e.per_camera_breakdown[0].cubic_meters, 0.65));
        assert_eq!(e.per_camera_breakdown[1].weight, 0.0);
    }

    #[test]
    fn uncalibrated_uses_average_area() {
        let store = CalibrationStore::new();
        let est = VolumeEstimator::new(&store, &EstimatorOptions::default());
        let pair = SnapshotPair::new(
            DetectionSnapshot::new(20, 300.0),
            DetectionSnapshot::new(0, 100.0),
        );
        let e = est.estimate(&pair);
        assert_eq!(e.method, VolumeMethod::Uncalibrated);
        assert!(approx_eq(e.raw_cubic_meters, 2.0));
        assert!(approx_eq(e.confidence_factors.calibration, 0.1));
    }

    #[test]
    fn three_d_camera_outranks_two_d_camera() {
        let mut store = CalibrationStore::new();
        store.insert(CameraId::Camera1, square_record(false));
        store.insert(CameraId::Camera2, square_record(true));
        let est = VolumeEstimator::new(&store, &EstimatorOptions::default());
        let pair = SnapshotPair::new(
            DetectionSnapshot::new(10, 50.0),
            DetectionSnapshot::new(10, 25.0),
        );
        let e = est.estimate(&pair);
        assert_eq!(e.method, VolumeMethod::Calibrated3d);
        let cam2 = &e.per_camera_breakdown[1];
        assert_eq!(cam2.method, VolumeMethod::Calibrated3d);
        assert!(approx_eq(cam2.weight, 1.0));
        // area 0.25 m², vertical view, sqrt fill 0.5 -> 1.3 m
        assert!(approx_eq(e.raw_cubic_meters, 0.25 * 1.3));
        assert!(approx_eq(e.confidence_factors.calibration, 0.8));
    }

    #[test]
    fn stale_request_falls_back_instead_of_failing() {
        let mut store = CalibrationStore::new();
        store.insert(CameraId::Camera1, square_record(false));
        let height = HeightEstimator::default();
        let snap = DetectionSnapshot::new(5, 50.0);
        let err = camera_volume_3d(CameraId::Camera1, &snap, &store, &height).unwrap_err();
        assert_eq!(err.actual, crate::calibration::CalibrationTier::Basic2d);
        let pair = SnapshotPair::new(snap, DetectionSnapshot::default());
        let options = AggregationOptions::default();
        let vol = best_camera_volume(CameraId::Camera1, &pair, &store, &height, &options);
        assert_eq!(vol.method, VolumeMethod::Calibrated2d);
    }

    #[test]
    fn report_converts_units() {
        let mut store = CalibrationStore::new();
        store.insert(CameraId::Camera1, square_record(false));
        let est = VolumeEstimator::new(&store, &EstimatorOptions::default());
        let pair =
            SnapshotPair::new(DetectionSnapshot::new(25, 50.0), DetectionSnapshot::default());
        let report = est.generate_volume_report(&pair);
        assert!(approx_eq(report.volume.liters, 650.0));
        assert_eq!(report.calibration.len(), 2);
        assert!(report.summary().contains("BASIC_2D"));
        assert_eq!(report.confidence, est.get_volume_confidence(&pair));
    }
}
