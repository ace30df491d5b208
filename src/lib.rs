#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod calibration;
pub mod detection;
pub mod error;
pub mod estimator;
pub mod geometry;
pub mod persistence;
pub mod pipeline;
pub mod types;
pub mod volume;

// Support modules used by the command-line tools.
pub mod config;
pub mod mask;

// --- High-level re-exports -------------------------------------------------

// Calibration workflow and its results.
pub use crate::calibration::{
    CalibrationManager, CalibrationRecord, CalibrationStore, CalibrationTier, SessionPlan,
};
pub use crate::types::{CameraId, Corner, Edge, Measurement, PixelPoint};

// Volume queries.
pub use crate::detection::{DetectionSnapshot, SnapshotPair};
pub use crate::volume::{EstimatorOptions, VolumeEstimator, VolumeReport};

// Pipeline and storage seams.
pub use crate::persistence::{CalibrationPersistence, JsonFilePersistence};
pub use crate::pipeline::{NoPipeline, PipelineControl, PipelineGate};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use truck_volume::prelude::*;
///
/// # fn main() -> Result<(), truck_volume::error::CalibrationError> {
/// let mut manager = CalibrationManager::new(NoPipeline, SolverOptions::default());
/// manager.start(CameraId::Camera1, SessionPlan::basic())?;
/// manager.add_point(CameraId::Camera1, [0.0, 0.0])?;
/// manager.add_point(CameraId::Camera1, [100.0, 0.0])?;
/// for meters in [5.0, 3.0, 34f64.sqrt(), 3.0, 5.0] {
///     manager.submit_measurement(CameraId::Camera1, meters)?;
/// }
///
/// let estimator = VolumeEstimator::new(manager.store(), &EstimatorOptions::default());
/// let pair = SnapshotPair::new(DetectionSnapshot::new(12, 1800.0), DetectionSnapshot::default());
/// println!("{:.3} m³", estimator.calculate_volume(&pair));
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::geometry::SolverOptions;
    pub use crate::{
        CalibrationManager, CameraId, DetectionSnapshot, EstimatorOptions, NoPipeline,
        SessionPlan, SnapshotPair, VolumeEstimator,
    };
}
