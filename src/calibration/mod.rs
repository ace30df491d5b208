//! Per-camera calibration: the session state machine, the records it
//! produces and the manager tying them to the pipeline and persistence.
//!
//! Overview
//! - A [`CalibrationSession`] collects clicked corners and real-world
//!   measurements, then solves the missing corners once.
//! - A [`CalibrationRecord`] holds the finalized corners, measurements and the
//!   derived pixels-per-meter scale. Its [`CalibrationTier`] is derived from
//!   which data is present, never stored.
//! - [`CalibrationManager`] pauses the pipeline before a session collects
//!   points, stores the record on success, persists it best-effort and
//!   resumes the pipeline whatever the outcome.
//!
//! Modules
//! - `session` – phases, measurement queue and solver dispatch.
//! - `record` – finalized record, tiers and quality ratings.
//! - `scale` – pixel-per-meter estimation and its spread.
//! - `store` – records keyed by camera.
//! - `manager` – workflow driver and event log.
//! - `events` – notifications for front-ends.
//! - `measurements` – real-world measurement sets.

mod events;
mod manager;
mod measurements;
mod record;
mod scale;
mod session;
mod store;

pub use events::CalibrationEvent;
pub use manager::CalibrationManager;
pub use measurements::{is_valid_measurement, MeasurementSet};
pub use record::{
    CalibrationQuality, CalibrationRecord, CalibrationTier, RecordParts, UNRATED_QUALITY_SCORE,
};
pub use scale::{estimate_scale, rate_quality, ScaleEstimate};
pub use session::{
    CalibrationSession, ManualPoints, MeasurementOutcome, PointOutcome, SessionPhase, SessionPlan,
};
pub use store::CalibrationStore;
