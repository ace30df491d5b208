use super::events::CalibrationEvent;
use super::measurements::MeasurementSet;
use super::record::CalibrationRecord;
use super::session::{
    CalibrationSession, MeasurementOutcome, PointOutcome, SessionPhase, SessionPlan,
};
use super::store::CalibrationStore;
use crate::error::{CalibrationError, PersistenceError};
use crate::geometry::SolverOptions;
use crate::persistence::CalibrationPersistence;
use crate::pipeline::PipelineControl;
use crate::types::{CameraId, Measurement, PixelPoint};
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Drives calibration sessions for both cameras and owns the active records.
///
/// Sessions of different cameras are independent; a failure in one never
/// touches the other. A previous calibration stays active until its
/// replacement has been solved successfully.
pub struct CalibrationManager<C: PipelineControl> {
    control: C,
    options: SolverOptions,
    store: CalibrationStore,
    sessions: BTreeMap<CameraId, CalibrationSession>,
    presets: BTreeMap<CameraId, MeasurementSet>,
    persistence: Option<Box<dyn CalibrationPersistence>>,
    events: Vec<CalibrationEvent>,
}

impl<C: PipelineControl> CalibrationManager<C> {
    pub fn new(control: C, options: SolverOptions) -> Self {
        Self {
            control,
            options,
            store: CalibrationStore::new(),
            sessions: BTreeMap::new(),
            presets: BTreeMap::new(),
            persistence: None,
            events: Vec::new(),
        }
    }

    pub fn with_store(mut self, store: CalibrationStore) -> Self {
        self.store = store;
        self
    }

    pub fn with_persistence<P: CalibrationPersistence + 'static>(mut self, persistence: P) -> Self {
        self.persistence = Some(Box::new(persistence));
        self
    }

    /// Measurements to take without prompting in future sessions of `camera`.
    pub fn set_presets(&mut self, camera: CameraId, presets: MeasurementSet) {
        self.presets.insert(camera, presets);
    }

    /// Loads saved calibrations, replacing the in-memory store. A missing file
    /// leaves the store untouched; a broken one is logged and ignored.
    pub fn load_saved(&mut self) -> bool {
        let Some(persistence) = &self.persistence else {
            return false;
        };
        match persistence.load() {
            Ok(Some(store)) => {
                info!("loaded saved calibration for {} camera(s)", store.len());
                self.store = store;
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("failed to load saved calibration: {e}");
                false
            }
        }
    }

    /// Writes the current store. Errors are returned to the caller; the
    /// automatic save after a successful session only logs them.
    pub fn save(&self) -> Result<(), PersistenceError> {
        match &self.persistence {
            Some(p) => p.save(&self.store),
            None => Ok(()),
        }
    }

    fn save_best_effort(&mut self) {
        if let Err(e) = self.save() {
            warn!("calibration kept in memory only: {e}");
            self.events.push(CalibrationEvent::PersistenceFailed {
                reason: e.to_string(),
            });
        }
    }

    /// Opens a session for `camera` after the pipeline has acknowledged the pause.
    pub fn start(&mut self, camera: CameraId, plan: SessionPlan) -> Result<(), CalibrationError> {
        if self.sessions.contains_key(&camera) {
            return Err(CalibrationError::SessionInProgress(camera));
        }
        self.control.pause(camera)?;
        self.events.push(CalibrationEvent::PipelinePaused { camera });
        if let Some(previous) = self.store.get(camera) {
            self.events.push(CalibrationEvent::RecalibrationStarted {
                camera,
                previous_tier: previous.tier(),
            });
        }
        let presets = self.presets.get(&camera).cloned().unwrap_or_default();
        self.sessions
            .insert(camera, CalibrationSession::new(camera, plan, presets));
        self.events.push(CalibrationEvent::Started { camera, plan });
        info!(
            "{camera}: calibration started ({} points, 3D: {})",
            plan.manual_points.count(),
            plan.want_3d
        );
        Ok(())
    }

    fn session_mut(
        &mut self,
        camera: CameraId,
    ) -> Result<&mut CalibrationSession, CalibrationError> {
        self.sessions
            .get_mut(&camera)
            .ok_or(CalibrationError::NotStarted(camera))
    }

    pub fn add_point(
        &mut self,
        camera: CameraId,
        point: PixelPoint,
    ) -> Result<PointOutcome, CalibrationError> {
        let mut outcome = self.session_mut(camera)?.add_point(point)?;
        self.events.push(CalibrationEvent::PointAccepted {
            camera,
            corner: outcome.corner,
            remaining: outcome.points_remaining,
        });
        if outcome.phase == SessionPhase::Solving {
            // Every measurement came from the presets.
            outcome.phase = self.finish(camera)?;
        }
        Ok(outcome)
    }

    pub fn submit_measurement(
        &mut self,
        camera: CameraId,
        value: f64,
    ) -> Result<MeasurementOutcome, CalibrationError> {
        let session = self.session_mut(camera)?;
        let asked = session.current_measurement();
        let mut outcome = match session.submit(value) {
            Ok(outcome) => outcome,
            Err(err) => {
                if let (CalibrationError::InputValidation(_), Some(measurement)) = (&err, asked) {
                    self.events.push(CalibrationEvent::MeasurementRejected {
                        camera,
                        measurement,
                        reason: err.to_string(),
                    });
                }
                return Err(err);
            }
        };
        self.events.push(CalibrationEvent::MeasurementAccepted {
            camera,
            measurement: outcome.measurement,
            value,
        });
        if outcome.phase == SessionPhase::Solving {
            outcome.phase = self.finish(camera)?;
        }
        Ok(outcome)
    }

    /// Solves a session that has everything it needs. The session is removed
    /// either way and the pipeline resumes.
    fn finish(&mut self, camera: CameraId) -> Result<SessionPhase, CalibrationError> {
        let Some(mut session) = self.sessions.remove(&camera) else {
            return Err(CalibrationError::NotStarted(camera));
        };
        let result = session.solve(&self.options);
        match result {
            Ok(record) => {
                info!(
                    "{camera}: calibrated at {} with {:.3} px/m{}",
                    record.tier().as_str(),
                    record.pixels_per_meter(),
                    if record.degraded() { " (planar fallback)" } else { "" }
                );
                self.events.push(CalibrationEvent::Calibrated {
                    camera,
                    tier: record.tier(),
                    pixels_per_meter: record.pixels_per_meter(),
                    degraded: record.degraded(),
                });
                self.store.insert(camera, record);
                self.save_best_effort();
                self.resume(camera);
                Ok(session.phase())
            }
            Err(err) => {
                warn!("{camera}: calibration failed: {err}");
                self.events.push(CalibrationEvent::Failed {
                    camera,
                    reason: err.to_string(),
                });
                self.resume(camera);
                Err(err)
            }
        }
    }

    fn resume(&mut self, camera: CameraId) {
        match self.control.resume(camera) {
            Ok(()) => self.events.push(CalibrationEvent::PipelineResumed { camera }),
            Err(e) => warn!("{camera}: {e}"),
        }
    }

    /// Abandons the session of `camera`; returns false when none was open.
    pub fn cancel(&mut self, camera: CameraId) -> bool {
        if self.sessions.remove(&camera).is_none() {
            return false;
        }
        info!("{camera}: calibration cancelled");
        self.events.push(CalibrationEvent::Cancelled { camera });
        self.resume(camera);
        true
    }

    /// Drops the stored calibration of `camera` and any open session.
    pub fn reset(&mut self, camera: CameraId) {
        self.cancel(camera);
        if self.store.remove(camera).is_some() {
            info!("{camera}: calibration reset");
            self.events.push(CalibrationEvent::Reset { camera });
            self.save_best_effort();
        }
    }

    pub fn phase(&self, camera: CameraId) -> SessionPhase {
        match self.sessions.get(&camera) {
            Some(session) => session.phase(),
            None if self.store.is_calibrated(camera) => SessionPhase::Calibrated,
            None => SessionPhase::Idle,
        }
    }

    pub fn current_measurement(&self, camera: CameraId) -> Option<Measurement> {
        self.sessions
            .get(&camera)
            .and_then(CalibrationSession::current_measurement)
    }

    pub fn session(&self, camera: CameraId) -> Option<&CalibrationSession> {
        self.sessions.get(&camera)
    }

    pub fn store(&self) -> &CalibrationStore {
        &self.store
    }

    pub fn record(&self, camera: CameraId) -> Option<&CalibrationRecord> {
        self.store.get(camera)
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn drain_events(&mut self) -> Vec<CalibrationEvent> {
        std::mem::take(&mut self.events)
    }
}
