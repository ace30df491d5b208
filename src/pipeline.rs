//! Pause/resume control of the detection pipeline.
//!
//! Clicked pixel coordinates are only meaningful against a still frame, so
//! the pipeline must confirm it has stopped processing before a calibration
//! session starts collecting points. Both cameras may calibrate at once;
//! [`PipelineGate`] keeps processing paused until every camera that asked for
//! a pause has resumed.

use crate::error::PipelineError;
use crate::types::CameraId;
use log::info;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

/// Seam between calibration and whatever runs the detector.
pub trait PipelineControl {
    /// Pauses processing on behalf of `camera`. Returning `Ok` is the
    /// acknowledgement that no further frames are being processed.
    fn pause(&mut self, camera: CameraId) -> Result<(), PipelineError>;
    fn resume(&mut self, camera: CameraId) -> Result<(), PipelineError>;
}

impl<T: PipelineControl + ?Sized> PipelineControl for &mut T {
    fn pause(&mut self, camera: CameraId) -> Result<(), PipelineError> {
        (**self).pause(camera)
    }

    fn resume(&mut self, camera: CameraId) -> Result<(), PipelineError> {
        (**self).resume(camera)
    }
}

/// Control for offline use where no pipeline is running.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPipeline;

impl PipelineControl for NoPipeline {
    fn pause(&mut self, _camera: CameraId) -> Result<(), PipelineError> {
        Ok(())
    }

    fn resume(&mut self, _camera: CameraId) -> Result<(), PipelineError> {
        Ok(())
    }
}

/// Shared pause flag, reference counted per camera. Clones observe the same
/// state, so the processing loop can hold one and poll [`Self::is_paused`].
#[derive(Clone, Debug, Default)]
pub struct PipelineGate {
    paused_by: Arc<Mutex<BTreeSet<CameraId>>>,
}

impl PipelineGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_by
            .lock()
            .map(|set| !set.is_empty())
            .unwrap_or(true)
    }

    pub fn is_paused_for(&self, camera: CameraId) -> bool {
        self.paused_by
            .lock()
            .map(|set| set.contains(&camera))
            .unwrap_or(true)
    }

    fn update<F>(&self, camera: CameraId, f: F) -> Result<(bool, bool), PipelineError>
    where
        F: FnOnce(&mut BTreeSet<CameraId>),
    {
        let mut set = self.paused_by.lock().map_err(|_| PipelineError {
            camera,
            reason: "pipeline gate lock poisoned".to_string(),
        })?;
        let before = !set.is_empty();
        f(&mut set);
        Ok((before, !set.is_empty()))
    }
}

impl PipelineControl for PipelineGate {
    fn pause(&mut self, camera: CameraId) -> Result<(), PipelineError> {
        let (before, after) = self.update(camera, |set| {
            set.insert(camera);
        })?;
        if !before && after {
            info!("processing paused for calibration of {camera}");
        }
        Ok(())
    }

    fn resume(&mut self, camera: CameraId) -> Result<(), PipelineError> {
        let (before, after) = self.update(camera, |set| {
            set.remove(&camera);
        })?;
        if before && !after {
            info!("processing resumed after calibration of {camera}");
        }
        Ok(())
    }
}
