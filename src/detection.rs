//! Per-camera detection statistics consumed by the volume estimator.
//!
//! The detector publishes a stats document keyed by camera:
//!
//! ```json
//! { "camera1": { "fps": 24.8, "trucks": 1, "objects": 12,
//!                "total_area": 5400, "brick_area": 5100 },
//!   "camera2": { "fps": 25.1, "trucks": 1, "objects": 9, "total_area": 4100 } }
//! ```
//!
//! The detected area is `brick_area` when present, then `total_area`, then
//! `detectedAreaPixels`. Missing cameras read as empty snapshots.

use crate::mask::{MaskF32, MaskU8, MaskView};
use crate::types::CameraId;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Latest detection figures of one camera.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSnapshot", rename_all = "camelCase")]
pub struct DetectionSnapshot {
    pub fps: f64,
    pub trucks: u32,
    /// Number of detected objects (bricks).
    pub objects: u32,
    /// Foreground pixels summed over the per-object masks; overlapping
    /// masks count their shared pixels once per mask.
    pub detected_area_pixels: f64,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawSnapshot {
    fps: f64,
    trucks: u32,
    objects: u32,
    brick_area: Option<f64>,
    total_area: Option<f64>,
    #[serde(alias = "detected_area_pixels")]
    #[serde(rename = "detectedAreaPixels")]
    detected_area_pixels: Option<f64>,
}

impl From<RawSnapshot> for DetectionSnapshot {
    fn from(raw: RawSnapshot) -> Self {
        let area = raw
            .brick_area
            .or(raw.total_area)
            .or(raw.detected_area_pixels)
            .unwrap_or(0.0);
        Self {
            fps: sanitize(raw.fps),
            trucks: raw.trucks,
            objects: raw.objects,
            detected_area_pixels: sanitize(area),
        }
    }
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

impl DetectionSnapshot {
    pub fn new(objects: u32, detected_area_pixels: f64) -> Self {
        Self {
            objects,
            detected_area_pixels: sanitize(detected_area_pixels),
            ..Self::default()
        }
    }

    /// Snapshot from 8-bit object masks; each mask contributes its pixels ≥ 128.
    pub fn from_masks_u8(fps: f64, masks: &[MaskU8<'_>]) -> Self {
        let area: usize = masks.par_iter().map(MaskView::foreground_count).sum();
        debug!("{} byte mask(s) -> {area} px", masks.len());
        Self::from_mask_area(fps, masks.len(), area)
    }

    /// Snapshot from probability masks; each mask contributes its pixels > 0.5.
    pub fn from_masks_f32(fps: f64, masks: &[MaskF32]) -> Self {
        let area: usize = masks.par_iter().map(MaskView::foreground_count).sum();
        debug!("{} probability mask(s) -> {area} px", masks.len());
        Self::from_mask_area(fps, masks.len(), area)
    }

    fn from_mask_area(fps: f64, count: usize, area: usize) -> Self {
        Self {
            fps: sanitize(fps),
            trucks: 0,
            objects: u32::try_from(count).unwrap_or(u32::MAX),
            detected_area_pixels: area as f64,
        }
    }
}

/// Snapshots of both cameras taken at the same moment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotPair {
    pub camera1: DetectionSnapshot,
    pub camera2: DetectionSnapshot,
}

impl SnapshotPair {
    pub fn new(camera1: DetectionSnapshot, camera2: DetectionSnapshot) -> Self {
        Self { camera1, camera2 }
    }

    pub fn get(&self, camera: CameraId) -> &DetectionSnapshot {
        match camera {
            CameraId::Camera1 => &self.camera1,
            CameraId::Camera2 => &self.camera2,
        }
    }

    pub fn total_objects(&self) -> u32 {
        self.camera1.objects.saturating_add(self.camera2.objects)
    }

    /// Mean detected area of the two cameras.
    pub fn average_area(&self) -> f64 {
        0.5 * (self.camera1.detected_area_pixels + self.camera2.detected_area_pixels)
    }

    /// Parses the detector's stats document.
    pub fn from_stats_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
