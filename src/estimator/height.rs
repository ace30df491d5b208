use super::options::HeightOptions;
use log::debug;
use serde::Serialize;
use std::f64::consts::FRAC_PI_2;

/// Which height model produced an estimate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HeightMethod {
    /// Linear interpolation on the fill ratio.
    Basic,
    /// Square-root fill curve with viewing-geometry corrections.
    Enhanced,
}

/// Multiplicative corrections applied by the enhanced model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeightCorrections {
    pub angle: f64,
    pub distance: f64,
    pub steep: f64,
}

impl HeightCorrections {
    pub fn combined(&self) -> f64 {
        self.angle * self.distance * self.steep
    }
}

/// Viewing geometry of a 3D-calibrated camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewGeometry {
    /// Camera height above the ground (meters).
    pub camera_height: f64,
    /// Mean lens-to-corner distance (meters).
    pub avg_camera_distance: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeightEstimate {
    pub height: f64,
    pub fill_ratio: f64,
    pub method: HeightMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrections: Option<HeightCorrections>,
    /// Radians from the vertical; enhanced model only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewing_angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_distance: Option<f64>,
}

/// Detected area over calibrated bed area, clamped to `[0, 1]`. A missing or
/// zero reference area gives zero.
pub fn fill_ratio(detected_area_px: f64, calib_area_px: f64) -> f64 {
    if !(calib_area_px.is_finite() && calib_area_px > 0.0) || !detected_area_px.is_finite() {
        return 0.0;
    }
    (detected_area_px / calib_area_px).clamp(0.0, 1.0)
}

/// Converts a detected pixel area into a pile height.
#[derive(Clone, Debug, Default)]
pub struct HeightEstimator {
    options: HeightOptions,
}

impl HeightEstimator {
    pub fn new(options: HeightOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &HeightOptions {
        &self.options
    }

    /// Clamps into `[min_height, max_height]` without panicking on
    /// inverted bounds.
    fn bound(&self, h: f64) -> f64 {
        h.min(self.options.max_height).max(self.options.min_height)
    }

    pub fn basic(&self, detected_area_px: f64, calib_area_px: f64) -> HeightEstimate {
        let fill = fill_ratio(detected_area_px, calib_area_px);
        let o = &self.options;
        let height = self.bound(o.min_height + fill * (o.max_height - o.min_height));
        HeightEstimate {
            height,
            fill_ratio: fill,
            method: HeightMethod::Basic,
            corrections: None,
            viewing_angle: None,
            effective_height: None,
            horizontal_distance: None,
        }
    }

    /// Camera height above the load surface when the bed height is known and
    /// below the camera, otherwise the absolute camera height.
    pub fn effective_height(&self, camera_height: f64) -> f64 {
        match self.options.truck_bed_height {
            Some(bed) if bed.is_finite() && bed > 0.0 && camera_height - bed > 0.0 => {
                camera_height - bed
            }
            _ => camera_height,
        }
    }

    pub fn enhanced(
        &self,
        detected_area_px: f64,
        calib_area_px: f64,
        view: &ViewGeometry,
    ) -> HeightEstimate {
        let o = &self.options;
        let fill = fill_ratio(detected_area_px, calib_area_px);
        let effective = self.effective_height(view.camera_height);
        let horizontal = (view.avg_camera_distance * view.avg_camera_distance
            - effective * effective)
            .max(0.0)
            .sqrt();
        let viewing_angle = horizontal.atan2(effective);

        let angle = 1.0 + (viewing_angle / FRAC_PI_2) * o.max_angle_boost;
        let distance =
            1.0 + ((horizontal - o.reference_distance) * o.distance_penalty_per_m).max(0.0);
        let steep = match o.truck_bed_height {
            Some(bed) if bed.is_finite() && bed > 0.0 => {
                let ratio = effective / bed;
                if ratio < o.steep_ratio_threshold {
                    1.0 + (o.steep_ratio_threshold - ratio) * o.steep_boost_per_unit
                } else {
                    1.0
                }
            }
            _ => 1.0,
        };
        let corrections = HeightCorrections {
            angle,
            distance,
            steep,
        };
        let base = o.min_height + fill.sqrt() * (o.max_height - o.min_height);
        let height = self.bound(base * corrections.combined());
        debug!(
            "enhanced height: fill={fill:.3} base={base:.3} \
             angle={angle:.3} dist={distance:.3} steep={steep:.3} -> {height:.3}"
        );
        HeightEstimate {
            height,
            fill_ratio: fill,
            method: HeightMethod::Enhanced,
            corrections: Some(corrections),
            viewing_angle: Some(viewing_angle),
            effective_height: Some(effective),
            horizontal_distance: Some(horizontal),
        }
    }
}
