//! Pinhole approximation used by the height-aware solver.
//!
//! Ground-plane ("local") coordinates put the camera foot at the origin, x to
//! the right and y pointing back towards the camera, so that "further down in
//! the image" and "larger local y" agree and the same cross-product side rule
//! applies in both frames.

use super::EPS;
use crate::error::GeometryError;
use crate::types::PixelPoint;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Image geometry assumed by the solver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SolverOptions {
    /// Frame width in pixels.
    pub image_width: f64,
    /// Frame height in pixels.
    pub image_height: f64,
    /// Estimated focal length as a fraction of the image width.
    pub focal_fraction: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            image_width: 640.0,
            image_height: 480.0,
            focal_fraction: 0.8,
        }
    }
}

/// Maps pixels to ground-plane positions given a camera distance and height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinholeProjector {
    cx: f64,
    cy: f64,
    focal: f64,
}

impl PinholeProjector {
    pub fn new(options: &SolverOptions) -> Result<Self, GeometryError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(options.image_width)
            || !valid(options.image_height)
            || !valid(options.focal_fraction)
        {
            return Err(GeometryError::InvalidInput(format!(
                "image size {}x{} and focal fraction {} must be positive",
                options.image_width, options.image_height, options.focal_fraction
            )));
        }
        Ok(Self {
            cx: 0.5 * options.image_width,
            cy: 0.5 * options.image_height,
            focal: options.focal_fraction * options.image_width,
        })
    }

    #[inline]
    pub fn focal(&self) -> f64 {
        self.focal
    }

    #[inline]
    pub fn principal_point(&self) -> PixelPoint {
        [self.cx, self.cy]
    }

    /// Ground distance from the camera foot: `sqrt(cameraDist² − height²)`.
    pub fn horizontal_distance(camera_distance: f64, height: f64) -> Result<f64, GeometryError> {
        let r2 = camera_distance * camera_distance - height * height;
        if !r2.is_finite() || r2 <= 0.0 {
            return Err(GeometryError::InvalidInput(format!(
                "camera distance {camera_distance} must exceed camera height {height}"
            )));
        }
        Ok(r2.sqrt())
    }

    /// Back-projects a pixel onto the ground plane. The column sets the
    /// azimuth, the camera distance sets the range.
    pub fn back_project(
        &self,
        pixel: PixelPoint,
        camera_distance: f64,
        height: f64,
    ) -> Result<Vector2<f64>, GeometryError> {
        let horizontal = Self::horizontal_distance(camera_distance, height)?;
        let azimuth = (pixel[0] - self.cx).atan2(self.focal);
        Ok(Vector2::new(
            horizontal * azimuth.sin(),
            -horizontal * azimuth.cos(),
        ))
    }

    /// Pixel column of a ground-plane point, the exact inverse of the azimuth
    /// part of [`Self::back_project`].
    pub fn column_of(&self, local: &Vector2<f64>) -> f64 {
        self.cx + self.focal * local.x.atan2(-local.y).tan()
    }
}

/// Ground-plane → pixel mapping anchored on two known correspondences.
///
/// Per-axis pixel scales are re-derived from the P1/P2 pair instead of
/// assuming a focal length, so reconstructed corners stay consistent with the
/// clicked baseline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BaselineProjection {
    pixel_origin: Vector2<f64>,
    local_origin: Vector2<f64>,
    scale: Vector2<f64>,
}

impl BaselineProjection {
    pub fn from_correspondences(
        first: (PixelPoint, Vector2<f64>),
        second: (PixelPoint, Vector2<f64>),
    ) -> Result<Self, GeometryError> {
        let p0 = Vector2::new(first.0[0], first.0[1]);
        let p1 = Vector2::new(second.0[0], second.0[1]);
        let dp = p1 - p0;
        let dl = second.1 - first.1;
        let dl_norm = dl.norm();
        let dp_norm = dp.norm();
        if dl_norm <= EPS || dp_norm <= EPS {
            return Err(GeometryError::Degenerate(
                "baseline correspondences coincide; cannot derive a pixel scale".to_string(),
            ));
        }
        let isotropic = dp_norm / dl_norm;
        let axis_scale = |dp_axis: f64, dl_axis: f64| {
            if dl_axis.abs() > 0.1 * dl_norm {
                let s = dp_axis / dl_axis;
                if s.is_finite() && s > 0.0 {
                    return s;
                }
            }
            isotropic
        };
        Ok(Self {
            pixel_origin: p0,
            local_origin: first.1,
            scale: Vector2::new(axis_scale(dp.x, dl.x), axis_scale(dp.y, dl.y)),
        })
    }

    pub fn project(&self, local: &Vector2<f64>) -> PixelPoint {
        let p = self.pixel_origin + (local - self.local_origin).component_mul(&self.scale);
        [p.x, p.y]
    }

    #[inline]
    pub fn scale(&self) -> [f64; 2] {
        [self.scale.x, self.scale.y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_projection_preserves_range() {
        let projector = PinholeProjector::new(&SolverOptions::default()).unwrap();
        let local = projector.back_project([500.0, 200.0], 5.0, 3.0).unwrap();
        assert!((local.norm() - 4.0).abs() < 1e-9);
        assert!(local.x > 0.0 && local.y < 0.0);
        assert!((projector.column_of(&local) - 500.0).abs() < 1e-6);
    }

    #[test]
    fn distance_below_height_is_rejected() {
        let projector = PinholeProjector::new(&SolverOptions::default()).unwrap();
        assert!(matches!(
            projector.back_project([320.0, 240.0], 2.0, 3.0),
            Err(GeometryError::InvalidInput(_))
        ));
    }

    #[test]
    fn baseline_projection_reproduces_anchors() {
        let a = ([100.0, 50.0], Vector2::new(-1.0, -10.0));
        let b = ([300.0, 60.0], Vector2::new(1.0, -9.0));
        let proj = BaselineProjection::from_correspondences(a, b).unwrap();
        let pa = proj.project(&a.1);
        let pb = proj.project(&b.1);
        assert!((pa[0] - 100.0).abs() < 1e-9 && (pa[1] - 50.0).abs() < 1e-9);
        assert!((pb[0] - 300.0).abs() < 1e-9 && (pb[1] - 60.0).abs() < 1e-9);
    }
}
