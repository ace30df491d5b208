//! Geometry Solver reconstructing the truck-bed quadrilateral.
//!
//! Overview
//! - The operator clicks P1 and P2 (top edge) and supplies real-world edge
//!   lengths. P3 and P4 are reconstructed either by planar circle–circle
//!   triangulation in pixel space, or, when camera height and camera-to-corner
//!   distances are known, by intersecting the radical line of two distance
//!   circles with the camera-distance circle on the ground plane.
//! - Corners are always produced in canonical order TL, TR, BL, BR. P3 lies
//!   below the P1→P2 direction; P4 lies on the side of the P2→P3 diagonal
//!   away from P1, which keeps the quadrilateral simple.
//! - The 3D path degrades to planar triangulation when its discriminant is
//!   negative. The result carries a `degraded` flag so callers can tell.
//!
//! Modules
//! - `triangulate` – circle–circle intersection and the planar quad solve.
//! - `constraint` – height-aware line–circle solve for P3/P4.
//! - `projection` – pinhole back-projection and baseline re-projection.
//! - `polygon` – shared distance/area/simplicity helpers.

mod constraint;
mod polygon;
mod projection;
mod triangulate;

pub use constraint::{solve_quad_3d, CameraGeometry};
pub use polygon::{cross, distance, is_simple_quad, polygon_area, quad_area, quad_cyclic};
pub use projection::{BaselineProjection, PinholeProjector, SolverOptions};
pub use triangulate::{solve_quad_2d, triangulate, Side};

use crate::types::PixelPoint;
use serde::Serialize;

pub(crate) const EPS: f64 = 1e-9;

/// Real-world lengths (meters) of the edges used to reconstruct P3 and P4.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadLengths {
    pub d12: f64,
    pub d13: f64,
    pub d23: f64,
    pub d24: f64,
    pub d34: f64,
}

/// How the missing corners were obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SolveMethod {
    /// Circle–circle triangulation in pixel space.
    Planar,
    /// Height-aware line–circle solve on the ground plane.
    Constrained3d,
}

/// Output of a quadrilateral solve.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuadSolution {
    /// P1..P4 in pixel coordinates.
    pub corners: [PixelPoint; 4],
    /// Ground-plane positions (meters, camera foot at the origin) for the 3D path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<[PixelPoint; 4]>,
    pub method: SolveMethod,
    /// At least one corner fell back to planar triangulation.
    pub degraded: bool,
}
