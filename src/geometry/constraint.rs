//! Height-aware reconstruction of P3 and P4.
//!
//! Each new corner X must satisfy `|X − Pa| = da`, `|X − Pb| = db` and lie at
//! ground range `sqrt(R² − h²)` from the camera foot. Subtracting the two
//! distance circles gives the radical line
//!
//! `2(Pb.x − Pa.x)·x + 2(Pb.y − Pa.y)·y = da² − db² + |Pb|² − |Pa|²`
//!
//! which is intersected with the camera-range circle `x² + y² = R² − h²`.
//! A negative discriminant (or a non-positive `R² − h²`) falls back to planar
//! triangulation on the ground plane and marks the solution degraded. When P1
//! or P2 itself cannot be placed on the ground, the whole quad is solved in
//! pixel space instead, again marked degraded.

use super::polygon::{distance, is_simple_quad};
use super::projection::{BaselineProjection, PinholeProjector};
use super::triangulate::{check_length, check_point, solve_quad_2d, triangulate, Side};
use super::{QuadLengths, QuadSolution, SolveMethod, EPS};
use crate::error::GeometryError;
use crate::types::PixelPoint;
use log::{debug, warn};
use nalgebra::Vector2;

/// Camera placement relative to the four corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraGeometry {
    /// Camera height above the ground plane (meters).
    pub height: f64,
    /// Straight-line lens-to-corner distances for P1..P4 (meters).
    pub distances: [f64; 4],
}

/// Solves P3 and P4 from the clicked P1/P2 using camera height and ranges.
pub fn solve_quad_3d(
    p1: PixelPoint,
    p2: PixelPoint,
    lengths: &QuadLengths,
    camera: &CameraGeometry,
    projector: &PinholeProjector,
) -> Result<QuadSolution, GeometryError> {
    check_point(p1, "P1")?;
    check_point(p2, "P2")?;
    check_length(camera.height, "camera height")?;
    for (i, d) in camera.distances.iter().enumerate() {
        check_length(*d, &format!("camera to P{}", i + 1))?;
    }
    for (label, d) in [
        ("P1-P3", lengths.d13),
        ("P2-P3", lengths.d23),
        ("P2-P4", lengths.d24),
        ("P3-P4", lengths.d34),
    ] {
        check_length(d, label)?;
    }

    let top_edge = projector
        .back_project(p1, camera.distances[0], camera.height)
        .and_then(|l1| {
            projector
                .back_project(p2, camera.distances[1], camera.height)
                .map(|l2| (l1, l2))
        });
    let (l1, l2) = match top_edge {
        Ok(points) => points,
        Err(e) => {
            warn!("cannot place the top edge on the ground ({e}); falling back to planar solve");
            let mut planar = solve_quad_2d(p1, p2, lengths)?;
            planar.degraded = true;
            return Ok(planar);
        }
    };
    let (l3, degraded3) = solve_point(
        l1,
        l2,
        lengths.d13,
        lengths.d23,
        camera.distances[2],
        camera.height,
        Side::Below,
    )?;
    let (l4, degraded4) = solve_point(
        l2,
        l3,
        lengths.d24,
        lengths.d34,
        camera.distances[3],
        camera.height,
        Side::AwayFrom([l1.x, l1.y]),
    )?;

    let baseline = BaselineProjection::from_correspondences((p1, l1), (p2, l2))?;
    let p3 = baseline.project(&l3);
    let p4 = baseline.project(&l4);
    let corners = [p1, p2, p3, p4];
    if corners.iter().flatten().any(|v| !v.is_finite()) {
        return Err(GeometryError::NoRealSolution(
            "re-projected corners are not finite".to_string(),
        ));
    }
    if !is_simple_quad(&corners) {
        return Err(GeometryError::Degenerate(
            "solved corners do not form a simple quadrilateral".to_string(),
        ));
    }
    let degraded = degraded3 || degraded4;
    debug!(
        "3D solve: P3=({:.1},{:.1}) P4=({:.1},{:.1}) degraded={degraded}",
        p3[0], p3[1], p4[0], p4[1]
    );
    Ok(QuadSolution {
        corners,
        local: Some([
            [l1.x, l1.y],
            [l2.x, l2.y],
            [l3.x, l3.y],
            [l4.x, l4.y],
        ]),
        method: SolveMethod::Constrained3d,
        degraded,
    })
}

fn solve_point(
    pa: Vector2<f64>,
    pb: Vector2<f64>,
    da: f64,
    db: f64,
    camera_distance: f64,
    height: f64,
    side: Side,
) -> Result<(Vector2<f64>, bool), GeometryError> {
    let range2 = camera_distance * camera_distance - height * height;
    if range2 > EPS {
        let a = 2.0 * (pb.x - pa.x);
        let b = 2.0 * (pb.y - pa.y);
        let c = da * da - db * db + pb.norm_squared() - pa.norm_squared();
        if let Some(candidates) = line_circle(a, b, c, range2) {
            let chosen = pick(pa, pb, da, db, candidates, side);
            return Ok((chosen, false));
        }
    }
    warn!(
        "height-aware solve has no real solution (range² = {range2:.4}); \
         falling back to planar triangulation"
    );
    let p = triangulate([pa.x, pa.y], [pb.x, pb.y], da, db, side)?;
    Ok((Vector2::new(p[0], p[1]), true))
}

/// Intersects `a·x + b·y = c` with `x² + y² = r2`, eliminating the coordinate
/// with the larger coefficient for stability.
fn line_circle(a: f64, b: f64, c: f64, r2: f64) -> Option<[Vector2<f64>; 2]> {
    let n2 = a * a + b * b;
    if n2 <= EPS {
        return None;
    }
    if b.abs() >= a.abs() {
        let disc = b * b * (n2 * r2 - c * c);
        if disc < 0.0 {
            return None;
        }
        let s = disc.sqrt();
        let x1 = (a * c + s) / n2;
        let x2 = (a * c - s) / n2;
        Some([
            Vector2::new(x1, (c - a * x1) / b),
            Vector2::new(x2, (c - a * x2) / b),
        ])
    } else {
        let disc = a * a * (n2 * r2 - c * c);
        if disc < 0.0 {
            return None;
        }
        let s = disc.sqrt();
        let y1 = (b * c + s) / n2;
        let y2 = (b * c - s) / n2;
        Some([
            Vector2::new((c - b * y1) / a, y1),
            Vector2::new((c - b * y2) / a, y2),
        ])
    }
}

/// Keeps the candidate on the requested side; when both (or neither) qualify,
/// the one that best honours the two edge lengths wins.
fn pick(
    pa: Vector2<f64>,
    pb: Vector2<f64>,
    da: f64,
    db: f64,
    candidates: [Vector2<f64>; 2],
    side: Side,
) -> Vector2<f64> {
    let a = [pa.x, pa.y];
    let b = [pb.x, pb.y];
    let residual = |v: &Vector2<f64>| {
        let p = [v.x, v.y];
        (distance(a, p) - da).abs() + (distance(b, p) - db).abs()
    };
    let on_side: Vec<&Vector2<f64>> = candidates
        .iter()
        .filter(|v| side.accepts(a, b, [v.x, v.y]))
        .collect();
    let pool: Vec<&Vector2<f64>> = if on_side.is_empty() {
        candidates.iter().collect()
    } else {
        on_side
    };
    let mut best = *pool[0];
    for &v in pool.iter().skip(1) {
        if residual(v) < residual(&best) {
            best = *v;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::SolverOptions;

    /// Rectangle ahead of a camera 3 m up; returns pixels and true ground positions.
    fn synthetic_scene(projector: &PinholeProjector) -> ([PixelPoint; 4], [Vector2<f64>; 4]) {
        let ground = [
            Vector2::new(-1.2, -10.0),
            Vector2::new(1.2, -10.0),
            Vector2::new(-1.2, -6.0),
            Vector2::new(1.2, -6.0),
        ];
        let pixels = ground.map(|g| {
            let row = 240.0 + projector.focal() * 3.0 / g.norm();
            [projector.column_of(&g), row]
        });
        (pixels, ground)
    }

    fn lengths_of(g: &[Vector2<f64>; 4]) -> QuadLengths {
        QuadLengths {
            d12: (g[1] - g[0]).norm(),
            d13: (g[2] - g[0]).norm(),
            d23: (g[2] - g[1]).norm(),
            d24: (g[3] - g[1]).norm(),
            d34: (g[3] - g[2]).norm(),
        }
    }

    #[test]
    fn recovers_ground_positions_of_a_rectangle() {
        let projector = PinholeProjector::new(&SolverOptions::default()).unwrap();
        let (pixels, ground) = synthetic_scene(&projector);
        let height = 3.0;
        let camera = CameraGeometry {
            height,
            distances: ground.map(|g| (g.norm_squared() + height * height).sqrt()),
        };
        let sol =
            solve_quad_3d(pixels[0], pixels[1], &lengths_of(&ground), &camera, &projector).unwrap();
        assert!(!sol.degraded);
        assert_eq!(sol.method, SolveMethod::Constrained3d);
        let local = sol.local.unwrap();
        for (got, want) in local.iter().zip(ground.iter()) {
            assert!((got[0] - want.x).abs() < 1e-6, "x {got:?} vs {want:?}");
            assert!((got[1] - want.y).abs() < 1e-6, "y {got:?} vs {want:?}");
        }
        // Bottom corners are re-projected below the clicked top edge.
        assert!(sol.corners[2][1] > sol.corners[0][1]);
        assert!(sol.corners[3][1] > sol.corners[1][1]);
        assert!(is_simple_quad(&sol.corners));
    }

    #[test]
    fn unreachable_range_falls_back_to_planar() {
        let projector = PinholeProjector::new(&SolverOptions::default()).unwrap();
        let (pixels, ground) = synthetic_scene(&projector);
        let height = 3.0;
        let mut distances = ground.map(|g| (g.norm_squared() + height * height).sqrt());
        // Range circle far too small to meet the radical line.
        distances[2] = 3.1;
        let camera = CameraGeometry { height, distances };
        let lengths = lengths_of(&ground);
        let sol = solve_quad_3d(pixels[0], pixels[1], &lengths, &camera, &projector).unwrap();
        assert!(sol.degraded);
        let local = sol.local.unwrap();
        assert!((distance(local[0], local[2]) - lengths.d13).abs() < 1e-6);
        assert!((distance(local[1], local[2]) - lengths.d23).abs() < 1e-6);
    }

    #[test]
    fn top_edge_range_below_height_falls_back_to_pixel_plane() {
        let projector = PinholeProjector::new(&SolverOptions::default()).unwrap();
        let (pixels, ground) = synthetic_scene(&projector);
        let lengths = lengths_of(&ground);
        let camera = CameraGeometry {
            height: 3.0,
            distances: [2.9, 5.0, 8.0, 8.0],
        };
        let sol = solve_quad_3d(pixels[0], pixels[1], &lengths, &camera, &projector).unwrap();
        assert!(sol.degraded);
        assert_eq!(sol.method, SolveMethod::Planar);
        let planar = solve_quad_2d(pixels[0], pixels[1], &lengths).unwrap();
        assert_eq!(sol.corners, planar.corners);
        assert!(is_simple_quad(&sol.corners));
    }

    #[test]
    fn line_circle_returns_none_when_line_misses() {
        assert!(line_circle(1.0, 0.0, 5.0, 4.0).is_none());
        let hits = line_circle(0.0, 1.0, 1.0, 2.0).unwrap();
        for p in hits {
            assert!((p.y - 1.0).abs() < 1e-12);
            assert!((p.norm_squared() - 2.0).abs() < 1e-12);
        }
    }
}
