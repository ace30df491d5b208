use super::polygon::{cross, distance, is_simple_quad};
use super::{QuadLengths, QuadSolution, SolveMethod, EPS};
use crate::error::GeometryError;
use crate::types::PixelPoint;
use log::debug;
use nalgebra::Vector2;

/// Which of two mirror-image candidates to keep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Side {
    /// Positive cross product `(B − A) × (C − A)`: below the A→B direction.
    Below,
    /// The side of line A→B that does not contain the reference point.
    AwayFrom(PixelPoint),
}

impl Side {
    /// True when `candidate` lies on the requested side of `a → b`.
    pub(crate) fn accepts(self, a: PixelPoint, b: PixelPoint, candidate: PixelPoint) -> bool {
        let c = cross(a, b, candidate);
        match self {
            Side::Below => c > 0.0,
            Side::AwayFrom(reference) => {
                let r = cross(a, b, reference);
                if r.abs() <= EPS {
                    c > 0.0
                } else {
                    c * r < 0.0
                }
            }
        }
    }
}

/// Finds C with `|AC| = d1` and `|BC| = d2` by circle–circle intersection.
///
/// Fails with [`GeometryError::Degenerate`] when the circles are disjoint,
/// nested, or concentric. Tangent circles yield their single contact point.
pub fn triangulate(
    a: PixelPoint,
    b: PixelPoint,
    d1: f64,
    d2: f64,
    side: Side,
) -> Result<PixelPoint, GeometryError> {
    check_point(a, "A")?;
    check_point(b, "B")?;
    check_length(d1, "d1")?;
    check_length(d2, "d2")?;

    let pa = Vector2::new(a[0], a[1]);
    let pb = Vector2::new(b[0], b[1]);
    let ab = pb - pa;
    let base = ab.norm();
    if base <= EPS {
        return Err(if (d1 - d2).abs() <= EPS {
            GeometryError::Degenerate(
                "A and B coincide with d1 == d2: infinitely many solutions".to_string(),
            )
        } else {
            GeometryError::Degenerate(
                "A and B coincide with d1 != d2: concentric circles never meet".to_string(),
            )
        });
    }
    let tol = EPS * (base + d1 + d2);
    if base > d1 + d2 + tol {
        return Err(GeometryError::Degenerate(format!(
            "circles are disjoint: |AB| = {base:.6} > d1 + d2 = {:.6}",
            d1 + d2
        )));
    }
    if base < (d1 - d2).abs() - tol {
        return Err(GeometryError::Degenerate(format!(
            "one circle contains the other: |AB| = {base:.6} < |d1 - d2| = {:.6}",
            (d1 - d2).abs()
        )));
    }

    let along = (d1 * d1 - d2 * d2 + base * base) / (2.0 * base);
    let offset = (d1 * d1 - along * along).max(0.0).sqrt();
    let unit = ab / base;
    let normal = Vector2::new(-unit.y, unit.x);
    let foot = pa + unit * along;
    let plus = foot + normal * offset;
    let minus = foot - normal * offset;
    let plus = [plus.x, plus.y];
    let minus = [minus.x, minus.y];

    let chosen = if side.accepts(a, b, plus) {
        plus
    } else if side.accepts(a, b, minus) {
        minus
    } else {
        // Tangent contact on the baseline itself.
        plus
    };
    if !chosen[0].is_finite() || !chosen[1].is_finite() {
        return Err(GeometryError::NoRealSolution(
            "triangulation produced a non-finite point".to_string(),
        ));
    }
    Ok(chosen)
}

/// Reconstructs P3 and P4 in pixel space from the clicked top edge.
///
/// The pixel/meter scale of the P1–P2 edge converts every real length into
/// pixels, then P3 is triangulated below P1→P2 and P4 away from P1 across
/// the P2→P3 diagonal.
pub fn solve_quad_2d(
    p1: PixelPoint,
    p2: PixelPoint,
    lengths: &QuadLengths,
) -> Result<QuadSolution, GeometryError> {
    check_length(lengths.d12, "P1-P2")?;
    let top_px = distance(p1, p2);
    if top_px <= EPS {
        return Err(GeometryError::Degenerate(
            "P1 and P2 coincide; the top edge has no pixel length".to_string(),
        ));
    }
    let scale = top_px / lengths.d12;
    debug!("planar solve: top edge {top_px:.2}px over {:.3}m -> {scale:.3} px/m", lengths.d12);

    let p3 = triangulate(p1, p2, lengths.d13 * scale, lengths.d23 * scale, Side::Below)?;
    let p4 = triangulate(
        p2,
        p3,
        lengths.d24 * scale,
        lengths.d34 * scale,
        Side::AwayFrom(p1),
    )?;
    let corners = [p1, p2, p3, p4];
    if !is_simple_quad(&corners) {
        return Err(GeometryError::Degenerate(
            "solved corners do not form a simple quadrilateral".to_string(),
        ));
    }
    Ok(QuadSolution {
        corners,
        local: None,
        method: SolveMethod::Planar,
        degraded: false,
    })
}

pub(crate) fn check_point(p: PixelPoint, label: &str) -> Result<(), GeometryError> {
    if p[0].is_finite() && p[1].is_finite() {
        Ok(())
    } else {
        Err(GeometryError::InvalidInput(format!("point {label} is not finite")))
    }
}

pub(crate) fn check_length(d: f64, label: &str) -> Result<(), GeometryError> {
    if d.is_finite() && d > 0.0 {
        Ok(())
    } else {
        Err(GeometryError::InvalidInput(format!(
            "distance {label} must be finite and positive (got {d})"
        )))
    }
}
