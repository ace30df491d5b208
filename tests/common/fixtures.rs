use std::collections::BTreeMap;
use std::path::PathBuf;
use truck_volume::calibration::{CalibrationManager, CalibrationRecord, RecordParts};
use truck_volume::geometry::{PinholeProjector, SolverOptions};
use truck_volume::pipeline::PipelineControl;
use truck_volume::{CameraId, Corner, Edge, PixelPoint, SessionPlan};

/// Edge lengths P1-P2, P1-P3, P2-P3, P2-P4, P3-P4 of a 5 m × 3 m bed.
pub const RIGHT_TRIANGLE_BED: [f64; 5] = [5.0, 3.0, 5.830951894845301, 3.0, 5.0];

/// Camera height of the synthetic pole-mounted camera.
pub const POLE_HEIGHT: f64 = 3.0;

pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

/// Runs a two-point planar session to completion.
pub fn calibrate_planar<C: PipelineControl>(
    manager: &mut CalibrationManager<C>,
    camera: CameraId,
    p1: PixelPoint,
    p2: PixelPoint,
    edges: [f64; 5],
) {
    manager.start(camera, SessionPlan::basic()).unwrap();
    manager.add_point(camera, p1).unwrap();
    manager.add_point(camera, p2).unwrap();
    for v in edges {
        manager.submit_measurement(camera, v).unwrap();
    }
}

/// 2.4 m × 4 m bed on the ground, 6 to 10 m in front of a camera
/// `POLE_HEIGHT` up.
pub struct PoleScene {
    pub ground: [[f64; 2]; 4],
    pub pixels: [PixelPoint; 4],
}

impl PoleScene {
    pub fn new() -> Self {
        let projector = PinholeProjector::new(&SolverOptions::default()).unwrap();
        let ground: [[f64; 2]; 4] = [[-1.2, -10.0], [1.2, -10.0], [-1.2, -6.0], [1.2, -6.0]];
        let [cx, cy] = projector.principal_point();
        let pixels = ground.map(|g| {
            let range = g[0].hypot(g[1]);
            [
                cx + projector.focal() * g[0] / -g[1],
                cy + projector.focal() * POLE_HEIGHT / range,
            ]
        });
        Self { ground, pixels }
    }

    /// Measurements in prompt order for a 3D session.
    pub fn answers(&self) -> Vec<f64> {
        let g = &self.ground;
        let d = |a: usize, b: usize| (g[a][0] - g[b][0]).hypot(g[a][1] - g[b][1]);
        let mut out = vec![d(0, 1), d(0, 2), d(1, 2), d(1, 3), d(2, 3), POLE_HEIGHT];
        out.extend(
            g.iter()
                .map(|p| (p[0] * p[0] + p[1] * p[1] + POLE_HEIGHT * POLE_HEIGHT).sqrt()),
        );
        out
    }

    pub fn calibrate<C: PipelineControl>(
        &self,
        manager: &mut CalibrationManager<C>,
        camera: CameraId,
    ) {
        manager.start(camera, SessionPlan::full_3d()).unwrap();
        manager.add_point(camera, self.pixels[0]).unwrap();
        manager.add_point(camera, self.pixels[1]).unwrap();
        for v in self.answers() {
            manager.submit_measurement(camera, v).unwrap();
        }
    }
}

/// Axis-aligned square bed of `side_px` pixels whose P1-P2 and P1-P3 edges
/// measure `d12` and `d13` meters.
pub fn square_record(side_px: f64, d12: f64, d13: f64, with_3d: bool) -> CalibrationRecord {
    let mut edges = BTreeMap::new();
    edges.insert(Edge::P1_P2, d12);
    edges.insert(Edge::P1_P3, d13);
    let mut parts = RecordParts {
        corners: [[0.0, 0.0], [side_px, 0.0], [0.0, side_px], [side_px, side_px]],
        edge_distances: edges,
        ..Default::default()
    };
    if with_3d {
        parts.camera_height = Some(4.0);
        for c in Corner::ALL {
            parts.camera_distances.insert(c, 4.0);
        }
    }
    CalibrationRecord::from_parts(parts).unwrap()
}

/// Unique scratch file path under the system temp directory.
pub fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "truck-volume-{}-{name}.json",
        std::process::id()
    ))
}
