use truck_volume::geometry::SolverOptions;
use truck_volume::volume::{EstimatorOptions, VolumeEstimator};
use truck_volume::{
    CalibrationManager, CameraId, DetectionSnapshot, PipelineGate, SessionPlan, SnapshotPair,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    // Demo: calibrates two synthetic cameras and estimates a half-loaded bed.
    let gate = PipelineGate::new();
    let mut manager = CalibrationManager::new(gate.clone(), SolverOptions::default());

    // camera1: 2.4 m × 4.0 m bed seen at 40 px/m.
    let bed = [2.4, 4.0, 2.4f64.hypot(4.0), 4.0, 2.4];
    manager
        .start(CameraId::Camera1, SessionPlan::basic())
        .map_err(|e| e.to_string())?;
    for p in [[200.0, 120.0], [296.0, 120.0]] {
        manager
            .add_point(CameraId::Camera1, p)
            .map_err(|e| e.to_string())?;
    }
    for meters in bed {
        manager
            .submit_measurement(CameraId::Camera1, meters)
            .map_err(|e| e.to_string())?;
    }

    // camera2: same bed from a pole 3 m up, 6 to 10 m away.
    let ground = [[-1.2, -10.0], [1.2, -10.0], [-1.2, -6.0], [1.2, -6.0]];
    let height = 3.0f64;
    manager
        .start(CameraId::Camera2, SessionPlan::full_3d())
        .map_err(|e| e.to_string())?;
    for p in [[258.56, 392.5], [381.44, 392.5]] {
        manager
            .add_point(CameraId::Camera2, p)
            .map_err(|e| e.to_string())?;
    }
    let mut answers: Vec<f64> = bed.to_vec();
    answers.push(height);
    answers.extend(
        ground
            .iter()
            .map(|g: &[f64; 2]| (g[0] * g[0] + g[1] * g[1] + height * height).sqrt()),
    );
    for meters in answers {
        manager
            .submit_measurement(CameraId::Camera2, meters)
            .map_err(|e| e.to_string())?;
    }

    for event in manager.drain_events() {
        log::debug!("{event:?}");
    }
    println!("pipeline paused after calibration: {}", gate.is_paused());

    let estimator = VolumeEstimator::new(manager.store(), &EstimatorOptions::default());
    let pair = SnapshotPair::new(
        DetectionSnapshot::new(14, 7680.0),
        DetectionSnapshot::new(11, 2500.0),
    );
    let report = estimator.generate_volume_report(&pair);
    println!("{}", report.summary());
    Ok(())
}
