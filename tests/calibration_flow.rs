mod common;

use common::fixtures::{approx_eq, calibrate_planar, scratch_path, PoleScene, RIGHT_TRIANGLE_BED};
use truck_volume::calibration::{
    CalibrationEvent, CalibrationManager, ManualPoints, SessionPhase, SessionPlan,
};
use truck_volume::error::CalibrationError;
use truck_volume::geometry::SolverOptions;
use truck_volume::persistence::JsonFilePersistence;
use truck_volume::{CalibrationTier, CameraId, Corner, NoPipeline, PipelineGate};

#[test]
fn both_cameras_calibrate_concurrently() {
    let _ = env_logger::builder().is_test(true).try_init();
    let gate = PipelineGate::new();
    let mut manager = CalibrationManager::new(gate.clone(), SolverOptions::default());
    let scene = PoleScene::new();

    manager.start(CameraId::Camera1, SessionPlan::basic()).unwrap();
    manager.start(CameraId::Camera2, SessionPlan::full_3d()).unwrap();
    assert!(gate.is_paused_for(CameraId::Camera1));
    assert!(gate.is_paused_for(CameraId::Camera2));

    manager.add_point(CameraId::Camera2, scene.pixels[0]).unwrap();
    manager.add_point(CameraId::Camera1, [0.0, 0.0]).unwrap();
    manager.add_point(CameraId::Camera2, scene.pixels[1]).unwrap();
    manager.add_point(CameraId::Camera1, [100.0, 0.0]).unwrap();
    for v in RIGHT_TRIANGLE_BED {
        manager.submit_measurement(CameraId::Camera1, v).unwrap();
    }
    assert_eq!(manager.phase(CameraId::Camera1), SessionPhase::Calibrated);
    assert!(gate.is_paused());

    for v in scene.answers() {
        manager.submit_measurement(CameraId::Camera2, v).unwrap();
    }
    assert!(!gate.is_paused());

    let store = manager.store();
    assert_eq!(store.tier(CameraId::Camera1), CalibrationTier::Basic2d);
    assert_eq!(store.tier(CameraId::Camera2), CalibrationTier::Full3d);

    let cam1 = store.get(CameraId::Camera1).unwrap();
    let p3 = cam1.corner(Corner::P3);
    assert!(approx_eq(p3[0], 0.0, 1e-6) && approx_eq(p3[1], 60.0, 1e-6));

    let cam2 = store.get(CameraId::Camera2).unwrap();
    assert!(!cam2.degraded());
    assert!(cam2.corner(Corner::P3)[1] > cam2.corner(Corner::P1)[1]);
    assert!(approx_eq(cam2.bed_area_m2(), 2.4 * 4.0, 1e-6));

    let events = manager.drain_events();
    let calibrated = events
        .iter()
        .filter(|e| matches!(e, CalibrationEvent::Calibrated { .. }))
        .count();
    assert_eq!(calibrated, 2);
    assert!(manager.drain_events().is_empty());
}

#[test]
fn scale_follows_uniform_rescaling_of_clicks() {
    let mut base = CalibrationManager::new(NoPipeline, SolverOptions::default());
    calibrate_planar(&mut base, CameraId::Camera1, [10.0, 20.0], [110.0, 20.0], RIGHT_TRIANGLE_BED);
    let ppm = base.record(CameraId::Camera1).unwrap().pixels_per_meter();

    for k in [0.25, 1.5, 4.0] {
        let mut scaled = CalibrationManager::new(NoPipeline, SolverOptions::default());
        calibrate_planar(
            &mut scaled,
            CameraId::Camera1,
            [10.0 * k, 20.0 * k],
            [110.0 * k, 20.0 * k],
            RIGHT_TRIANGLE_BED,
        );
        let got = scaled.record(CameraId::Camera1).unwrap().pixels_per_meter();
        assert!(approx_eq(got, ppm * k, 1e-9 * ppm * k), "k={k}: {got} vs {}", ppm * k);
    }
}

#[test]
fn tiers_are_monotone() {
    let mut manager = CalibrationManager::new(NoPipeline, SolverOptions::default());
    calibrate_planar(&mut manager, CameraId::Camera1, [0.0, 0.0], [100.0, 0.0], RIGHT_TRIANGLE_BED);
    PoleScene::new().calibrate(&mut manager, CameraId::Camera2);
    for (_, record) in manager.store().iter() {
        if record.tier() == CalibrationTier::Full3d {
            assert!(record.has_basic());
        }
        if record.has_basic() {
            assert!(record.corners().iter().flatten().all(|v| v.is_finite()));
            assert!(record.pixels_per_meter() > 0.0);
        }
    }
}

#[test]
fn invalid_measurement_is_asked_again() {
    let mut manager = CalibrationManager::new(NoPipeline, SolverOptions::default());
    manager.start(CameraId::Camera1, SessionPlan::basic()).unwrap();
    manager.add_point(CameraId::Camera1, [0.0, 0.0]).unwrap();
    manager.add_point(CameraId::Camera1, [100.0, 0.0]).unwrap();
    let asked = manager.current_measurement(CameraId::Camera1).unwrap();
    let err = manager.submit_measurement(CameraId::Camera1, -4.0).unwrap_err();
    assert!(matches!(err, CalibrationError::InputValidation(_)));
    assert_eq!(manager.current_measurement(CameraId::Camera1), Some(asked));
    assert!(manager
        .drain_events()
        .iter()
        .any(|e| matches!(e, CalibrationEvent::MeasurementRejected { .. })));
}

#[test]
fn four_clicked_corners_with_3d_measurements() {
    let scene = PoleScene::new();
    let mut manager = CalibrationManager::new(NoPipeline, SolverOptions::default());
    let plan = SessionPlan {
        manual_points: ManualPoints::Four,
        want_3d: true,
    };
    manager.start(CameraId::Camera2, plan).unwrap();
    for p in scene.pixels {
        manager.add_point(CameraId::Camera2, p).unwrap();
    }
    for v in scene.answers() {
        manager.submit_measurement(CameraId::Camera2, v).unwrap();
    }
    let record = manager.record(CameraId::Camera2).unwrap();
    assert_eq!(record.tier(), CalibrationTier::Full3d);
    assert_eq!(record.corners(), &scene.pixels);
}

#[test]
fn save_failure_does_not_block_calibration() {
    // A regular file cannot act as a parent directory.
    let blocker = scratch_path("blocker");
    std::fs::write(&blocker, b"x").unwrap();
    let mut manager = CalibrationManager::new(NoPipeline, SolverOptions::default())
        .with_persistence(JsonFilePersistence::new(blocker.join("calibration_data.json")));
    calibrate_planar(&mut manager, CameraId::Camera1, [0.0, 0.0], [100.0, 0.0], RIGHT_TRIANGLE_BED);
    assert!(manager.store().is_calibrated(CameraId::Camera1));
    assert!(manager
        .drain_events()
        .iter()
        .any(|e| matches!(e, CalibrationEvent::PersistenceFailed { .. })));
    let _ = std::fs::remove_file(&blocker);
}

#[test]
fn cancel_releases_the_pipeline_for_that_camera_only() {
    let gate = PipelineGate::new();
    let mut manager = CalibrationManager::new(gate.clone(), SolverOptions::default());
    manager.start(CameraId::Camera1, SessionPlan::basic()).unwrap();
    manager.start(CameraId::Camera2, SessionPlan::basic()).unwrap();
    manager.add_point(CameraId::Camera1, [0.0, 0.0]).unwrap();

    assert!(manager.cancel(CameraId::Camera1));
    assert!(!gate.is_paused_for(CameraId::Camera1));
    assert!(manager.control().is_paused_for(CameraId::Camera2));
    assert_eq!(manager.phase(CameraId::Camera1), SessionPhase::Idle);

    assert!(manager.cancel(CameraId::Camera2));
    assert!(!gate.is_paused());
    assert!(!manager.cancel(CameraId::Camera2));
}

#[test]
fn failed_solve_resumes_the_pipeline() {
    let gate = PipelineGate::new();
    let mut manager = CalibrationManager::new(gate.clone(), SolverOptions::default());
    let plan = SessionPlan {
        manual_points: ManualPoints::Four,
        want_3d: false,
    };
    manager.start(CameraId::Camera1, plan).unwrap();
    // P3 and P4 swapped: the clicked outline crosses itself.
    for p in [[0.0, 0.0], [100.0, 0.0], [100.0, 60.0], [0.0, 60.0]] {
        manager.add_point(CameraId::Camera1, p).unwrap();
    }
    assert!(gate.is_paused_for(CameraId::Camera1));
    let mut result = Ok(());
    for v in RIGHT_TRIANGLE_BED {
        if let Err(e) = manager.submit_measurement(CameraId::Camera1, v) {
            result = Err(e);
        }
    }
    assert!(matches!(result, Err(CalibrationError::Geometry(_))));
    assert!(!gate.is_paused());
    assert!(manager.record(CameraId::Camera1).is_none());
    let events = manager.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, CalibrationEvent::Failed { .. })));
    assert!(events
        .iter()
        .filter(|e| e.camera() == Some(CameraId::Camera1))
        .any(|e| matches!(e, CalibrationEvent::PipelineResumed { .. })));
}
