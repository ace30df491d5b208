mod common;

use common::fixtures::{calibrate_planar, scratch_path, PoleScene, RIGHT_TRIANGLE_BED};
use truck_volume::calibration::CalibrationManager;
use truck_volume::geometry::SolverOptions;
use truck_volume::persistence::{
    export_json, import_json, CalibrationPersistence, JsonFilePersistence,
};
use truck_volume::{CalibrationTier, CameraId, NoPipeline};

#[test]
fn full_3d_round_trip_keeps_scale_and_tier() {
    let mut manager = CalibrationManager::new(NoPipeline, SolverOptions::default());
    PoleScene::new().calibrate(&mut manager, CameraId::Camera2);
    calibrate_planar(&mut manager, CameraId::Camera1, [0.0, 0.0], [100.0, 0.0], RIGHT_TRIANGLE_BED);

    let text = export_json(manager.store()).unwrap();
    let restored = import_json(&text).unwrap();
    for camera in CameraId::ALL {
        let before = manager.store().get(camera).unwrap();
        let after = restored.get(camera).unwrap();
        assert_eq!(after.tier(), before.tier());
        assert!((after.pixels_per_meter() - before.pixels_per_meter()).abs() < 1e-12);
        for (a, b) in after.corners().iter().zip(before.corners()) {
            assert!((a[0] - b[0]).abs() < 1e-9 && (a[1] - b[1]).abs() < 1e-9);
        }
        assert_eq!(after.quality(), before.quality());
    }
    assert_eq!(restored.tier(CameraId::Camera2), CalibrationTier::Full3d);
}

#[test]
fn exported_document_uses_documented_keys() {
    let mut manager = CalibrationManager::new(NoPipeline, SolverOptions::default());
    PoleScene::new().calibrate(&mut manager, CameraId::Camera1);
    let text = export_json(manager.store()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["version"], 1);
    let cam = &value["cameras"]["camera1"];
    for key in ["corners", "pixelsPerMeter", "edgeDistances", "cameraDistances", "cameraHeight"] {
        assert!(!cam[key].is_null(), "missing {key}");
    }
    assert!(cam["edgeDistances"]["P1-P2"].is_number());
    assert!(cam["cameraDistances"]["P4"].is_number());
}

#[test]
fn stored_scale_is_recomputed_on_import() {
    let text = r#"{
        "version": 1,
        "cameras": {
            "camera1": {
                "corners": [[0, 0], [100, 0], [0, 60], [100, 60]],
                "pixelsPerMeter": 99.0,
                "edgeDistances": { "P1-P2": 5.0, "P1-P3": 3.0 }
            }
        }
    }"#;
    let store = import_json(text).unwrap();
    let record = store.get(CameraId::Camera1).unwrap();
    assert!((record.pixels_per_meter() - 20.0).abs() < 1e-12);
    assert_eq!(record.tier(), CalibrationTier::Basic2d);
}

#[test]
fn file_backend_saves_and_restores() {
    let path = scratch_path("roundtrip");
    let _ = std::fs::remove_file(&path);
    let backend = JsonFilePersistence::new(&path);
    assert!(backend.load().unwrap().is_none());

    let mut manager = CalibrationManager::new(NoPipeline, SolverOptions::default())
        .with_persistence(JsonFilePersistence::new(&path));
    calibrate_planar(&mut manager, CameraId::Camera1, [0.0, 0.0], [100.0, 0.0], RIGHT_TRIANGLE_BED);
    assert!(path.exists());

    let mut reopened = CalibrationManager::new(NoPipeline, SolverOptions::default())
        .with_persistence(JsonFilePersistence::new(&path));
    assert!(reopened.load_saved());
    let saved = manager.record(CameraId::Camera1).unwrap();
    let loaded = reopened.record(CameraId::Camera1).unwrap();
    assert_eq!(loaded.tier(), saved.tier());
    assert!((loaded.pixels_per_meter() - saved.pixels_per_meter()).abs() < 1e-9);
    assert_eq!(reopened.store().tier(CameraId::Camera2), CalibrationTier::Uncalibrated);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn broken_file_keeps_in_memory_state() {
    let path = scratch_path("broken");
    std::fs::write(&path, "{ not json").unwrap();
    let mut manager = CalibrationManager::new(NoPipeline, SolverOptions::default())
        .with_persistence(JsonFilePersistence::new(&path));
    assert!(!manager.load_saved());
    assert!(manager.store().is_empty());
    let _ = std::fs::remove_file(&path);
}
