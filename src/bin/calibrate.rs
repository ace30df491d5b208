use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;
use truck_volume::calibration::{
    CalibrationEvent, CalibrationManager, MeasurementSet, SessionPhase,
};
use truck_volume::config::{calibrate, site};
use truck_volume::error::CalibrationError;
use truck_volume::geometry::SolverOptions;
use truck_volume::persistence::JsonFilePersistence;
use truck_volume::{CameraId, PipelineGate};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = calibrate::load_config(Path::new(&config_path))?;
    let camera = config.camera;

    let site_config = config
        .site
        .as_deref()
        .and_then(site::load_optional)
        .unwrap_or_default();
    let mut presets: MeasurementSet = site_config
        .measurements(camera)
        .cloned()
        .unwrap_or_default();
    presets.merge(&config.measurements);

    let solver: SolverOptions = site_config.solver.clone();
    let mut manager = CalibrationManager::new(PipelineGate::new(), solver)
        .with_persistence(JsonFilePersistence::new(&config.output));
    // Keep the other camera's calibration when rewriting the file.
    manager.load_saved();
    manager.set_presets(camera, presets);

    manager.start(camera, config.plan).map_err(|e| e.to_string())?;
    for point in &config.points {
        if manager.phase(camera) != SessionPhase::CollectingPoints {
            break;
        }
        manager.add_point(camera, *point).map_err(|e| e.to_string())?;
    }
    if manager.phase(camera) == SessionPhase::CollectingPoints {
        manager.cancel(camera);
        return Err(format!(
            "{camera}: config provides {} point(s), {} required",
            config.points.len(),
            config.plan.manual_points.count()
        ));
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while let Some(measurement) = manager.current_measurement(camera) {
        print!("{}: ", measurement.prompt());
        io::stdout().flush().map_err(|e| e.to_string())?;
        let line = match lines.next() {
            Some(line) => line.map_err(|e| e.to_string())?,
            None => "cancel".to_string(),
        };
        let answer = line.trim();
        if answer.eq_ignore_ascii_case("cancel") {
            manager.cancel(camera);
            return Err(format!("{camera}: calibration cancelled"));
        }
        let value: f64 = match answer.parse() {
            Ok(v) => v,
            Err(_) => {
                println!("Please enter a number (or 'cancel').");
                continue;
            }
        };
        match manager.submit_measurement(camera, value) {
            Ok(_) => {}
            Err(CalibrationError::InputValidation(e)) => println!("{e}"),
            Err(e) => return Err(e.to_string()),
        }
    }

    report(&manager, camera)?;
    let mut save_error = None;
    for event in manager.drain_events() {
        if event.camera().is_some_and(|c| c != camera) {
            continue;
        }
        log::debug!("{event:?}");
        if let CalibrationEvent::PersistenceFailed { reason } = event {
            save_error = Some(reason);
        }
    }
    match save_error {
        Some(reason) => println!(
            "Calibration not saved to {}: {reason}",
            config.output.display()
        ),
        None => println!("Saved calibration to {}", config.output.display()),
    }
    Ok(())
}

fn report(manager: &CalibrationManager<PipelineGate>, camera: CameraId) -> Result<(), String> {
    let record = manager
        .record(camera)
        .ok_or_else(|| format!("{camera}: no calibration produced"))?;
    println!("{camera}: {}", record.tier().as_str());
    for (corner, p) in ["P1", "P2", "P3", "P4"].iter().zip(record.corners()) {
        println!("  {corner}: ({:.1}, {:.1})", p[0], p[1]);
    }
    println!("  scale: {:.3} px/m", record.pixels_per_meter());
    println!("  bed area: {:.2} m²", record.bed_area_m2());
    if let Some(q) = record.quality() {
        println!("  quality: {q:?}");
    }
    if record.degraded() {
        println!("  note: corners solved with the planar fallback");
    }
    Ok(())
}

fn usage() -> String {
    "Usage: calibrate <config.json>".to_string()
}
