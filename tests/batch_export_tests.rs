//! Batch runs, config files and exports.

use std::io::Write;

use pso_swarm_lib::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn batch_collects_every_run() {
    let config = SwarmConfig {
        particle_count: 15,
        objective: Objective::Himmelblau,
        seed: Some(17),
        ..SwarmConfig::default()
    };
    let finished = AtomicUsize::new(0);

    let summary = process_runs(&config, 6, 150, |_, best| {
        assert!(best.is_found());
        finished.fetch_add(1, Ordering::Relaxed);
    })
    .unwrap();

    assert_eq!(finished.load(Ordering::Relaxed), 6);
    assert_eq!(summary.all_best_fitness.len(), 6);
    let min = summary.all_best_fitness.iter().cloned().fold(f64::INFINITY, f64::min);
    assert_eq!(summary.best.fitness, min);
    assert!(summary.mean_fitness >= min);
    assert!(summary.best.fitness < 1e-2, "best {}", summary.best);
}

#[test]
fn seeded_batches_repeat() {
    let config = SwarmConfig {
        objective: Objective::Ackley,
        seed: Some(3),
        ..SwarmConfig::default()
    };
    let a = process_runs(&config, 4, 40, |_, _| {}).unwrap();
    let b = process_runs(&config, 4, 40, |_, _| {}).unwrap();
    assert_eq!(a.all_best_fitness, b.all_best_fitness);
}

#[test]
fn batch_rejects_invalid_config() {
    let config = SwarmConfig {
        particle_count: 2,
        ..SwarmConfig::default()
    };
    assert!(matches!(
        process_runs(&config, 1, 10, |_, _| {}),
        Err(PsoError::InvalidConfig { .. })
    ));
}

#[test]
fn config_file_is_loaded() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"particle_count": 12, "objective": "beale", "inertia_weight": 0.7, "seed": 5}}"#
    )
    .unwrap();

    let config = SwarmConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.particle_count, 12);
    assert_eq!(config.objective, Objective::Beale);
    assert_eq!(config.inertia_weight, 0.7);
    assert_eq!(config.seed, Some(5));

    assert!(matches!(
        SwarmConfig::from_json_file(file.path().with_extension("missing")),
        Err(PsoError::Io(_))
    ));
}

#[test]
fn trace_file_has_one_row_per_particle_per_step() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.csv");
    let mut driver = SwarmDriver::new(SwarmConfig {
        particle_count: 5,
        seed: Some(1),
        ..SwarmConfig::default()
    })
    .unwrap();

    let mut writer = TraceWriter::create(&path).unwrap();
    writer.write_all(&driver.swarm().trace_records()).unwrap();
    for _ in 0..3 {
        driver.step();
        writer.write_all(&driver.swarm().trace_records()).unwrap();
    }
    writer.finish().unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let rows: Vec<TraceRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 20);
    assert_eq!(rows.last().unwrap().iteration, 3);
    assert!(rows.iter().all(|r| r.best_fitness <= r.fitness));
}

#[test]
fn sweep_workbook_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sweep.xlsx");
    let range = ParamRange {
        swarm_size: (5, 10, 5),
        max_iterations: (10, 10, 10),
        inertia_weight: (0.5, 0.5, 0.1),
        cognitive_weight: (1.5, 1.5, 0.1),
        social_weight: (1.0, 1.5, 0.5),
    };

    let report = optimize_by_range(Objective::Sphere, &range, 1, Some(8), |_| {});
    export_full_experiments_single_sheet(&report, &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    // xlsx files are zip archives
    assert_eq!(&bytes[..2], b"PK");
}
