use extraction_core::{Metadata, OptimizerConfig};
use extraction_optimizer::{
    create_optimized_config, optimize_batch, OptimizationEngine, KB, MB,
};

fn create(dir: &tempfile::TempDir, name: &str, size: u64) -> String {
    let path = dir.path().join(name);
    std::fs::File::create(&path).unwrap().set_len(size).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_create_optimized_config_for_dicom() {
    let dir = tempfile::tempdir().unwrap();
    let path = create(&dir, "chest.dcm", 5 * MB);

    let config = create_optimized_config(&path);
    assert_eq!(config.chunk_size, 128 * KB);
    assert_eq!(config.estimated_chunks, 40);
    assert_eq!(config.complexity, 0.9);
    assert!(config.expected_processing_time > 0.0);
}

#[test]
fn test_create_optimized_config_never_fails() {
    let config = create_optimized_config("/does/not/exist.fits");
    assert_eq!(config.chunk_size, MB);
    assert_eq!(config.estimated_chunks, 0);
    assert_eq!(config.complexity, 0.5);
}

#[test]
fn test_optimize_batch_spreads_hard_files() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![
        create(&dir, "a.jpg", MB),
        create(&dir, "b.dcm", MB),
        create(&dir, "c.fits", MB),
        create(&dir, "d.pdf", MB),
    ];

    let distribution = optimize_batch(&files, 2);
    assert_eq!(distribution[&0], vec![files[1].clone(), files[3].clone()]);
    assert_eq!(distribution[&1], vec![files[2].clone(), files[0].clone()]);

    let total: usize = distribution.values().map(Vec::len).sum();
    assert_eq!(total, files.len());
}

#[test]
fn test_engine_learns_from_recorded_extractions() {
    let dir = tempfile::tempdir().unwrap();
    let path = create(&dir, "volume.h5", 8 * MB);

    let engine = OptimizationEngine::from_config(&OptimizerConfig {
        history_cap: 10,
        gpu_enabled: Some(false),
    });
    let heuristic = engine.execution_hints(&path).expected_time;

    engine.record_extraction(&path, 8 * MB, 4.0);
    let learned = engine.execution_hints(&path).expected_time;

    assert!((learned - 4.0).abs() < 1e-9);
    assert_ne!(heuristic, learned);
    assert_eq!(engine.predictor().get_stats("h5").unwrap().count, 1);

    let metadata = Metadata::new();
    assert_eq!(engine.finalize_metadata(&path, metadata.clone()), metadata);
}

#[test]
fn test_recording_uses_given_size_without_touching_the_file() {
    let engine = OptimizationEngine::default();
    engine.record_extraction("/no/such/dir/scan.DCM", 4 * MB, 2.0);

    let stats = engine.predictor().get_stats("dcm").unwrap();
    assert_eq!(stats.count, 1);
    assert_eq!(stats.mean_size, (4 * MB) as f64);
    assert!((engine.predictor().predict_time("dcm", 8 * MB) - 4.0).abs() < 1e-9);
}
