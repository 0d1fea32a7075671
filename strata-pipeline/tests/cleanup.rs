//! Staged artifacts and partial outputs never outlive a run.

use std::fs;
use std::path::{Path, PathBuf};
use strata_codec::{BlockSortOptions, Codec, DeflateOptions, RangeCoderOptions};
use strata_core::{Direction, ErrorKind, StrataError};
use strata_pipeline::{Pipeline, PipelineConfig};

fn entries(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    paths.sort();
    paths
}

fn setup() -> (tempfile::TempDir, tempfile::TempDir, Pipeline) {
    let files = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(PipelineConfig::default().with_scratch_dir(scratch.path()));
    (files, scratch, pipeline)
}

/// Decompress `payload` (named `broken.xz`) and expect a failure at `stage`.
fn expect_decode_failure(payload: &[u8], stage: usize, codec: &str) {
    let (files, scratch, pipeline) = setup();
    let input = files.path().join("broken.xz");
    fs::write(&input, payload).unwrap();

    let err = pipeline.decompress(&input).unwrap_err();
    assert_eq!(err.stage(), Some(stage), "{err}");
    assert_eq!(err.codec(), Some(codec));
    assert_eq!(err.kind(), ErrorKind::Stream);
    match &err {
        StrataError::Stage { direction, .. } => assert_eq!(*direction, Direction::Decode),
        other => panic!("expected a stage error, got {other:?}"),
    }

    assert!(entries(scratch.path()).is_empty());
    assert_eq!(entries(files.path()), vec![input]);
}

/// Compress with a rejected codec setting and expect a failure at `stage`.
fn expect_encode_failure(config: PipelineConfig, stage: usize, codec: &str) {
    let files = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let input = files.path().join("source.txt");
    fs::write(&input, b"layered text ".repeat(512)).unwrap();

    let pipeline = Pipeline::new(config.with_scratch_dir(scratch.path()));
    let err = pipeline.compress(&input).unwrap_err();
    assert_eq!(err.stage(), Some(stage), "{err}");
    assert_eq!(err.codec(), Some(codec));
    assert_eq!(err.kind(), ErrorKind::Init);
    match &err {
        StrataError::Stage { direction, .. } => assert_eq!(*direction, Direction::Encode),
        other => panic!("expected a stage error, got {other:?}"),
    }

    assert!(entries(scratch.path()).is_empty());
    assert_eq!(entries(files.path()), vec![input]);
}

#[test]
fn test_success_leaves_only_output() {
    let (files, scratch, pipeline) = setup();
    let input = files.path().join("report.csv");
    fs::write(&input, b"id,value\n1,2\n3,4\n".repeat(100)).unwrap();

    let report = pipeline.compress(&input).unwrap();
    assert_eq!(entries(files.path()), vec![input, report.output]);
    assert!(entries(scratch.path()).is_empty());
}

#[test]
fn test_failure_in_first_decode_stage() {
    expect_decode_failure(b"this was never an xz stream", 0, "xz");
}

#[test]
fn test_failure_in_second_decode_stage() {
    let payload = Codec::range_coder()
        .encode_bytes(b"definitely not bzip2")
        .unwrap();
    expect_decode_failure(&payload, 1, "bzip2");
}

#[test]
fn test_failure_in_final_decode_stage() {
    let inner = Codec::block_sort().encode_bytes(b"not a zlib stream").unwrap();
    let payload = Codec::range_coder().encode_bytes(&inner).unwrap();
    expect_decode_failure(&payload, 2, "deflate");
}

#[test]
fn test_failure_in_first_encode_stage() {
    let config = PipelineConfig {
        deflate: DeflateOptions::new(12),
        ..PipelineConfig::default()
    };
    expect_encode_failure(config, 0, "deflate");
}

#[test]
fn test_failure_in_second_encode_stage() {
    let config = PipelineConfig {
        block_sort: BlockSortOptions::new(0),
        ..PipelineConfig::default()
    };
    expect_encode_failure(config, 1, "bzip2");
}

#[test]
fn test_failure_in_final_encode_stage() {
    let config = PipelineConfig {
        range_coder: RangeCoderOptions::new(10),
        ..PipelineConfig::default()
    };
    expect_encode_failure(config, 2, "xz");
}

#[test]
fn test_existing_output_is_untouched() {
    let (files, scratch, pipeline) = setup();
    let input = files.path().join("keep.txt");
    let existing = files.path().join("keep.txt.xz");
    fs::write(&input, b"fresh").unwrap();
    fs::write(&existing, b"precious").unwrap();

    let err = pipeline.compress(&input).unwrap_err();
    assert!(matches!(err, StrataError::OutputExists { .. }));
    assert_eq!(err.kind(), ErrorKind::Input);
    assert_eq!(fs::read(&existing).unwrap(), b"precious");
    assert_eq!(entries(files.path()), vec![input, existing]);
    assert!(entries(scratch.path()).is_empty());
}

#[test]
fn test_invalid_input_creates_nothing() {
    let (files, scratch, pipeline) = setup();
    let subdir = files.path().join("nested");
    fs::create_dir(&subdir).unwrap();

    let err = pipeline.compress(&subdir).unwrap_err();
    assert!(matches!(err, StrataError::InvalidInput { .. }));
    assert_eq!(entries(files.path()), vec![subdir]);
    assert!(entries(scratch.path()).is_empty());
}

#[test]
fn test_unusable_scratch_dir() {
    let files = tempfile::tempdir().unwrap();
    let input = files.path().join("data.txt");
    fs::write(&input, b"payload").unwrap();

    let config = PipelineConfig::default().with_scratch_dir(files.path().join("missing"));
    let err = Pipeline::new(config).compress(&input).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Artifact);
    assert_eq!(entries(files.path()), vec![input]);
}

#[test]
fn test_repeated_runs_do_not_collide() {
    let (files, scratch, pipeline) = setup();
    let input = files.path().join("loop.txt");
    fs::write(&input, b"same input every time".repeat(10)).unwrap();

    for _ in 0..5 {
        let report = pipeline.compress(&input).unwrap();
        fs::remove_file(&report.output).unwrap();
    }
    assert!(entries(scratch.path()).is_empty());
}
