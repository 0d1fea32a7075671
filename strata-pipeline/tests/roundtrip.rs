//! End-to-end compress/decompress tests over real files.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use strata_codec::Codec;
use strata_pipeline::{Mode, Pipeline, PipelineConfig, Preset};

struct Workspace {
    files: tempfile::TempDir,
    scratch: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            files: tempfile::tempdir().unwrap(),
            scratch: tempfile::tempdir().unwrap(),
        }
    }

    fn config(&self) -> PipelineConfig {
        PipelineConfig::default().with_scratch_dir(self.scratch.path())
    }

    fn write(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.files.path().join(name);
        fs::write(&path, data).unwrap();
        path
    }

    fn scratch_is_empty(&self) -> bool {
        fs::read_dir(self.scratch.path()).unwrap().count() == 0
    }
}

fn roundtrip(ws: &Workspace, pipeline: &Pipeline, name: &str, data: &[u8]) {
    let input = ws.write(name, data);
    let packed = pipeline.compress(&input).unwrap();

    let restored = ws.files.path().join(format!("{name}.restored.xz"));
    fs::rename(&packed.output, &restored).unwrap();
    let unpacked = pipeline.decompress(&restored).unwrap();

    assert_eq!(unpacked.output, ws.files.path().join(format!("{name}.restored")));
    assert_eq!(fs::read(&unpacked.output).unwrap(), data);
    assert!(ws.scratch_is_empty());
}

#[test]
fn test_empty_file() {
    let ws = Workspace::new();
    let pipeline = Pipeline::new(ws.config());
    roundtrip(&ws, &pipeline, "empty", b"");
}

#[test]
fn test_highly_redundant_input_shrinks() {
    let ws = Workspace::new();
    let data = vec![0x41u8; 1_000_000];
    let input = ws.write("letters.txt", &data);

    let pipeline = Pipeline::new(ws.config());
    let report = pipeline.compress(&input).unwrap();
    assert!(report.output_len < data.len() as u64);
    assert!(report.ratio() < 0.01);

    fs::remove_file(&input).unwrap();
    pipeline.decompress(&report.output).unwrap();
    assert_eq!(fs::read(&input).unwrap(), data);
}

#[test]
fn test_random_input() {
    let ws = Workspace::new();
    let mut data = vec![0u8; 1_000_000];
    StdRng::seed_from_u64(42).fill_bytes(&mut data);

    let pipeline = Pipeline::new(ws.config().with_preset(Preset::Fast));
    roundtrip(&ws, &pipeline, "noise.bin", &data);
}

#[test]
fn test_every_check_roundtrips() {
    use strata_codec::IntegrityCheck;

    let ws = Workspace::new();
    let data = b"integrity checks on the outer layer ".repeat(300);
    for check in [
        IntegrityCheck::None,
        IntegrityCheck::Crc32,
        IntegrityCheck::Crc64,
        IntegrityCheck::Sha256,
    ] {
        let pipeline = Pipeline::new(ws.config().with_check(check));
        roundtrip(&ws, &pipeline, &format!("{check:?}.txt"), &data);
    }
}

#[test]
fn test_chunk_size_does_not_change_output() {
    let ws = Workspace::new();
    let mut data = Vec::new();
    while data.len() < 20_000 {
        data.extend_from_slice(b"Sphinx of black quartz, judge my vow. ");
    }
    let input = ws.write("pangram.txt", &data);

    let tiny = Pipeline::new(ws.config().with_chunk_size(1));
    let first = fs::read(tiny.compress(&input).unwrap().output).unwrap();

    let large = Pipeline::new(ws.config().with_chunk_size(64 * 1024).with_overwrite(true));
    let second = fs::read(large.compress(&input).unwrap().output).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_output_is_plain_xz() {
    let ws = Workspace::new();
    let data = b"the outermost layer is a standard xz stream".repeat(50);
    let input = ws.write("plain.txt", &data);

    let config = ws.config();
    let report = Pipeline::new(config.clone()).compress(&input).unwrap();
    let packed = fs::read(&report.output).unwrap();
    assert_eq!(&packed[..6], strata_codec::rangecoder::XZ_MAGIC);

    // Peel the layers by hand, outermost first.
    let [deflate, bzip2, xz] = config.codecs();
    let layer = xz.decode_bytes(&packed).unwrap();
    assert_eq!(&layer[..3], b"BZh");
    let layer = bzip2.decode_bytes(&layer).unwrap();
    assert_eq!(layer[0], 0x78);
    assert_eq!(deflate.decode_bytes(&layer).unwrap(), data);
}

#[test]
fn test_manual_layers_decompress() {
    let ws = Workspace::new();
    let data = b"built by hand, unpacked by the pipeline".repeat(20);
    let layered = Codec::range_coder()
        .encode_bytes(
            &Codec::block_sort()
                .encode_bytes(&Codec::deflate().encode_bytes(&data).unwrap())
                .unwrap(),
        )
        .unwrap();
    let input = ws.write("manual.bin.xz", &layered);

    let report = Pipeline::new(ws.config()).decompress(&input).unwrap();
    assert_eq!(report.output, ws.files.path().join("manual.bin"));
    assert_eq!(fs::read(&report.output).unwrap(), data);
}

#[test]
fn test_batch_runs_are_independent() {
    let ws = Workspace::new();
    let inputs: Vec<PathBuf> = (0..6)
        .map(|i| {
            let data = format!("batch member {i} ").repeat(500 * (i + 1));
            ws.write(&format!("member-{i}.txt"), data.as_bytes())
        })
        .collect();

    let pipeline = Pipeline::new(ws.config().with_preset(Preset::Fast));
    let finished = AtomicUsize::new(0);
    let results = pipeline.run_batch(Mode::Compress, &inputs, |_: &Path, result| {
        assert!(result.is_ok());
        finished.fetch_add(1, Ordering::SeqCst);
    });

    assert_eq!(finished.load(Ordering::SeqCst), inputs.len());
    for (input, result) in inputs.iter().zip(&results) {
        let report = result.as_ref().unwrap();
        assert_eq!(&report.input, input);
        assert!(report.output.exists());
    }
    assert!(ws.scratch_is_empty());

    for input in &inputs {
        fs::remove_file(input).unwrap();
    }
    let packed: Vec<PathBuf> = results.into_iter().map(|r| r.unwrap().output).collect();
    let results = pipeline.run_batch(Mode::Decompress, &packed, |_: &Path, _| {});
    for (i, result) in results.iter().enumerate() {
        let expected = format!("batch member {i} ").repeat(500 * (i + 1));
        let output = &result.as_ref().unwrap().output;
        assert_eq!(fs::read(output).unwrap(), expected.as_bytes());
    }
}

#[test]
fn test_overwrite_replaces_destination() {
    let ws = Workspace::new();
    let input = ws.write("again.txt", b"second time around");
    fs::write(ws.files.path().join("again.txt.xz"), b"stale").unwrap();

    let report = Pipeline::new(ws.config().with_overwrite(true))
        .compress(&input)
        .unwrap();
    assert_ne!(fs::read(&report.output).unwrap(), b"stale");
}
