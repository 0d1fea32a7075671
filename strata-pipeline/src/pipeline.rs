//! Pipeline orchestration.
//!
//! A run executes its [`StagePlan`] strictly in order. Stage `i` reads
//! the artifact sealed by stage `i - 1` (or the input file for the first
//! stage) and writes a fresh artifact; the last stage writes into a
//! hidden partial file beside the destination, which is renamed into
//! place only after every stage has succeeded.

use crate::config::PipelineConfig;
use crate::naming::{compressed_path, decompressed_path};
use crate::stage::{Mode, StagePlan};
use crate::staging::{ArtifactReader, StagingArea};
use filetime::FileTime;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use strata_core::{Direction, Result, StrataError};
use tempfile::Builder;

/// Byte counts of one executed stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    /// Position in the plan.
    pub index: usize,
    /// Codec name.
    pub codec: &'static str,
    /// Direction the codec ran in.
    pub direction: Direction,
    /// Bytes consumed.
    pub bytes_in: u64,
    /// Bytes produced.
    pub bytes_out: u64,
}

/// Outcome of a successful [`Pipeline::run`].
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// What the run did.
    pub mode: Mode,
    /// Input file.
    pub input: PathBuf,
    /// Committed output file.
    pub output: PathBuf,
    /// Input size in bytes.
    pub input_len: u64,
    /// Output size in bytes.
    pub output_len: u64,
    /// Per-stage byte counts, in execution order.
    pub stages: Vec<StageReport>,
    /// Wall-clock duration.
    pub elapsed_ms: u128,
}

impl RunReport {
    /// Output size relative to input size.
    pub fn ratio(&self) -> f64 {
        if self.input_len == 0 {
            1.0
        } else {
            self.output_len as f64 / self.input_len as f64
        }
    }
}

/// Outcome of a successful [`Pipeline::verify`].
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    /// Compressed file that was checked.
    pub input: PathBuf,
    /// Compressed size in bytes.
    pub compressed_len: u64,
    /// Size of the data it decodes to.
    pub recovered_len: u64,
    /// Per-stage byte counts of the decode plan.
    pub stages: Vec<StageReport>,
    /// Wall-clock duration.
    pub elapsed_ms: u128,
}

/// Where the current stage reads from.
enum StageSource {
    Input(BufReader<File>),
    Artifact(ArtifactReader),
}

impl StageSource {
    fn destroy(self) -> Result<()> {
        match self {
            StageSource::Input(_) => Ok(()),
            StageSource::Artifact(reader) => reader.destroy(),
        }
    }
}

impl Read for StageSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            StageSource::Input(reader) => reader.read(buf),
            StageSource::Artifact(reader) => reader.read(buf),
        }
    }
}

/// The deflate → bzip2 → xz pipeline.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline with the given configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The stage plan executed for `mode`.
    pub fn plan(&self, mode: Mode) -> StagePlan {
        StagePlan::for_mode(mode, &self.config.codecs())
    }

    /// Where a `mode` run over `input` writes its result.
    pub fn output_path(&self, mode: Mode, input: &Path) -> Result<PathBuf> {
        let plan = self.plan(mode);
        let outer = plan
            .outer_codec()
            .ok_or_else(|| StrataError::invalid_input(input, "empty stage plan"))?;
        match mode {
            Mode::Compress => compressed_path(input, outer),
            Mode::Decompress => decompressed_path(input, outer),
        }
    }

    /// Compress `input` into `<input>.xz`.
    pub fn compress(&self, input: &Path) -> Result<RunReport> {
        self.run(Mode::Compress, input)
    }

    /// Decompress `input`, stripping the `.xz` suffix.
    pub fn decompress(&self, input: &Path) -> Result<RunReport> {
        self.run(Mode::Decompress, input)
    }

    /// Run the full plan for `mode` over `input`.
    ///
    /// On success exactly one new file exists: the destination. On failure
    /// neither the destination nor any staged artifact is left behind,
    /// and the error names the stage that failed.
    pub fn run(&self, mode: Mode, input: &Path) -> Result<RunReport> {
        let started = Instant::now();
        let input_len = check_input(input)?;
        let plan = self.plan(mode);
        let output = self.output_path(mode, input)?;

        if !self.config.overwrite && output.exists() {
            return Err(StrataError::output_exists(output));
        }

        let parent = match output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let partial = Builder::new()
            .prefix(".strata-")
            .suffix(".partial")
            .tempfile_in(parent)
            .map_err(|e| StrataError::artifact(parent, e))?;

        let mut sink = BufWriter::new(partial);
        let stages = self.execute(&plan, input, &mut sink)?;
        let partial = sink
            .into_inner()
            .map_err(|e| StrataError::artifact(&output, e.into_error()))?;

        let committed = if self.config.overwrite {
            partial.persist(&output)
        } else {
            partial.persist_noclobber(&output)
        };
        committed.map_err(|e| {
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                StrataError::output_exists(&output)
            } else {
                StrataError::artifact(&output, e.error)
            }
        })?;

        if self.config.preserve_mtime {
            if let Err(e) = copy_mtime(input, &output) {
                warn!("could not preserve mtime on {}: {}", output.display(), e);
            }
        }

        let output_len = stages.last().map_or(input_len, |s| s.bytes_out);
        let report = RunReport {
            mode,
            input: input.to_path_buf(),
            output,
            input_len,
            output_len,
            stages,
            elapsed_ms: started.elapsed().as_millis(),
        };
        info!(
            "{} {} -> {} ({} -> {} bytes)",
            mode,
            report.input.display(),
            report.output.display(),
            report.input_len,
            report.output_len
        );
        Ok(report)
    }

    /// Decode `input` through every stage and discard the result.
    ///
    /// Succeeds only if all three layers decode cleanly and every
    /// integrity check passes.
    pub fn verify(&self, input: &Path) -> Result<VerifyReport> {
        let started = Instant::now();
        let compressed_len = check_input(input)?;
        let plan = self.plan(Mode::Decompress);
        let stages = self.execute(&plan, input, &mut io::sink())?;

        let recovered_len = stages.last().map_or(compressed_len, |s| s.bytes_out);
        info!(
            "verified {} ({} -> {} bytes)",
            input.display(),
            compressed_len,
            recovered_len
        );
        Ok(VerifyReport {
            input: input.to_path_buf(),
            compressed_len,
            recovered_len,
            stages,
            elapsed_ms: started.elapsed().as_millis(),
        })
    }

    /// Run `mode` over every input in parallel.
    ///
    /// Runs are independent: each has its own staging namespace and a
    /// failure in one does not stop the others. `observer` is called from
    /// worker threads as each run finishes. Results are in input order.
    pub fn run_batch<F>(&self, mode: Mode, inputs: &[PathBuf], observer: F) -> Vec<Result<RunReport>>
    where
        F: Fn(&Path, &Result<RunReport>) + Sync,
    {
        inputs
            .par_iter()
            .map(|input| {
                let result = self.run(mode, input);
                observer(input, &result);
                result
            })
            .collect()
    }

    fn execute<W>(&self, plan: &StagePlan, input: &Path, sink: &mut W) -> Result<Vec<StageReport>>
    where
        W: Write + ?Sized,
    {
        let staging = StagingArea::new(self.config.scratch_dir.as_deref())?;
        debug!(
            "run {}: {} staged in {}",
            staging.run_id(),
            plan,
            staging.path().display()
        );

        let chunk_size = self.config.chunk_size;
        let file = File::open(input).map_err(|e| StrataError::invalid_input(input, e.to_string()))?;
        let mut source = StageSource::Input(BufReader::new(file));
        let mut reports = Vec::with_capacity(plan.len());
        let last = plan.len().saturating_sub(1);

        for (index, stage) in plan.stages().iter().enumerate() {
            let codec = stage.codec.name();
            let at_stage = |e: StrataError| e.at_stage(index, codec, stage.direction);

            let stats = if index == last {
                stage.run(&mut source, &mut *sink, chunk_size).map_err(at_stage)?
            } else {
                let mut writer = staging.create(index, codec).map_err(at_stage)?;
                let stats = stage
                    .run(&mut source, &mut writer, chunk_size)
                    .map_err(at_stage)?;
                let next = writer.seal().and_then(|a| a.open()).map_err(at_stage)?;
                std::mem::replace(&mut source, StageSource::Artifact(next))
                    .destroy()
                    .map_err(at_stage)?;
                stats
            };

            debug!(
                "stage {} {}: {} -> {} bytes",
                index, stage, stats.bytes_in, stats.bytes_out
            );
            reports.push(StageReport {
                index,
                codec,
                direction: stage.direction,
                bytes_in: stats.bytes_in,
                bytes_out: stats.bytes_out,
            });
        }

        source.destroy()?;
        staging.close()?;
        Ok(reports)
    }
}

fn check_input(input: &Path) -> Result<u64> {
    let metadata =
        fs::metadata(input).map_err(|e| StrataError::invalid_input(input, e.to_string()))?;
    if !metadata.is_file() {
        return Err(StrataError::invalid_input(input, "not a regular file"));
    }
    Ok(metadata.len())
}

fn copy_mtime(from: &Path, to: &Path) -> io::Result<()> {
    let metadata = fs::metadata(from)?;
    filetime::set_file_mtime(to, FileTime::from_last_modification_time(&metadata))
}
