//! Compress and decompress commands.

use crate::utils::{create_progress_bar, format_saving, print_stages};
use clap::{Args, ValueEnum};
use dialoguer::Confirm;
use serde::Serialize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use strata_codec::IntegrityCheck;
use strata_pipeline::{Mode, Pipeline, PipelineConfig, Preset, RunReport};

/// Compression level preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Level {
    /// Lowest levels on every layer
    Fast,
    /// Best deflate and bzip2, xz preset 6
    Default,
    /// Highest levels on every layer
    Best,
}

impl From<Level> for Preset {
    fn from(level: Level) -> Self {
        match level {
            Level::Fast => Preset::Fast,
            Level::Default => Preset::Default,
            Level::Best => Preset::Best,
        }
    }
}

/// Integrity check stored in the outer xz layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Check {
    /// No check
    None,
    /// CRC32
    Crc32,
    /// CRC64
    Crc64,
    /// SHA-256
    Sha256,
}

impl From<Check> for IntegrityCheck {
    fn from(check: Check) -> Self {
        match check {
            Check::None => IntegrityCheck::None,
            Check::Crc32 => IntegrityCheck::Crc32,
            Check::Crc64 => IntegrityCheck::Crc64,
            Check::Sha256 => IntegrityCheck::Sha256,
        }
    }
}

/// Options shared by `compress` and `decompress`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Files to process
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Level preset (overrides the config file)
    #[arg(short, long, value_enum)]
    pub level: Option<Level>,

    /// Integrity check for the xz layer
    #[arg(long, value_enum)]
    pub check: Option<Check>,

    /// Stage window size in bytes
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Parent directory for staged intermediate files
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,

    /// Overwrite existing output files without asking
    #[arg(short, long)]
    pub force: bool,

    /// Leave the output with the current time instead of the input's mtime
    #[arg(long)]
    pub no_preserve_mtime: bool,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output as JSON (machine-readable)
    #[arg(short, long)]
    pub json: bool,
}

impl RunArgs {
    /// Configuration file (or defaults) with command-line overrides applied.
    pub fn pipeline_config(&self) -> strata_core::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(level) = self.level {
            config = config.with_preset(level.into());
        }
        if let Some(check) = self.check {
            config = config.with_check(check.into());
        }
        if let Some(chunk_size) = self.chunk_size {
            config = config.with_chunk_size(chunk_size);
        }
        if let Some(dir) = &self.scratch_dir {
            config = config.with_scratch_dir(dir);
        }
        if self.force {
            config = config.with_overwrite(true);
        }
        if self.no_preserve_mtime {
            config = config.with_preserve_mtime(false);
        }
        Ok(config)
    }
}

/// Per-file result, as printed with `--json`.
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Outcome {
    Ok {
        #[serde(flatten)]
        report: RunReport,
    },
    Failed {
        input: PathBuf,
        error: String,
        stage: Option<usize>,
        codec: Option<&'static str>,
    },
    Skipped {
        input: PathBuf,
    },
}

impl Outcome {
    fn from_result(input: &Path, result: strata_core::Result<RunReport>) -> Self {
        match result {
            Ok(report) => Outcome::Ok { report },
            Err(e) => Outcome::Failed {
                input: input.to_path_buf(),
                error: e.to_string(),
                stage: e.stage(),
                codec: e.codec(),
            },
        }
    }
}

pub fn cmd_compress(args: &RunArgs, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    run_files(Mode::Compress, args, verbose)
}

pub fn cmd_decompress(args: &RunArgs, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    run_files(Mode::Decompress, args, verbose)
}

fn run_files(mode: Mode, args: &RunArgs, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = Pipeline::new(args.pipeline_config()?);
    let replacing = Pipeline::new(pipeline.config().clone().with_overwrite(true));

    // Ask before clobbering, but only when someone is there to answer.
    let interactive = !args.force && !args.json && std::io::stdin().is_terminal();
    let mut fresh = Vec::new();
    let mut approved = Vec::new();
    let mut slots: Vec<Option<Outcome>> = Vec::with_capacity(args.files.len());
    for (index, file) in args.files.iter().enumerate() {
        slots.push(None);
        match pipeline.output_path(mode, file) {
            Ok(target) if interactive && target.exists() => {
                let overwrite = Confirm::new()
                    .with_prompt(format!("{} already exists. Overwrite?", target.display()))
                    .default(false)
                    .interact()?;
                if overwrite {
                    approved.push(index);
                } else {
                    slots[index] = Some(Outcome::Skipped {
                        input: file.clone(),
                    });
                }
            }
            _ => fresh.push(index),
        }
    }

    let total = (fresh.len() + approved.len()) as u64;
    let pb = create_progress_bar(total, total > 1 && !args.json);
    pb.set_message(mode.to_string());
    let observe = |_: &Path, _: &strata_core::Result<RunReport>| pb.inc(1);

    let groups = [(&pipeline, fresh.as_slice()), (&replacing, approved.as_slice())];
    let outcomes = run_groups(mode, &args.files, &groups, slots, observe);
    pb.finish_and_clear();

    let failed = outcomes
        .iter()
        .filter(|o| matches!(o, Outcome::Failed { .. }))
        .count();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        for outcome in &outcomes {
            print_outcome(mode, outcome, verbose);
        }
    }

    if failed > 0 {
        return Err(format!("{failed} of {} file(s) failed", outcomes.len()).into());
    }
    Ok(())
}

/// Run each group of argument indices through its pipeline.
///
/// Outcomes come back in argument order, whichever group a file was in.
fn run_groups<F>(
    mode: Mode,
    files: &[PathBuf],
    groups: &[(&Pipeline, &[usize])],
    mut slots: Vec<Option<Outcome>>,
    observe: F,
) -> Vec<Outcome>
where
    F: Fn(&Path, &strata_core::Result<RunReport>) + Sync + Copy,
{
    for &(pipeline, indices) in groups {
        let inputs: Vec<PathBuf> = indices.iter().map(|&i| files[i].clone()).collect();
        let results = pipeline.run_batch(mode, &inputs, observe);
        for ((&index, input), result) in indices.iter().zip(&inputs).zip(results) {
            slots[index] = Some(Outcome::from_result(input, result));
        }
    }
    slots.into_iter().flatten().collect()
}

fn print_outcome(mode: Mode, outcome: &Outcome, verbose: bool) {
    match outcome {
        Outcome::Ok { report } => {
            let (before, after) = match mode {
                Mode::Compress => (report.input_len, report.output_len),
                Mode::Decompress => (report.output_len, report.input_len),
            };
            println!(
                "{}: {} -> {} ({} -> {} bytes, {} saved)",
                mode,
                report.input.display(),
                report.output.display(),
                report.input_len,
                report.output_len,
                format_saving(before, after)
            );
            if verbose {
                print_stages(&report.stages);
            }
        }
        Outcome::Failed { input, error, .. } => {
            eprintln!("FAILED: {} - {}", input.display(), error);
        }
        Outcome::Skipped { input } => {
            println!("skipped: {}", input.display());
        }
    }
}
