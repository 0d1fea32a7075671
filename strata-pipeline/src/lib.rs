//! # Strata Pipeline
//!
//! Chains the three Strata codecs into one file-to-file transform.
//!
//! ```text
//! compress:    input ─► deflate ─► bzip2 ─► xz ─► input.xz
//! decompress:  input.xz ─► xz ─► bzip2 ─► deflate ─► input
//! ```
//!
//! Each intermediate result is staged in a private per-run scratch
//! directory ([`StagingArea`]) and removed as soon as the next stage has
//! consumed it. The final output is committed atomically, so a failed run
//! leaves neither a partial destination nor stray artifacts.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use strata_pipeline::{Pipeline, PipelineConfig, Preset};
//!
//! let pipeline = Pipeline::new(PipelineConfig::default().with_preset(Preset::Fast));
//! let report = pipeline.compress(Path::new("notes.txt"))?;
//! println!("{} -> {} bytes", report.input_len, report.output_len);
//! pipeline.verify(&report.output)?;
//! # Ok::<(), strata_core::StrataError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod naming;
pub mod pipeline;
pub mod stage;
pub mod staging;

pub use config::{PipelineConfig, Preset};
pub use naming::{compressed_path, decompressed_path};
pub use pipeline::{Pipeline, RunReport, StageReport, VerifyReport};
pub use stage::{Mode, Stage, StagePlan};
pub use staging::{ArtifactReader, ArtifactWriter, SealedArtifact, StagingArea};
