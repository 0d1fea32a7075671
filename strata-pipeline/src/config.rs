//! Pipeline configuration.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use strata_codec::{BlockSortOptions, Codec, DeflateOptions, IntegrityCheck, RangeCoderOptions};
use strata_core::{DEFAULT_CHUNK_SIZE, Result, StrataError};

/// Named level presets applied to all three codecs at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Lowest levels everywhere.
    Fast,
    /// Best deflate and bzip2, xz preset 6.
    #[default]
    Default,
    /// Highest levels everywhere (xz preset 9 needs ~700 MiB to encode).
    Best,
}

/// Configuration for a [`crate::Pipeline`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// First layer.
    pub deflate: DeflateOptions,
    /// Second layer.
    pub block_sort: BlockSortOptions,
    /// Outer layer.
    pub range_coder: RangeCoderOptions,
    /// Size of each stage's input and output windows.
    pub chunk_size: usize,
    /// Parent directory for per-run scratch namespaces (system temp dir if unset).
    pub scratch_dir: Option<PathBuf>,
    /// Replace an existing destination instead of failing.
    pub overwrite: bool,
    /// Copy the input's modification time onto the output.
    pub preserve_mtime: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            deflate: DeflateOptions::default(),
            block_sort: BlockSortOptions::default(),
            range_coder: RangeCoderOptions::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            scratch_dir: None,
            overwrite: false,
            preserve_mtime: true,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| StrataError::config(path, e.to_string()))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| StrataError::config(path, e.to_string()))
    }

    /// The codecs in encode order: deflate, bzip2, xz.
    pub fn codecs(&self) -> [Codec; 3] {
        [
            Codec::Deflate(self.deflate),
            Codec::BlockSort(self.block_sort),
            Codec::RangeCoder(self.range_coder),
        ]
    }

    /// Apply a level preset to all three codecs.
    pub fn with_preset(mut self, preset: Preset) -> Self {
        let (deflate, bzip2, xz): (u8, u8, u32) = match preset {
            Preset::Fast => (1, 1, 0),
            Preset::Default => (9, 9, 6),
            Preset::Best => (9, 9, 9),
        };
        self.deflate = DeflateOptions::new(deflate);
        self.block_sort = BlockSortOptions {
            level: bzip2.into(),
            ..self.block_sort
        };
        self.range_coder.preset = xz;
        self
    }

    /// Set the integrity check of the outer layer.
    pub fn with_check(mut self, check: IntegrityCheck) -> Self {
        self.range_coder.check = check;
        self
    }

    /// Set the stage window size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the scratch parent directory.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Allow or forbid replacing an existing destination.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Enable or disable modification time preservation.
    pub fn with_preserve_mtime(mut self, preserve: bool) -> Self {
        self.preserve_mtime = preserve;
        self
    }
}
