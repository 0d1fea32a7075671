//! BlockSort adapter (bzip2) over the `bzip2` crate's raw stream state.
//!
//! libbz2 distinguishes "keep calling" statuses per action (`RunOk`,
//! `FlushOk`, `FinishOk`) from the explicit `StreamEnd`. Once `Finish`
//! has been requested the action must not change, which the driver
//! guarantees by only finishing after the source is exhausted.

use bzip2::{Action, Compress, Compression, Decompress, Status};
use serde::{Deserialize, Serialize};
use strata_core::{
    CompressionLevel, Direction, FlushMode, Result, StrataError, StreamEngine, StreamStatus,
};

/// Codec name used in errors and reports.
pub const NAME: &str = "bzip2";

/// Largest work factor libbz2 accepts.
pub const MAX_WORK_FACTOR: u32 = 250;

/// BlockSort options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSortOptions {
    /// Block size level, 1 (100k) to 9 (900k).
    pub level: CompressionLevel,
    /// Fallback-sort threshold; 0 selects libbz2's default (30).
    #[serde(default)]
    pub work_factor: u32,
}

impl BlockSortOptions {
    /// Options with the given block size level and the default work factor.
    pub fn new(level: u8) -> Self {
        Self {
            level: CompressionLevel::new(level),
            work_factor: 0,
        }
    }

    fn validate(&self) -> Result<()> {
        if !(1..=9).contains(&self.level.level()) {
            return Err(StrataError::init(
                NAME,
                format!("block size level {} is outside 1-9", self.level.level()),
            ));
        }
        if self.work_factor > MAX_WORK_FACTOR {
            return Err(StrataError::init(
                NAME,
                format!(
                    "work factor {} is outside 0-{MAX_WORK_FACTOR}",
                    self.work_factor
                ),
            ));
        }
        Ok(())
    }
}

impl Default for BlockSortOptions {
    fn default() -> Self {
        Self::new(CompressionLevel::BEST.level())
    }
}

/// Streaming bzip2 compressor.
pub struct BlockSortEncoder {
    inner: Compress,
}

impl BlockSortEncoder {
    /// Create an encoder, rejecting unsupported options.
    pub fn new(options: &BlockSortOptions) -> Result<Self> {
        options.validate()?;
        let level = Compression::new(u32::from(options.level.level()));
        Ok(Self {
            inner: Compress::new(level, options.work_factor),
        })
    }
}

impl StreamEngine for BlockSortEncoder {
    fn codec(&self) -> &'static str {
        NAME
    }

    fn direction(&self) -> Direction {
        Direction::Encode
    }

    fn step(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: FlushMode,
    ) -> Result<(usize, usize, StreamStatus)> {
        let before_in = self.inner.total_in();
        let before_out = self.inner.total_out();

        let action = match flush {
            FlushMode::None => Action::Run,
            FlushMode::Finish => Action::Finish,
        };
        let status = self
            .inner
            .compress(input, output, action)
            .map_err(|e| StrataError::stream(NAME, e.to_string()))?;

        let consumed = (self.inner.total_in() - before_in) as usize;
        let produced = (self.inner.total_out() - before_out) as usize;
        Ok((consumed, produced, normalize(status, produced, output.len())))
    }
}

/// Streaming bzip2 decompressor.
pub struct BlockSortDecoder {
    inner: Decompress,
}

impl BlockSortDecoder {
    /// Create a decoder using the regular (fast, larger memory) algorithm.
    pub fn new() -> Self {
        Self {
            inner: Decompress::new(false),
        }
    }
}

impl Default for BlockSortDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamEngine for BlockSortDecoder {
    fn codec(&self) -> &'static str {
        NAME
    }

    fn direction(&self) -> Direction {
        Direction::Decode
    }

    fn step(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        _flush: FlushMode,
    ) -> Result<(usize, usize, StreamStatus)> {
        let before_in = self.inner.total_in();
        let before_out = self.inner.total_out();

        let status = self
            .inner
            .decompress(input, output)
            .map_err(|e| StrataError::stream(NAME, e.to_string()))?;

        let consumed = (self.inner.total_in() - before_in) as usize;
        let produced = (self.inner.total_out() - before_out) as usize;
        Ok((consumed, produced, normalize(status, produced, output.len())))
    }
}

fn normalize(status: Status, produced: usize, window: usize) -> StreamStatus {
    match status {
        Status::StreamEnd => StreamStatus::Done,
        Status::FinishOk | Status::FlushOk | Status::MemNeeded => StreamStatus::NeedsOutput,
        Status::Ok | Status::RunOk if produced == window => StreamStatus::NeedsOutput,
        Status::Ok | Status::RunOk => StreamStatus::NeedsInput,
    }
}
