//! Deflate adapter (zlib framing) over `flate2`'s raw stream state.
//!
//! `flate2::Compress` follows zlib's flush model: input is offered with
//! `FlushCompress::None` until the source runs dry, then `Finish` is
//! repeated until the engine reports `StreamEnd`. The zlib trailer
//! carries an Adler-32 of the uncompressed data, so corrupt input is
//! usually caught on decode.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use serde::{Deserialize, Serialize};
use strata_core::{
    CompressionLevel, Direction, FlushMode, Result, StrataError, StreamEngine, StreamStatus,
};

/// Codec name used in errors and reports.
pub const NAME: &str = "deflate";

/// Deflate options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeflateOptions {
    /// Compression level, 0 (store) to 9 (best).
    pub level: CompressionLevel,
}

impl DeflateOptions {
    /// Options with the given level.
    pub fn new(level: u8) -> Self {
        Self {
            level: CompressionLevel::new(level),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.level.level() > 9 {
            return Err(StrataError::init(
                NAME,
                format!("compression level {} is outside 0-9", self.level.level()),
            ));
        }
        Ok(())
    }
}

impl Default for DeflateOptions {
    fn default() -> Self {
        Self {
            level: CompressionLevel::BEST,
        }
    }
}

/// Streaming zlib compressor.
pub struct DeflateEncoder {
    inner: Compress,
}

impl DeflateEncoder {
    /// Create an encoder, rejecting unsupported levels.
    pub fn new(options: &DeflateOptions) -> Result<Self> {
        options.validate()?;
        let level = Compression::new(u32::from(options.level.level()));
        Ok(Self {
            inner: Compress::new(level, true),
        })
    }
}

impl StreamEngine for DeflateEncoder {
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

        let flush = match flush {
            FlushMode::None => FlushCompress::None,
            FlushMode::Finish => FlushCompress::Finish,
        };
        let status = self
            .inner
            .compress(input, output, flush)
            .map_err(|e| StrataError::stream(NAME, e.to_string()))?;

        let consumed = (self.inner.total_in() - before_in) as usize;
        let produced = (self.inner.total_out() - before_out) as usize;
        Ok((consumed, produced, normalize(status, produced, output.len())))
    }
}

/// Streaming zlib decompressor.
pub struct DeflateDecoder {
    inner: Decompress,
}

impl DeflateDecoder {
    /// Create a decoder.
    pub fn new() -> Self {
        Self {
            inner: Decompress::new(true),
        }
    }
}

impl Default for DeflateDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamEngine for DeflateDecoder {
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

        // Truncation is detected by the driver, so the decoder never needs
        // zlib's Finish semantics.
        let status = self
            .inner
            .decompress(input, output, FlushDecompress::None)
            .map_err(|e| StrataError::stream(NAME, e.to_string()))?;

        let consumed = (self.inner.total_in() - before_in) as usize;
        let produced = (self.inner.total_out() - before_out) as usize;
        Ok((consumed, produced, normalize(status, produced, output.len())))
    }
}

fn normalize(status: Status, produced: usize, window: usize) -> StreamStatus {
    match status {
        Status::StreamEnd => StreamStatus::Done,
        Status::Ok | Status::BufError if produced == window => StreamStatus::NeedsOutput,
        Status::Ok | Status::BufError => StreamStatus::NeedsInput,
    }
}
