//! RangeCoder adapter (LZMA2 in the .xz container) over liblzma via `xz2`.
//!
//! liblzma uses a submit/finish model: input is pushed with
//! `Action::Run`, and once the source is exhausted `Action::Finish` is
//! submitted repeatedly until the engine returns `StreamEnd`. Only the
//! finish loop emits the block check and the stream index/footer, so
//! stopping early produces an unreadable artifact.

use serde::{Deserialize, Serialize};
use strata_core::{Direction, FlushMode, Result, StrataError, StreamEngine, StreamStatus};
use xz2::stream::{Action, Check, Status, Stream};

/// Codec name used in errors and reports.
pub const NAME: &str = "xz";

/// .xz stream magic bytes.
pub const XZ_MAGIC: [u8; 6] = [0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00];

/// Integrity check stored in each .xz block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrityCheck {
    /// No check.
    None,
    /// CRC-32.
    Crc32,
    /// CRC-64.
    #[default]
    Crc64,
    /// SHA-256.
    Sha256,
}

impl IntegrityCheck {
    fn to_xz(self) -> Check {
        match self {
            IntegrityCheck::None => Check::None,
            IntegrityCheck::Crc32 => Check::Crc32,
            IntegrityCheck::Crc64 => Check::Crc64,
            IntegrityCheck::Sha256 => Check::Sha256,
        }
    }

    /// Check selected by the check-id nibble of a stream flags byte.
    pub fn from_stream_flags(flags: u8) -> Option<Self> {
        match flags & 0x0F {
            0x00 => Some(IntegrityCheck::None),
            0x01 => Some(IntegrityCheck::Crc32),
            0x04 => Some(IntegrityCheck::Crc64),
            0x0A => Some(IntegrityCheck::Sha256),
            _ => None,
        }
    }

    /// Lowercase name, as accepted in configs.
    pub fn name(self) -> &'static str {
        match self {
            IntegrityCheck::None => "none",
            IntegrityCheck::Crc32 => "crc32",
            IntegrityCheck::Crc64 => "crc64",
            IntegrityCheck::Sha256 => "sha256",
        }
    }

    /// Size of the stored check in bytes.
    pub fn size(self) -> usize {
        match self {
            IntegrityCheck::None => 0,
            IntegrityCheck::Crc32 => 4,
            IntegrityCheck::Crc64 => 8,
            IntegrityCheck::Sha256 => 32,
        }
    }
}

/// RangeCoder options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeCoderOptions {
    /// liblzma preset, 0 to 9.
    pub preset: u32,
    /// Integrity check algorithm.
    #[serde(default)]
    pub check: IntegrityCheck,
}

impl RangeCoderOptions {
    /// Options with the given preset and a CRC-64 check.
    pub fn new(preset: u32) -> Self {
        Self {
            preset,
            check: IntegrityCheck::default(),
        }
    }

    /// Replace the integrity check.
    pub fn with_check(mut self, check: IntegrityCheck) -> Self {
        self.check = check;
        self
    }
}

impl Default for RangeCoderOptions {
    fn default() -> Self {
        Self::new(6)
    }
}

/// Streaming .xz compressor.
pub struct RangeCoderEncoder {
    inner: Stream,
}

impl RangeCoderEncoder {
    /// Create an encoder, rejecting unsupported presets.
    pub fn new(options: &RangeCoderOptions) -> Result<Self> {
        if options.preset > 9 {
            return Err(StrataError::init(
                NAME,
                format!("preset {} is outside 0-9", options.preset),
            ));
        }
        let inner = Stream::new_easy_encoder(options.preset, options.check.to_xz())
            .map_err(|e| StrataError::init(NAME, e.to_string()))?;
        Ok(Self { inner })
    }
}

impl StreamEngine for RangeCoderEncoder {
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
        process(&mut self.inner, input, output, flush)
    }
}

/// Streaming .xz decompressor (single stream, no memory limit).
pub struct RangeCoderDecoder {
    inner: Stream,
}

impl RangeCoderDecoder {
    /// Create a decoder.
    pub fn new() -> Result<Self> {
        let inner = Stream::new_stream_decoder(u64::MAX, 0)
            .map_err(|e| StrataError::init(NAME, e.to_string()))?;
        Ok(Self { inner })
    }
}

impl StreamEngine for RangeCoderDecoder {
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
        flush: FlushMode,
    ) -> Result<(usize, usize, StreamStatus)> {
        process(&mut self.inner, input, output, flush)
    }
}

fn process(
    stream: &mut Stream,
    input: &[u8],
    output: &mut [u8],
    flush: FlushMode,
) -> Result<(usize, usize, StreamStatus)> {
    let before_in = stream.total_in();
    let before_out = stream.total_out();

    let action = match flush {
        FlushMode::None => Action::Run,
        FlushMode::Finish => Action::Finish,
    };
    let status = stream
        .process(input, output, action)
        .map_err(|e| StrataError::stream(NAME, e.to_string()))?;

    let consumed = (stream.total_in() - before_in) as usize;
    let produced = (stream.total_out() - before_out) as usize;

    let status = match status {
        Status::StreamEnd => StreamStatus::Done,
        // liblzma's buffer error: nothing could be done with what was offered.
        Status::MemNeeded => StreamStatus::NeedsInput,
        Status::GetCheck => StreamStatus::NeedsOutput,
        Status::Ok if produced == output.len() => StreamStatus::NeedsOutput,
        Status::Ok if flush == FlushMode::Finish && produced > 0 => StreamStatus::NeedsOutput,
        Status::Ok => StreamStatus::NeedsInput,
    };
    Ok((consumed, produced, status))
}
