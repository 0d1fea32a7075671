//! Core traits for streaming codec engines.
//!
//! Every compression library speaks its own flow-control dialect. Engines
//! wrap one library's state machine and translate it into the
//! [`StreamStatus`] vocabulary defined here, so the driver in
//! [`crate::stream`] can run any of them with the same loop.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which way a codec is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Compress.
    Encode,
    /// Decompress.
    Decode,
}

impl Direction {
    /// The opposite direction.
    pub fn flip(self) -> Self {
        match self {
            Direction::Encode => Direction::Decode,
            Direction::Decode => Direction::Encode,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Encode => f.write_str("encode"),
            Direction::Decode => f.write_str("decode"),
        }
    }
}

/// Normalized status of one engine step.
///
/// The fourth possible outcome, a failed step, is the `Err` arm of the
/// step's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    /// All offered input was taken; feed more (or finish).
    NeedsInput,
    /// The output window filled up; call again to drain pending output.
    NeedsOutput,
    /// The logical end of the stream was reached.
    Done,
}

/// Flush mode for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushMode {
    /// More input will follow.
    #[default]
    None,
    /// The source is exhausted - complete the stream.
    Finish,
}

/// A streaming codec engine, in either direction.
pub trait StreamEngine {
    /// Name of the codec this engine runs.
    fn codec(&self) -> &'static str;

    /// Direction the engine runs in.
    fn direction(&self) -> Direction;

    /// Push `input` through the engine, writing into `output`.
    ///
    /// # Returns
    ///
    /// A tuple of (bytes consumed from input, bytes written to output, status)
    fn step(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: FlushMode,
    ) -> Result<(usize, usize, StreamStatus)>;
}

impl<E: StreamEngine + ?Sized> StreamEngine for Box<E> {
    fn codec(&self) -> &'static str {
        (**self).codec()
    }

    fn direction(&self) -> Direction {
        (**self).direction()
    }

    fn step(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: FlushMode,
    ) -> Result<(usize, usize, StreamStatus)> {
        (**self).step(input, output, flush)
    }
}

/// Compression level for algorithms that support it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// Default compression (balanced).
    pub const DEFAULT: Self = Self(6);
    /// Best compression (slowest).
    pub const BEST: Self = Self(9);

    /// Create a compression level.
    ///
    /// The value is not clamped; each engine validates it on
    /// initialization and rejects values it cannot use.
    pub const fn new(level: u8) -> Self {
        Self(level)
    }

    /// Get the level value.
    pub fn level(&self) -> u8 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u8> for CompressionLevel {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}
