//! # Strata Core
//!
//! Core components for the Strata layered compression pipeline.
//!
//! - [`traits`]: The uniform streaming-engine interface and its status vocabulary
//! - [`stream`]: The chunked driver that runs any engine from a reader to a writer
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! Strata is layered the same way its data flows:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Pipeline                                            │
//! │     Stage plans, staged artifacts, orchestration, CLI  │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec adapters                                      │
//! │     Deflate (zlib), BlockSort (bzip2), RangeCoder (xz) │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Streaming core (this crate)                         │
//! │     StreamEngine, pump, StrataError                    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use strata_core::{Direction, FlushMode, StreamEngine, StreamStatus, pump};
//! use std::io::Cursor;
//!
//! struct Identity;
//!
//! impl StreamEngine for Identity {
//!     fn codec(&self) -> &'static str { "identity" }
//!     fn direction(&self) -> Direction { Direction::Encode }
//!     fn step(
//!         &mut self,
//!         input: &[u8],
//!         output: &mut [u8],
//!         flush: FlushMode,
//!     ) -> strata_core::Result<(usize, usize, StreamStatus)> {
//!         let n = input.len().min(output.len());
//!         output[..n].copy_from_slice(&input[..n]);
//!         let status = match (n < input.len(), flush) {
//!             (true, _) => StreamStatus::NeedsOutput,
//!             (false, FlushMode::Finish) => StreamStatus::Done,
//!             (false, FlushMode::None) => StreamStatus::NeedsInput,
//!         };
//!         Ok((n, n, status))
//!     }
//! }
//!
//! let mut out = Vec::new();
//! let stats = pump(&mut Identity, &mut Cursor::new(b"hello"), &mut out, 2).unwrap();
//! assert_eq!(out, b"hello");
//! assert_eq!(stats.bytes_out, 5);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod stream;
pub mod traits;

// Re-exports for convenience
pub use error::{ErrorKind, Result, StrataError};
pub use stream::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE, StreamStats, pump};
pub use traits::{CompressionLevel, Direction, FlushMode, StreamEngine, StreamStatus};
