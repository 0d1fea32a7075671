//! # Strata Codec
//!
//! The three codec adapters used by the Strata pipeline, behind one
//! [`Codec`] type:
//!
//! - [`Codec::Deflate`]: general-purpose deflate with zlib framing (`flate2`)
//! - [`Codec::BlockSort`]: Burrows-Wheeler block-sorting compression (`bzip2`)
//! - [`Codec::RangeCoder`]: LZMA2 dictionary + range coder in the .xz container (`xz2`)
//!
//! Each variant carries its own configuration. All three expose the same
//! streaming `encode`/`decode` over a byte source and sink, driven by
//! [`strata_core::pump`] with bounded windows.
//!
//! ## Example
//!
//! ```rust
//! use strata_codec::Codec;
//!
//! let codec = Codec::block_sort();
//! let compressed = codec.encode_bytes(b"banana bandana").unwrap();
//! assert_eq!(codec.decode_bytes(&compressed).unwrap(), b"banana bandana");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod blocksort;
pub mod deflate;
pub mod rangecoder;

pub use blocksort::{BlockSortDecoder, BlockSortEncoder, BlockSortOptions};
pub use deflate::{DeflateDecoder, DeflateEncoder, DeflateOptions};
pub use rangecoder::{IntegrityCheck, RangeCoderDecoder, RangeCoderEncoder, RangeCoderOptions};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Cursor, Read, Write};
use strata_core::{DEFAULT_CHUNK_SIZE, Direction, Result, StreamEngine, StreamStats, pump};

/// A codec and its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "codec", rename_all = "snake_case")]
pub enum Codec {
    /// Deflate with zlib framing.
    Deflate(DeflateOptions),
    /// bzip2 block-sorting compression.
    BlockSort(BlockSortOptions),
    /// LZMA2 range coder in an .xz stream.
    RangeCoder(RangeCoderOptions),
}

impl Codec {
    /// Deflate with default options.
    pub fn deflate() -> Self {
        Codec::Deflate(DeflateOptions::default())
    }

    /// BlockSort with default options.
    pub fn block_sort() -> Self {
        Codec::BlockSort(BlockSortOptions::default())
    }

    /// RangeCoder with default options.
    pub fn range_coder() -> Self {
        Codec::RangeCoder(RangeCoderOptions::default())
    }

    /// Short codec name.
    pub fn name(&self) -> &'static str {
        match self {
            Codec::Deflate(_) => deflate::NAME,
            Codec::BlockSort(_) => blocksort::NAME,
            Codec::RangeCoder(_) => rangecoder::NAME,
        }
    }

    /// Conventional file extension for a stream produced by this codec.
    pub fn extension(&self) -> &'static str {
        match self {
            Codec::Deflate(_) => "zz",
            Codec::BlockSort(_) => "bz2",
            Codec::RangeCoder(_) => "xz",
        }
    }

    /// Initialize an engine for `direction`.
    pub fn engine(&self, direction: Direction) -> Result<Box<dyn StreamEngine>> {
        let engine: Box<dyn StreamEngine> = match (self, direction) {
            (Codec::Deflate(options), Direction::Encode) => Box::new(DeflateEncoder::new(options)?),
            (Codec::Deflate(_), Direction::Decode) => Box::new(DeflateDecoder::new()),
            (Codec::BlockSort(options), Direction::Encode) => {
                Box::new(BlockSortEncoder::new(options)?)
            }
            (Codec::BlockSort(_), Direction::Decode) => Box::new(BlockSortDecoder::new()),
            (Codec::RangeCoder(options), Direction::Encode) => {
                Box::new(RangeCoderEncoder::new(options)?)
            }
            (Codec::RangeCoder(_), Direction::Decode) => Box::new(RangeCoderDecoder::new()?),
        };
        Ok(engine)
    }

    /// Run this codec in `direction` from `source` to `sink`.
    ///
    /// The engine is created for this call and released before it
    /// returns, whether the stream completed or failed.
    pub fn apply<R, W>(
        &self,
        direction: Direction,
        source: &mut R,
        sink: &mut W,
        chunk_size: usize,
    ) -> Result<StreamStats>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let mut engine = self.engine(direction)?;
        pump(&mut engine, source, sink, chunk_size)
    }

    /// Compress `source` into `sink`.
    pub fn encode<R, W>(&self, source: &mut R, sink: &mut W, chunk_size: usize) -> Result<StreamStats>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        self.apply(Direction::Encode, source, sink, chunk_size)
    }

    /// Decompress `source` into `sink`.
    pub fn decode<R, W>(&self, source: &mut R, sink: &mut W, chunk_size: usize) -> Result<StreamStats>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        self.apply(Direction::Decode, source, sink, chunk_size)
    }

    /// Compress a byte slice into a new vector.
    pub fn encode_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode(&mut Cursor::new(data), &mut out, DEFAULT_CHUNK_SIZE)?;
        Ok(out)
    }

    /// Decompress a byte slice into a new vector.
    pub fn decode_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.decode(&mut Cursor::new(data), &mut out, DEFAULT_CHUNK_SIZE)?;
        Ok(out)
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codec::Deflate(options) => write!(f, "deflate (level {})", options.level.level()),
            Codec::BlockSort(options) => write!(f, "bzip2 (level {})", options.level.level()),
            Codec::RangeCoder(options) => {
                write!(f, "xz (preset {}, check {:?})", options.preset, options.check)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::ErrorKind;

    fn all_codecs() -> [Codec; 3] {
        [Codec::deflate(), Codec::block_sort(), Codec::range_coder()]
    }

    #[test]
    fn test_names_and_extensions() {
        let names: Vec<_> = all_codecs().iter().map(Codec::name).collect();
        assert_eq!(names, ["deflate", "bzip2", "xz"]);

        let exts: Vec<_> = all_codecs().iter().map(Codec::extension).collect();
        assert_eq!(exts, ["zz", "bz2", "xz"]);
    }

    #[test]
    fn test_roundtrip_all_codecs() {
        let data = b"Hello, World! This is a layered compression test.".repeat(40);
        for codec in all_codecs() {
            let compressed = codec.encode_bytes(&data).unwrap();
            assert!(compressed.len() < data.len(), "{codec}");
            assert_eq!(codec.decode_bytes(&compressed).unwrap(), data, "{codec}");
        }
    }

    #[test]
    fn test_wrong_codec_is_stream_error() {
        let data = b"cross-codec decoding must fail loudly".repeat(10);
        let codecs = all_codecs();
        for (i, producer) in codecs.iter().enumerate() {
            let compressed = producer.encode_bytes(&data).unwrap();
            for (j, consumer) in codecs.iter().enumerate() {
                if i == j {
                    continue;
                }
                let err = consumer.decode_bytes(&compressed).unwrap_err();
                assert_eq!(err.kind(), ErrorKind::Stream, "{producer} -> {consumer}");
            }
        }
    }

    #[test]
    fn test_empty_input_decode_fails() {
        for codec in all_codecs() {
            let err = codec.decode_bytes(b"").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Stream, "{codec}");
        }
    }

    #[test]
    fn test_serde_tagging() {
        let json = serde_json::to_string(&Codec::range_coder()).unwrap();
        assert!(json.contains(r#""codec":"range_coder""#));
        assert!(json.contains(r#""check":"crc64""#));

        let back: Codec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Codec::range_coder());
    }
}
