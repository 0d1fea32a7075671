//! Chunked driver that moves bytes through a [`StreamEngine`].
//!
//! [`pump`] is the only loop in the workspace that talks to an engine.
//! It reads bounded chunks from a source, pushes them through the engine,
//! and writes every produced byte to the sink. Once the source is
//! exhausted it switches to [`FlushMode::Finish`] and keeps draining
//! until the engine reports [`StreamStatus::Done`].
//!
//! Two conditions are treated as stream faults rather than success:
//!
//! - the source ran dry while the engine still expects more input
//!   (truncated stream);
//! - the engine reached the end of its stream while source bytes remain
//!   (trailing data).

use crate::error::{Result, StrataError};
use crate::traits::{FlushMode, StreamEngine, StreamStatus};
use std::io::{self, Read, Write};

/// Default size of the input and output windows (16 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Smallest accepted window size.
pub const MIN_CHUNK_SIZE: usize = 1;

/// Largest accepted window size (64 MiB).
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Consecutive no-progress steps tolerated before the engine is declared stuck.
const MAX_IDLE_STEPS: usize = 8;

/// Byte counts for one pass through an engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Bytes read from the source.
    pub bytes_in: u64,
    /// Bytes written to the sink.
    pub bytes_out: u64,
}

impl StreamStats {
    /// Output size relative to input size (1.0 when the input was empty).
    pub fn ratio(&self) -> f64 {
        if self.bytes_in == 0 {
            1.0
        } else {
            self.bytes_out as f64 / self.bytes_in as f64
        }
    }
}

/// Clamp a requested window size to the supported range.
pub fn clamp_chunk_size(chunk_size: usize) -> usize {
    chunk_size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE)
}

/// Drive `engine` from `source` to `sink` using windows of `chunk_size` bytes.
///
/// The sink is flushed before returning. Memory use is two windows,
/// independent of the stream length.
pub fn pump<E, R, W>(
    engine: &mut E,
    source: &mut R,
    sink: &mut W,
    chunk_size: usize,
) -> Result<StreamStats>
where
    E: StreamEngine + ?Sized,
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let chunk_size = clamp_chunk_size(chunk_size);
    let mut input = vec![0u8; chunk_size];
    let mut output = vec![0u8; chunk_size];
    let mut stats = StreamStats::default();

    let mut pos = 0;
    let mut filled = 0;
    let mut exhausted = false;
    let mut idle_steps = 0;

    loop {
        if pos == filled && !exhausted {
            filled = read_chunk(source, &mut input)?;
            pos = 0;
            exhausted = filled == 0;
            stats.bytes_in += filled as u64;
        }

        let flush = if exhausted {
            FlushMode::Finish
        } else {
            FlushMode::None
        };

        let (consumed, produced, status) = engine.step(&input[pos..filled], &mut output, flush)?;
        pos += consumed;

        if produced > 0 {
            sink.write_all(&output[..produced])?;
            stats.bytes_out += produced as u64;
        }

        if consumed == 0 && produced == 0 {
            idle_steps += 1;
        } else {
            idle_steps = 0;
        }

        match status {
            StreamStatus::Done => {
                if pos < filled || (!exhausted && has_more(source)?) {
                    return Err(StrataError::stream(
                        engine.codec(),
                        "trailing data after end of stream",
                    ));
                }
                break;
            }
            StreamStatus::NeedsInput if exhausted && idle_steps > 0 => {
                return Err(StrataError::stream(
                    engine.codec(),
                    "input ended before the end of the stream",
                ));
            }
            _ if idle_steps >= MAX_IDLE_STEPS => {
                return Err(StrataError::stream(
                    engine.codec(),
                    "engine made no progress",
                ));
            }
            StreamStatus::NeedsInput | StreamStatus::NeedsOutput => {}
        }
    }

    sink.flush()?;
    log::trace!(
        "{} {}: {} -> {} bytes",
        engine.codec(),
        engine.direction(),
        stats.bytes_in,
        stats.bytes_out
    );
    Ok(stats)
}

fn read_chunk<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match source.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

fn has_more<R: Read + ?Sized>(source: &mut R) -> io::Result<bool> {
    let mut probe = [0u8; 1];
    Ok(read_chunk(source, &mut probe)? > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::traits::Direction;
    use std::io::Cursor;

    /// Copies bytes through unchanged; ends once finished and drained.
    struct Passthrough;

    impl StreamEngine for Passthrough {
        fn codec(&self) -> &'static str {
            "passthrough"
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
            let n = input.len().min(output.len());
            output[..n].copy_from_slice(&input[..n]);
            let status = if n < input.len() {
                StreamStatus::NeedsOutput
            } else if flush == FlushMode::Finish {
                StreamStatus::Done
            } else {
                StreamStatus::NeedsInput
            };
            Ok((n, n, status))
        }
    }

    /// Decoder that expects exactly `remaining` bytes.
    struct Exact {
        remaining: usize,
    }

    impl StreamEngine for Exact {
        fn codec(&self) -> &'static str {
            "exact"
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
            let n = input.len().min(output.len()).min(self.remaining);
            output[..n].copy_from_slice(&input[..n]);
            self.remaining -= n;
            let status = if self.remaining == 0 {
                StreamStatus::Done
            } else if n == output.len() {
                StreamStatus::NeedsOutput
            } else {
                StreamStatus::NeedsInput
            };
            Ok((n, n, status))
        }
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_pump_copies_everything() {
        let data: Vec<u8> = (0..10_000).map(|i| (i % 251) as u8).collect();
        let mut out = Vec::new();
        let stats = pump(&mut Passthrough, &mut Cursor::new(&data), &mut out, 333).unwrap();

        assert_eq!(out, data);
        assert_eq!(stats.bytes_in, data.len() as u64);
        assert_eq!(stats.bytes_out, data.len() as u64);
    }

    #[test]
    fn test_pump_single_byte_windows() {
        let data = b"one byte at a time".to_vec();
        let mut out = Vec::new();
        pump(&mut Passthrough, &mut Cursor::new(&data), &mut out, 1).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_pump_empty_source() {
        let mut out = Vec::new();
        let stats = pump(&mut Passthrough, &mut Cursor::new(Vec::new()), &mut out, 0).unwrap();
        assert!(out.is_empty());
        assert_eq!(stats, StreamStats::default());
        assert_eq!(stats.ratio(), 1.0);
    }

    #[test]
    fn test_pump_detects_truncation() {
        let mut engine = Exact { remaining: 100 };
        let mut out = Vec::new();
        let err = pump(&mut engine, &mut Cursor::new(vec![7u8; 60]), &mut out, 16).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Stream);
        assert!(err.to_string().contains("input ended"));
    }

    #[test]
    fn test_pump_detects_trailing_data() {
        let mut engine = Exact { remaining: 10 };
        let mut out = Vec::new();
        let err = pump(&mut engine, &mut Cursor::new(vec![1u8; 11]), &mut out, 4).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Stream);
        assert!(err.to_string().contains("trailing"));
    }

    #[test]
    fn test_pump_exact_length_is_clean() {
        // Stream ends exactly on a window boundary: the probe read must
        // find nothing left.
        let mut engine = Exact { remaining: 8 };
        let mut out = Vec::new();
        pump(&mut engine, &mut Cursor::new(vec![3u8; 8]), &mut out, 4).unwrap();
        assert_eq!(out, vec![3u8; 8]);
    }

    #[test]
    fn test_pump_sink_failure_is_io() {
        let err = pump(
            &mut Passthrough,
            &mut Cursor::new(vec![0u8; 32]),
            &mut BrokenSink,
            8,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_clamp_chunk_size() {
        assert_eq!(clamp_chunk_size(0), MIN_CHUNK_SIZE);
        assert_eq!(clamp_chunk_size(4096), 4096);
        assert_eq!(clamp_chunk_size(usize::MAX), MAX_CHUNK_SIZE);
    }
}
