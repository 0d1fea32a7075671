//! Stage model: which codec runs in which direction, in what order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};
use strata_codec::Codec;
use strata_core::{Direction, Result, StreamStats};

/// What a pipeline run does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Layer the codecs onto the input.
    Compress,
    /// Peel the layers off again.
    Decompress,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Compress => f.write_str("compress"),
            Mode::Decompress => f.write_str("decompress"),
        }
    }
}

/// One codec applied in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    /// Codec and its options.
    pub codec: Codec,
    /// Direction it runs in.
    pub direction: Direction,
}

impl Stage {
    /// Create a stage.
    pub fn new(codec: Codec, direction: Direction) -> Self {
        Self { codec, direction }
    }

    /// The same codec in the opposite direction.
    pub fn flipped(self) -> Self {
        Self {
            codec: self.codec,
            direction: self.direction.flip(),
        }
    }

    /// Run the stage from `source` to `sink`.
    pub fn run<R, W>(&self, source: &mut R, sink: &mut W, chunk_size: usize) -> Result<StreamStats>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        self.codec.apply(self.direction, source, sink, chunk_size)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.codec.name(), self.direction)
    }
}

/// An ordered sequence of stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    stages: Vec<Stage>,
}

impl StagePlan {
    /// Encode every codec, in the given order.
    pub fn compress(codecs: &[Codec]) -> Self {
        Self {
            stages: codecs
                .iter()
                .map(|&codec| Stage::new(codec, Direction::Encode))
                .collect(),
        }
    }

    /// Decode every codec, in the reverse of the given (encode) order.
    pub fn decompress(codecs: &[Codec]) -> Self {
        Self::compress(codecs).inverse()
    }

    /// Plan for `mode` over codecs listed in encode order.
    pub fn for_mode(mode: Mode, codecs: &[Codec]) -> Self {
        match mode {
            Mode::Compress => Self::compress(codecs),
            Mode::Decompress => Self::decompress(codecs),
        }
    }

    /// The plan that undoes this one: reversed order, every direction flipped.
    pub fn inverse(&self) -> Self {
        Self {
            stages: self.stages.iter().rev().map(|s| s.flipped()).collect(),
        }
    }

    /// The stages in execution order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the plan has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The codec forming the outermost layer of the compressed artifact.
    ///
    /// That is the last stage of an encode plan and the first of a decode plan.
    pub fn outer_codec(&self) -> Option<&Codec> {
        let first = self.stages.first()?;
        match first.direction {
            Direction::Decode => Some(&first.codec),
            Direction::Encode => self.stages.last().map(|s| &s.codec),
        }
    }
}

impl fmt::Display for StagePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{stage}")?;
        }
        Ok(())
    }
}
