//! Error types for Strata operations.
//!
//! Every failure a pipeline run can hit falls into one of a handful of
//! kinds: the codec engine refused its configuration, the byte source or
//! sink failed, the compressed stream itself was malformed, or a staged
//! artifact could not be managed. Failures raised inside a pipeline stage
//! are wrapped in [`StrataError::Stage`] so callers can tell which stage
//! and codec failed.

use crate::traits::Direction;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Strata operations.
#[derive(Debug, Error)]
pub enum StrataError {
    /// The codec engine could not be initialized with the given options.
    #[error("{codec} engine initialization failed: {message}")]
    CodecInit {
        /// Codec name.
        codec: &'static str,
        /// Why the engine was rejected.
        message: String,
    },

    /// I/O error from the byte source or sink driving a codec.
    #[error("I/O error: {0}")]
    CodecIo(#[from] io::Error),

    /// The engine reported corrupt, truncated or unexpected data.
    #[error("{codec} stream error: {message}")]
    CodecStream {
        /// Codec name.
        codec: &'static str,
        /// Description of the stream fault.
        message: String,
    },

    /// A staged artifact could not be created, opened or removed.
    #[error("staged artifact error at {}: {source}", path.display())]
    Artifact {
        /// Path of the artifact (or its directory).
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A pipeline stage failed.
    #[error("stage {index} ({codec} {direction}) failed: {source}")]
    Stage {
        /// Zero-based stage index within the run.
        index: usize,
        /// Codec name of the failing stage.
        codec: &'static str,
        /// Direction the codec was running in.
        direction: Direction,
        /// The stage's own error.
        #[source]
        source: Box<StrataError>,
    },

    /// The run's input is unusable.
    #[error("invalid input {}: {message}", path.display())]
    InvalidInput {
        /// Offending path.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },

    /// A configuration file could not be read or parsed.
    #[error("invalid configuration {}: {message}", path.display())]
    Config {
        /// Configuration file path.
        path: PathBuf,
        /// Parse or read failure.
        message: String,
    },

    /// The destination already exists and overwriting is disabled.
    #[error("output already exists: {}", path.display())]
    OutputExists {
        /// Existing destination.
        path: PathBuf,
    },
}

/// Coarse classification of a [`StrataError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Engine initialization was rejected.
    Init,
    /// Source or sink I/O failed.
    Io,
    /// Malformed or truncated compressed data.
    Stream,
    /// Staged artifact management failed.
    Artifact,
    /// Input path, configuration or destination unusable.
    Input,
}

/// Result type alias for Strata operations.
pub type Result<T> = std::result::Result<T, StrataError>;

impl StrataError {
    /// Create an engine initialization error.
    pub fn init(codec: &'static str, message: impl Into<String>) -> Self {
        Self::CodecInit {
            codec,
            message: message.into(),
        }
    }

    /// Create a stream error.
    pub fn stream(codec: &'static str, message: impl Into<String>) -> Self {
        Self::CodecStream {
            codec,
            message: message.into(),
        }
    }

    /// Create a staged artifact error.
    pub fn artifact(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Artifact {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an output-exists error.
    pub fn output_exists(path: impl Into<PathBuf>) -> Self {
        Self::OutputExists { path: path.into() }
    }

    /// Wrap this error with the position and codec of the stage that raised it.
    pub fn at_stage(self, index: usize, codec: &'static str, direction: Direction) -> Self {
        Self::Stage {
            index,
            codec,
            direction,
            source: Box::new(self),
        }
    }

    /// Classify the error, looking through stage wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CodecInit { .. } => ErrorKind::Init,
            Self::CodecIo(_) => ErrorKind::Io,
            Self::CodecStream { .. } => ErrorKind::Stream,
            Self::Artifact { .. } => ErrorKind::Artifact,
            Self::InvalidInput { .. } | Self::Config { .. } | Self::OutputExists { .. } => {
                ErrorKind::Input
            }
            Self::Stage { source, .. } => source.kind(),
        }
    }

    /// Index of the failing stage, if the error was raised inside one.
    pub fn stage(&self) -> Option<usize> {
        match self {
            Self::Stage { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Codec name of the failing stage or engine, if known.
    pub fn codec(&self) -> Option<&'static str> {
        match self {
            Self::CodecInit { codec, .. }
            | Self::CodecStream { codec, .. }
            | Self::Stage { codec, .. } => Some(*codec),
            _ => None,
        }
    }
}
