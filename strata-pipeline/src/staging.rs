//! Staged artifact management.
//!
//! Every run gets a private scratch directory, [`StagingArea`], whose
//! randomized name is the run's identity. Intermediate outputs live there
//! as named files that move through three states:
//!
//! ```text
//! StagingArea::create ─► ArtifactWriter ─seal─► SealedArtifact ─open─► ArtifactReader
//!                              │                      │                      │
//!                              └──────── destroy() / drop removes the file ──┘
//! ```
//!
//! A writer cannot be read and a reader cannot be written; the type
//! changes at each step. Whatever state an artifact is in when a run
//! unwinds, dropping it deletes the file, and dropping the area deletes
//! the directory.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use strata_core::{Result, StrataError};
use tempfile::{Builder, NamedTempFile, TempDir, TempPath};

const RUN_PREFIX: &str = "strata-run-";
const ARTIFACT_SUFFIX: &str = ".part";

/// Private scratch directory for one pipeline run.
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    /// Create a run directory under `root`, or under the system temp dir.
    pub fn new(root: Option<&Path>) -> Result<Self> {
        let mut builder = Builder::new();
        builder.prefix(RUN_PREFIX);
        let dir = match root {
            Some(root) => builder
                .tempdir_in(root)
                .map_err(|e| StrataError::artifact(root, e))?,
            None => builder
                .tempdir()
                .map_err(|e| StrataError::artifact(std::env::temp_dir(), e))?,
        };
        Ok(Self { dir })
    }

    /// Path of the run directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Run identity (the run directory's name).
    pub fn run_id(&self) -> &str {
        self.dir
            .path()
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(RUN_PREFIX)
    }

    /// Create the artifact that stage `index` of `codec` writes into.
    pub fn create(&self, index: usize, codec: &str) -> Result<ArtifactWriter> {
        let file = Builder::new()
            .prefix(&format!("stage-{index}-{codec}"))
            .suffix(ARTIFACT_SUFFIX)
            .rand_bytes(0)
            .tempfile_in(self.dir.path())
            .map_err(|e| StrataError::artifact(self.dir.path(), e))?;
        let path = file.path().to_path_buf();
        log::trace!("created artifact {}", path.display());
        Ok(ArtifactWriter {
            inner: BufWriter::new(file),
            path,
        })
    }

    /// Number of artifacts currently present in the run directory.
    pub fn artifact_count(&self) -> Result<usize> {
        let entries = fs::read_dir(self.dir.path())
            .map_err(|e| StrataError::artifact(self.dir.path(), e))?;
        Ok(entries.count())
    }

    /// Remove the run directory and anything left in it.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .map_err(|e| StrataError::artifact(path, e))
    }
}

/// Write-only handle to an artifact being produced.
#[derive(Debug)]
pub struct ArtifactWriter {
    inner: BufWriter<NamedTempFile>,
    path: PathBuf,
}

impl ArtifactWriter {
    /// Artifact location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and close the writer. The file stays until the sealed artifact
    /// (or the reader opened from it) is destroyed or dropped.
    pub fn seal(self) -> Result<SealedArtifact> {
        let Self { inner, path } = self;
        let file = inner
            .into_inner()
            .map_err(|e| StrataError::artifact(&path, e.into_error()))?;
        let len = file
            .as_file()
            .metadata()
            .map_err(|e| StrataError::artifact(&path, e))?
            .len();
        Ok(SealedArtifact {
            path: file.into_temp_path(),
            len,
        })
    }

    /// Discard the artifact without sealing it.
    pub fn destroy(self) -> Result<()> {
        let (file, _unwritten) = self.inner.into_parts();
        file.close().map_err(|e| StrataError::artifact(&self.path, e))
    }
}

impl Write for ArtifactWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// A complete artifact with no open handle.
#[derive(Debug)]
pub struct SealedArtifact {
    path: TempPath,
    len: u64,
}

impl SealedArtifact {
    /// Artifact location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the artifact is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Open the artifact for reading by the next stage.
    pub fn open(self) -> Result<ArtifactReader> {
        let file = File::open(&self.path).map_err(|e| StrataError::artifact(&*self.path, e))?;
        Ok(ArtifactReader {
            inner: BufReader::new(file),
            path: self.path,
        })
    }

    /// Remove the artifact.
    pub fn destroy(self) -> Result<()> {
        let path = self.path.to_path_buf();
        self.path
            .close()
            .map_err(|e| StrataError::artifact(path, e))
    }
}

/// Read-only handle to a sealed artifact.
#[derive(Debug)]
pub struct ArtifactReader {
    inner: BufReader<File>,
    path: TempPath,
}

impl ArtifactReader {
    /// Artifact location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the handle and remove the artifact.
    pub fn destroy(self) -> Result<()> {
        let Self { inner, path } = self;
        drop(inner);
        let location = path.to_path_buf();
        path.close().map_err(|e| StrataError::artifact(location, e))
    }
}

impl Read for ArtifactReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}
