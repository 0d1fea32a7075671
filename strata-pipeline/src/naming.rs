//! Output path derivation.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use strata_codec::Codec;
use strata_core::{Result, StrataError};

/// Suffix appended when a decompressed name cannot be derived by stripping.
pub const RECOVERED_SUFFIX: &str = "out";

/// Destination of compressing `input`: the outer codec's extension appended.
///
/// `notes.txt` becomes `notes.txt.xz`.
pub fn compressed_path(input: &Path, outer: &Codec) -> Result<PathBuf> {
    append_extension(input, outer.extension())
}

/// Destination of decompressing `input`.
///
/// The outer codec's extension is stripped when present (`notes.txt.xz`
/// becomes `notes.txt`); any other name gets `.out` appended.
pub fn decompressed_path(input: &Path, outer: &Codec) -> Result<PathBuf> {
    let has_suffix = input
        .extension()
        .is_some_and(|ext| ext == outer.extension());
    let has_stem = input.file_stem().is_some_and(|stem| !stem.is_empty());

    if has_suffix && has_stem {
        Ok(input.with_extension(""))
    } else {
        append_extension(input, RECOVERED_SUFFIX)
    }
}

fn append_extension(input: &Path, extension: &str) -> Result<PathBuf> {
    let name = input
        .file_name()
        .ok_or_else(|| StrataError::invalid_input(input, "no file name to derive output from"))?;
    let mut derived = OsString::from(name);
    derived.push(".");
    derived.push(extension);
    Ok(input.with_file_name(derived))
}
