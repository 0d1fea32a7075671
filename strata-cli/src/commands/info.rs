//! Info command implementation.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use strata_codec::IntegrityCheck;
use strata_codec::rangecoder::XZ_MAGIC;
use strata_pipeline::{Mode, Pipeline};

/// Size of the xz stream header.
const STREAM_HEADER_LEN: usize = 12;

pub fn cmd_info(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let metadata = std::fs::metadata(file)?;
    let mut header = Vec::with_capacity(STREAM_HEADER_LEN);
    File::open(file)?
        .take(STREAM_HEADER_LEN as u64)
        .read_to_end(&mut header)?;

    let pipeline = Pipeline::default();
    let is_xz = header.starts_with(&XZ_MAGIC);

    println!("Strata Information");
    println!("==================");
    println!("File: {}", file.display());
    println!("Size: {} bytes", metadata.len());
    println!("Outer layer: {}", if is_xz { "xz stream" } else { "not xz" });

    if is_xz {
        if let Some(check) = stream_check(&header) {
            println!("Integrity check: {}", describe_check(check));
        }
        println!();
        println!("Decode plan: {}", pipeline.plan(Mode::Decompress));
        println!(
            "Decompresses to: {}",
            pipeline.output_path(Mode::Decompress, file)?.display()
        );
    } else {
        println!();
        println!("Encode plan: {}", pipeline.plan(Mode::Compress));
        println!(
            "Integrity check: {}",
            describe_check(pipeline.config().range_coder.check)
        );
        println!(
            "Compresses to: {}",
            pipeline.output_path(Mode::Compress, file)?.display()
        );
    }

    Ok(())
}

/// Check named by the stream flags that follow the magic.
fn stream_check(header: &[u8]) -> Option<IntegrityCheck> {
    header
        .get(7)
        .and_then(|&flags| IntegrityCheck::from_stream_flags(flags))
}

fn describe_check(check: IntegrityCheck) -> String {
    match check.size() {
        0 => check.name().to_string(),
        size => format!("{} ({} bytes per block)", check.name(), size),
    }
}
