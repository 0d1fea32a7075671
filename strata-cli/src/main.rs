//! Strata CLI - layered deflate, bzip2 and xz compression
//!
//! Every file is compressed three times over, each layer by a different
//! codec, and peeled back in the reverse order on decompression.

mod commands;
mod utils;

use clap::{Parser, Subcommand};
use commands::{RunArgs, cmd_compress, cmd_decompress, cmd_info, cmd_test};
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "strata")]
#[command(
    author,
    version,
    about = "Layered compression: deflate, then bzip2, then xz"
)]
#[command(long_about = "
Strata compresses a file through three codecs in sequence
(deflate -> bzip2 -> xz) and restores it by running the decoders in
reverse (xz -> bzip2 -> deflate). The result is a standard .xz file whose
payload is a bzip2 stream wrapping a zlib stream.

Examples:
  strata compress notes.txt
  strata compress -l fast --check sha256 *.log
  strata decompress notes.txt.xz
  strata test notes.txt.xz
  strata info notes.txt.xz
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress files into <file>.xz
    #[command(alias = "c")]
    Compress(RunArgs),

    /// Decompress .xz files produced by strata
    #[command(alias = "d")]
    Decompress(RunArgs),

    /// Verify that files decode cleanly through every layer
    #[command(alias = "t")]
    Test {
        /// Files to test
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Parent directory for staged intermediate files
        #[arg(long)]
        scratch_dir: Option<PathBuf>,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// Show what strata knows about a file
    #[command(alias = "i")]
    Info {
        /// File to inspect
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        builder.filter(None, LevelFilter::Warn);
    }
    if cli.verbose {
        builder.filter(None, LevelFilter::Debug);
    }
    builder.init();

    let result = match cli.command {
        Commands::Compress(args) => cmd_compress(&args, cli.verbose),
        Commands::Decompress(args) => cmd_decompress(&args, cli.verbose),
        Commands::Test {
            files,
            scratch_dir,
            json,
        } => cmd_test(&files, scratch_dir, json, cli.verbose),
        Commands::Info { file } => cmd_info(&file),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
