//! Command implementations for Strata CLI.

pub mod info;
pub mod run;

pub use info::cmd_info;
pub use run::{Check, Level, RunArgs, cmd_compress, cmd_decompress};
pub use test::cmd_test;
