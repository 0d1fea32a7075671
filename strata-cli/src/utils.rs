//! Utility functions for the CLI.

use indicatif::{ProgressBar, ProgressStyle};
use strata_pipeline::StageReport;

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    let pb = ProgressBar::new(len);
    pb.set_style(style);
    pb
}

/// Size change as a percentage saving, e.g. `87.5%`.
pub fn format_saving(before: u64, after: u64) -> String {
    if before == 0 {
        return "n/a".to_string();
    }
    format!("{:.1}%", (1.0 - after as f64 / before as f64) * 100.0)
}

/// Print one line per stage.
pub fn print_stages(stages: &[StageReport]) {
    for stage in stages {
        println!(
            "  [{}] {:<8} {:<6} {:>12} -> {:>12} bytes",
            stage.index,
            stage.codec,
            stage.direction.to_string(),
            stage.bytes_in,
            stage.bytes_out
        );
    }
}
