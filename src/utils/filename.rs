use crate::utils::constants::CBH_EXTENSION;
use chrono::{Datelike, Local};
use std::path::{Path, PathBuf};

/// Output path for a source file: same stem, `.prms` extension, in `output_dir`.
pub fn cbh_output_path(output_dir: &Path, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir.join(format!("{}.{}", stem, CBH_EXTENSION))
}

/// Generate default statistics filename with format: cbh-stats-{YYMMDD}.csv
pub fn generate_default_stats_filename() -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100;

    let filename = format!("cbh-stats-{:02}{:02}{:02}.csv", year, now.month(), now.day());
    PathBuf::from("output").join(filename)
}
