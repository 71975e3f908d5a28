pub mod constants;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use filename::{cbh_output_path, generate_default_stats_filename};
pub use progress::ProgressReporter;
