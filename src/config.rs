//! Converter configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `CBH_*` environment variables. Command-line flags are applied
//! on top by the CLI.

use crate::error::Result;
use crate::models::LabelStyle;
use crate::utils::constants::{
    DEFAULT_CONFIG_FILE, DEFAULT_HEADER_LINES, DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR,
};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

/// What a batch run does with a file whose quantity cannot be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UnrecognizedPolicy {
    /// Report the file and carry on with the rest
    #[default]
    Skip,
    /// Stop the whole run
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ConverterConfig {
    /// Directory holding the GDP CSV downloads
    pub input_dir: PathBuf,

    /// Directory receiving the `.prms` files
    pub output_dir: PathBuf,

    /// Name written on the `created by` banner line
    #[validate(length(min = 1))]
    pub tool_name: String,

    /// Only convert files whose name contains this text
    pub file_pattern: Option<String>,

    pub labels: LabelStyle,

    pub on_unrecognized: UnrecognizedPolicy,

    /// Persist a partially written output file when a row fails
    pub keep_partial_output: bool,

    /// Preamble lines before the data rows; the third is the descriptor
    #[validate(range(min = 3, max = 1000))]
    pub header_lines: usize,

    /// Files converted in parallel; `0` means one per CPU core
    #[validate(range(max = 1024))]
    pub jobs: usize,

    pub use_mmap: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            tool_name: env!("CARGO_PKG_NAME").to_string(),
            file_pattern: None,
            labels: LabelStyle::default(),
            on_unrecognized: UnrecognizedPolicy::default(),
            keep_partial_output: false,
            header_lines: DEFAULT_HEADER_LINES,
            jobs: 1,
            use_mmap: false,
        }
    }
}

impl ConverterConfig {
    /// Load configuration. An explicit `path` must exist; otherwise
    /// `cbh-processor.toml` in the working directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file_source = match path {
            Some(p) => File::from(p).required(true),
            None => File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };

        let settings = Config::builder()
            .add_source(file_source)
            .add_source(Environment::with_prefix("CBH").try_parsing(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
