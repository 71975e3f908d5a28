use crate::analyzers::{Aggregation, ComparisonPeriod, Statistic};
use crate::config::UnrecognizedPolicy;
use crate::models::LabelStyle;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cbh-processor")]
#[command(about = "Convert Geo Data Portal climate CSVs into PRMS CBH input files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Configuration file (TOML)")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Hide the progress bar")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

/// Source selection shared by the subcommands that scan a directory
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    #[arg(short, long, help = "Directory containing GDP CSV files [default: outfiles]")]
    pub input_dir: Option<PathBuf>,

    #[arg(long, help = "Only use files whose name contains this text (e.g. 'tmax')")]
    pub file_pattern: Option<String>,

    #[arg(long, help = "Lines before the first data row [default: 3]")]
    pub header_lines: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert every CSV in the input directory to a .prms file
    Convert {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(short, long, help = "Directory for .prms files [default: cbh]")]
        output_dir: Option<PathBuf>,

        #[arg(long, help = "Name written on the 'created by' line")]
        tool_name: Option<String>,

        #[arg(long, value_enum, help = "Quantity names in the header [default: descriptive]")]
        labels: Option<LabelStyle>,

        #[arg(long, value_enum, help = "Unrecognized quantity: skip the file or abort [default: skip]")]
        on_unrecognized: Option<UnrecognizedPolicy>,

        #[arg(long, help = "Keep partially written output when a row fails")]
        keep_partial: bool,

        #[arg(short, long, help = "Files converted in parallel, 0 for all cores [default: 1]")]
        jobs: Option<usize>,

        #[arg(long, help = "Print the batch report as JSON")]
        json: bool,
    },

    /// Show the quantity each file resolves to, without converting
    Classify {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long, help = "Lines before the first data row [default: 3]")]
        header_lines: Option<usize>,
    },

    /// Summarise converted series by comparison period
    Stats {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(short, long = "period", required = true, help = "Comparison period, e.g. 2046-2065 (repeatable)")]
        periods: Vec<ComparisonPeriod>,

        #[arg(short, long, help = "Baseline period, e.g. 1961-2000")]
        baseline: Option<ComparisonPeriod>,

        #[arg(long, value_enum, default_value = "annual")]
        statistic: Statistic,

        #[arg(long, value_enum, default_value = "mean", help = "Combine daily values by mean or sum")]
        calc: Aggregation,

        #[arg(long, help = "Report this quantile across years instead of the mean")]
        quantile: Option<f64>,

        #[arg(long, help = "Also write the annual series of every scenario to this CSV")]
        timeseries: Option<PathBuf>,

        #[arg(long, default_value_t = 0, help = "Leading years dropped from the annual series")]
        spinup: u32,

        #[arg(
            short,
            long,
            help = "Output CSV path [default: output/cbh-stats-{YYMMDD}.csv]"
        )]
        output_file: Option<PathBuf>,
    },
}
