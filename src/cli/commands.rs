use crate::analyzers::{scenario_name, AnnualSeries, PeriodStatistics, StatisticsTable};
use crate::cli::args::{Cli, Commands, SourceArgs};
use crate::cli::logging::init_logging;
use crate::config::ConverterConfig;
use crate::error::Result;
use crate::processors::{BatchProcessor, Transcoder};
use crate::readers::SourceDiscovery;
use crate::utils::filename::generate_default_stats_filename;
use crate::utils::progress::ProgressReporter;
use std::path::PathBuf;
use tracing::{info, warn};
use validator::Validate;

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;
    let mut config = ConverterConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Convert {
            source,
            output_dir,
            tool_name,
            labels,
            on_unrecognized,
            keep_partial,
            jobs,
            json,
        } => {
            apply_source_args(&mut config, source);
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(name) = tool_name {
                config.tool_name = name;
            }
            if let Some(style) = labels {
                config.labels = style;
            }
            if let Some(policy) = on_unrecognized {
                config.on_unrecognized = policy;
            }
            if keep_partial {
                config.keep_partial_output = true;
            }
            if let Some(jobs) = jobs {
                config.jobs = jobs;
            }
            config.validate()?;

            info!("Input directory: {}", config.input_dir.display());
            info!("Output directory: {}", config.output_dir.display());

            let files = discover(&config).await?;
            if files.is_empty() {
                println!("No CSV files found in {}", config.input_dir.display());
                return Ok(());
            }

            let processor = BatchProcessor::new(Transcoder::from_config(&config))
                .with_max_workers(config.jobs)
                .with_unrecognized_policy(config.on_unrecognized);
            let progress = ProgressReporter::for_files(files.len() as u64, cli.quiet || json);

            let report = tokio::task::spawn_blocking(move || {
                let report = processor.process_files(&files, Some(&progress));
                progress.finish_with_message("All files processed");
                report
            })
            .await??;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("\n{}", report.summary());
                if report.is_clean() {
                    println!("All files converted!");
                } else {
                    println!("⚠️  {} files could not be converted", report.failures.len());
                }
            }
        }

        Commands::Classify {
            files,
            header_lines,
        } => {
            if let Some(lines) = header_lines {
                config.header_lines = lines;
            }
            config.validate()?;

            let transcoder = Transcoder::from_config(&config);
            for path in files {
                match transcoder.classify(&path) {
                    Ok((source, quantity)) => println!(
                        "{}: {} ({}, {} -> {}, {} columns) from '{}'",
                        path.display(),
                        quantity,
                        quantity.prms_name(),
                        quantity.source_units(),
                        quantity.model_units(),
                        source.descriptor_column_count(),
                        source.name_line(),
                    ),
                    Err(e) => {
                        warn!("{}: {}", path.display(), e);
                        println!("{}: not convertible ({})", path.display(), e);
                    }
                }
            }
        }

        Commands::Stats {
            source,
            periods,
            baseline,
            statistic,
            calc,
            quantile,
            timeseries,
            spinup,
            output_file,
        } => {
            apply_source_args(&mut config, source);
            config.validate()?;

            let stats = PeriodStatistics::new(periods)
                .with_baseline(baseline)
                .with_statistic(statistic)
                .with_aggregation(calc)
                .with_quantile(quantile)?
                .with_spinup(spinup);
            let output_file = output_file.unwrap_or_else(generate_default_stats_filename);

            let files = discover(&config).await?;
            let transcoder = Transcoder::from_config(&config);

            let want_series = timeseries.is_some();
            let (table, series) = tokio::task::spawn_blocking(move || {
                build_table(&transcoder, &stats, &files, want_series)
            })
            .await??;

            table.write_csv(&output_file)?;
            println!(
                "Wrote {} statistics rows to {}",
                table.len(),
                output_file.display()
            );

            if let (Some(path), Some(series)) = (timeseries, series) {
                series.write_csv(&path)?;
                println!("Wrote {} annual values to {}", series.len(), path.display());
            }
        }
    }

    Ok(())
}

fn apply_source_args(config: &mut ConverterConfig, source: SourceArgs) {
    if let Some(dir) = source.input_dir {
        config.input_dir = dir;
    }
    if source.file_pattern.is_some() {
        config.file_pattern = source.file_pattern;
    }
    if let Some(lines) = source.header_lines {
        config.header_lines = lines;
    }
}

async fn discover(config: &ConverterConfig) -> Result<Vec<PathBuf>> {
    SourceDiscovery::new(&config.input_dir)
        .with_file_pattern(config.file_pattern.as_deref())
        .discover()
        .await
}

/// Statistics for every file that classifies and parses; others are logged
/// and left out.
fn build_table(
    transcoder: &Transcoder,
    stats: &PeriodStatistics,
    files: &[PathBuf],
    want_series: bool,
) -> Result<(StatisticsTable, Option<AnnualSeries>)> {
    let mut table = StatisticsTable::new();
    let mut series = want_series.then(AnnualSeries::new);

    for path in files {
        let outcome = transcoder.classify(path).and_then(|(source, quantity)| {
            let daily = stats.daily_series(&source, quantity)?;
            Ok((scenario_name(source.stem(), quantity), quantity, daily))
        });

        match outcome {
            Ok((scenario, quantity, daily)) => {
                let variable = quantity.prms_name();
                stats.add_series(&mut table, &scenario, variable, &daily);
                if let Some(series) = series.as_mut() {
                    stats.add_annual(series, &scenario, variable, &daily);
                }
            }
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    Ok((table, series))
}
