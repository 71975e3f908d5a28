use crate::config::UnrecognizedPolicy;
use crate::error::{ProcessingError, Result};
use crate::processors::{TranscodeSummary, Transcoder};
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Classification,
    Format,
    Io,
}

impl FailureKind {
    fn of(error: &ProcessingError) -> Self {
        if error.is_classification() {
            FailureKind::Classification
        } else if error.is_format() {
            FailureKind::Format
        } else {
            FailureKind::Io
        }
    }
}

/// A file the batch could not convert.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub file: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

/// Per-file outcomes of a batch run, in discovery order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub converted: Vec<TranscodeSummary>,
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    pub fn total_files(&self) -> usize {
        self.converted.len() + self.failures.len()
    }

    pub fn total_rows(&self) -> usize {
        self.converted.iter().map(|s| s.rows).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();
        let _ = writeln!(summary, "Conversion Summary:");
        let _ = writeln!(summary, "  Files examined: {}", self.total_files());
        let _ = writeln!(summary, "  Files converted: {}", self.converted.len());
        let _ = writeln!(summary, "  Rows written: {}", self.total_rows());
        let _ = writeln!(summary, "  Files failed: {}", self.failures.len());

        for failure in &self.failures {
            let _ = writeln!(summary, "    [{:?}] {}", failure.kind, failure.message);
        }

        summary
    }
}

/// Runs the transcoder over a list of source files.
///
/// With more than one worker the files are converted on a rayon pool, but
/// outcomes are still gathered and reported in input order.
pub struct BatchProcessor {
    transcoder: Transcoder,
    max_workers: usize,
    on_unrecognized: UnrecognizedPolicy,
}

impl BatchProcessor {
    pub fn new(transcoder: Transcoder) -> Self {
        Self {
            transcoder,
            max_workers: 1,
            on_unrecognized: UnrecognizedPolicy::Skip,
        }
    }

    /// `0` uses one worker per CPU core.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = if max_workers == 0 {
            num_cpus::get()
        } else {
            max_workers
        };
        self
    }

    pub fn with_unrecognized_policy(mut self, policy: UnrecognizedPolicy) -> Self {
        self.on_unrecognized = policy;
        self
    }

    /// Convert every file. Only an unrecognized quantity under
    /// [`UnrecognizedPolicy::Abort`] turns into an `Err`; every other
    /// failure is recorded in the report.
    pub fn process_files(
        &self,
        files: &[PathBuf],
        progress: Option<&ProgressReporter>,
    ) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        if self.max_workers == 1 {
            for path in files {
                let outcome = self.process_one(path, progress);
                self.record(&mut report, path, outcome, progress)?;
            }
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.max_workers)
                .build()
                .map_err(|e| ProcessingError::Config(e.to_string()))?;

            let outcomes: Vec<Result<TranscodeSummary>> = pool.install(|| {
                files
                    .par_iter()
                    .map(|path| self.process_one(path, progress))
                    .collect()
            });

            for (path, outcome) in files.iter().zip(outcomes) {
                self.record(&mut report, path, outcome, progress)?;
            }
        }

        info!(
            "Converted {} of {} files ({} rows)",
            report.converted.len(),
            report.total_files(),
            report.total_rows()
        );

        Ok(report)
    }

    fn process_one(
        &self,
        path: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<TranscodeSummary> {
        if let Some(p) = progress {
            p.start_file(&path.file_name().unwrap_or_default().to_string_lossy());
        }

        let outcome = self.transcoder.transcode(path);

        if let Some(p) = progress {
            p.finish_file();
        }
        outcome
    }

    fn record(
        &self,
        report: &mut BatchReport,
        path: &Path,
        outcome: Result<TranscodeSummary>,
        progress: Option<&ProgressReporter>,
    ) -> Result<()> {
        match outcome {
            Ok(summary) => {
                info!(
                    "{} -> {} ({} rows, {} columns)",
                    path.display(),
                    summary.output.display(),
                    summary.rows,
                    summary.columns
                );
                report.converted.push(summary);
                Ok(())
            }
            Err(e) if e.is_classification() && self.on_unrecognized == UnrecognizedPolicy::Abort => {
                Err(e)
            }
            Err(e) => {
                warn!("Skipping {}", e);
                if let Some(p) = progress {
                    p.println(&format!("⚠️  Skipped {}", e));
                }
                report.failures.push(FileFailure {
                    file: path.to_path_buf(),
                    kind: FailureKind::of(&e),
                    message: e.to_string(),
                });
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup(dir: &Path) -> Vec<PathBuf> {
        let files = [
            ("a_tmax.csv", "x\ny\nTIMESTEP,MEAN(C)\n2050-01-01T00:00:00Z,10.0\n"),
            ("b_wind.csv", "x\ny\nTIMESTEP,MEAN(m/s)\n2050-01-01T00:00:00Z,3.0\n"),
            ("c_prcp.csv", "x\ny\nTIMESTEP,MEAN(mm)\n2050-01-01T00:00:00Z,2.54\n"),
            ("d_tmin.csv", "x\ny\nTIMESTEP,MEAN(C)\n2050-01-01X00:00:00Z,1.0\n"),
        ];
        files
            .iter()
            .map(|(name, body)| {
                let path = dir.join(name);
                std::fs::write(&path, body).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_skip_policy_reports_and_continues() -> Result<()> {
        let input = TempDir::new()?;
        let output = TempDir::new()?;
        let files = setup(input.path());

        let processor = BatchProcessor::new(Transcoder::new(output.path(), "t"));
        let report = processor.process_files(&files, None)?;

        assert_eq!(report.converted.len(), 2);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].kind, FailureKind::Classification);
        assert!(report.failures[0].message.contains("b_wind.csv"));
        assert_eq!(report.failures[1].kind, FailureKind::Format);
        assert!(report.failures[1].message.contains("d_tmin.csv"));
        assert!(output.path().join("c_prcp.prms").exists());
        assert!(!report.is_clean());

        Ok(())
    }

    #[test]
    fn test_report_with_progress() -> Result<()> {
        let input = TempDir::new()?;
        let output = TempDir::new()?;
        let files = setup(input.path());

        let progress = ProgressReporter::hidden();
        let report = BatchProcessor::new(Transcoder::new(output.path(), "t"))
            .process_files(&files, Some(&progress))?;

        assert_eq!(report.total_files(), 4);
        assert_eq!(report.failures.len(), 2);

        Ok(())
    }

    #[test]
    fn test_abort_policy_stops_run() -> Result<()> {
        let input = TempDir::new()?;
        let output = TempDir::new()?;
        let files = setup(input.path());

        let processor = BatchProcessor::new(Transcoder::new(output.path(), "t"))
            .with_unrecognized_policy(UnrecognizedPolicy::Abort);
        let err = processor.process_files(&files, None).unwrap_err();

        assert!(err.is_classification());
        assert_eq!(err.file_name(), Some("b_wind.csv"));
        assert!(output.path().join("a_tmax.prms").exists());
        assert!(!output.path().join("c_prcp.prms").exists());

        Ok(())
    }

    #[test]
    fn test_parallel_keeps_input_order() -> Result<()> {
        let input = TempDir::new()?;
        let output = TempDir::new()?;
        let files = setup(input.path());

        let report = BatchProcessor::new(Transcoder::new(output.path(), "t"))
            .with_max_workers(4)
            .process_files(&files, None)?;

        let converted: Vec<&Path> = report.converted.iter().map(|s| s.source.as_path()).collect();
        assert_eq!(converted, vec![files[0].as_path(), files[2].as_path()]);
        assert_eq!(report.failures[0].file, files[1]);
        assert_eq!(report.failures[1].file, files[3]);
        assert!(report.summary().contains("Files converted: 2"));

        Ok(())
    }

    #[test]
    fn test_zero_workers_uses_all_cores() {
        let processor = BatchProcessor::new(Transcoder::new("out", "t")).with_max_workers(0);
        assert_eq!(processor.max_workers, num_cpus::get());
    }
}
