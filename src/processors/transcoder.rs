use crate::config::ConverterConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{DataRecord, LabelStyle, OutputLine, QuantityKind};
use crate::processors::{HeaderClassifier, UnitConverter};
use crate::readers::{SourceFile, SourceReader};
use crate::utils::constants::{DEFAULT_BUFFER_SIZE, DEFAULT_HEADER_LINES};
use crate::utils::filename::cbh_output_path;
use crate::writers::CbhWriter;
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Outcome of converting one source file.
#[derive(Debug, Clone, Serialize)]
pub struct TranscodeSummary {
    pub source: PathBuf,
    pub output: PathBuf,
    pub quantity: QuantityKind,
    pub columns: usize,
    pub rows: usize,
}

/// Converts one GDP CSV download into one CBH file.
///
/// Output goes to a temporary file beside the target and is renamed into
/// place only when every row converted; on failure nothing is left behind
/// unless `keep_partial_output` is set.
#[derive(Debug, Clone)]
pub struct Transcoder {
    reader_header_lines: usize,
    use_mmap: bool,
    classifier: HeaderClassifier,
    converter: UnitConverter,
    output_dir: PathBuf,
    tool_name: String,
    labels: LabelStyle,
    keep_partial_output: bool,
}

impl Transcoder {
    pub fn new(output_dir: impl Into<PathBuf>, tool_name: &str) -> Self {
        Self {
            reader_header_lines: DEFAULT_HEADER_LINES,
            use_mmap: false,
            classifier: HeaderClassifier::default(),
            converter: UnitConverter::new(),
            output_dir: output_dir.into(),
            tool_name: tool_name.to_string(),
            labels: LabelStyle::default(),
            keep_partial_output: false,
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(&config.output_dir, &config.tool_name)
            .with_labels(config.labels)
            .with_header_lines(config.header_lines)
            .with_keep_partial_output(config.keep_partial_output)
            .with_mmap(config.use_mmap)
    }

    pub fn with_classifier(mut self, classifier: HeaderClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_labels(mut self, labels: LabelStyle) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_header_lines(mut self, header_lines: usize) -> Self {
        self.reader_header_lines = header_lines;
        self
    }

    pub fn with_keep_partial_output(mut self, keep: bool) -> Self {
        self.keep_partial_output = keep;
        self
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    pub fn reader(&self) -> SourceReader {
        SourceReader::new()
            .with_header_lines(self.reader_header_lines)
            .with_mmap(self.use_mmap)
    }

    /// Read a source file and resolve its quantity without writing anything.
    pub fn classify(&self, path: &Path) -> Result<(SourceFile, QuantityKind)> {
        let source = self.reader().read(path)?;
        let quantity = self
            .classifier
            .classify(source.descriptor_line(), &source.file_name)?;
        Ok((source, quantity))
    }

    /// Convert `path` into `<output_dir>/<stem>.prms`. Errors carry the file name.
    pub fn transcode(&self, path: &Path) -> Result<TranscodeSummary> {
        self.transcode_file(path)
            .map_err(|e| e.in_file(display_name(path)))
    }

    pub fn convert_record(&self, quantity: QuantityKind, record: &DataRecord) -> OutputLine {
        OutputLine {
            timestamp: record.timestamp,
            values: record
                .values
                .iter()
                .map(|&value| self.converter.format_value(quantity, value))
                .collect(),
        }
    }

    fn transcode_file(&self, path: &Path) -> Result<TranscodeSummary> {
        let (source, quantity) = self.classify(path)?;
        let output = cbh_output_path(&self.output_dir, path);
        debug!(
            "{}: dataset '{}', units '{}'",
            source.file_name,
            source.name_line(),
            source.units_line()
        );
        debug!(
            "{} classified as {}, writing {}",
            source.file_name,
            quantity,
            output.display()
        );

        std::fs::create_dir_all(&self.output_dir)?;
        let temp = tempfile::Builder::new()
            .prefix(".cbh-")
            .suffix(".partial")
            .tempfile_in(&self.output_dir)?;
        let mut writer = CbhWriter::new(BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, temp));

        match self.write_source(&source, quantity, &mut writer) {
            Ok(columns) => {
                let rows = writer.lines_written();
                persist(writer, &output)?;
                Ok(TranscodeSummary {
                    source: path.to_path_buf(),
                    output,
                    quantity,
                    columns,
                    rows,
                })
            }
            Err(e) => {
                if self.keep_partial_output {
                    match persist(writer, &output) {
                        Ok(()) => warn!("Kept partial output {}", output.display()),
                        Err(persist_err) => warn!(
                            "Could not keep partial output {}: {}",
                            output.display(),
                            persist_err
                        ),
                    }
                }
                Err(e)
            }
        }
    }

    /// Write header and rows; returns the observation column count.
    fn write_source<W: Write>(
        &self,
        source: &SourceFile,
        quantity: QuantityKind,
        writer: &mut CbhWriter<W>,
    ) -> Result<usize> {
        let mut records = source.records();
        let first = records.next().transpose()?;
        let columns = first
            .as_ref()
            .map_or_else(|| source.descriptor_column_count(), DataRecord::column_count);

        writer.write_header(&self.tool_name, quantity, self.labels, columns)?;

        for record in first.into_iter().map(Ok).chain(records) {
            let record = record?;
            writer.write_line(&self.convert_record(quantity, &record))?;
        }

        Ok(columns)
    }
}

fn persist(writer: CbhWriter<BufWriter<NamedTempFile>>, output: &Path) -> Result<()> {
    let temp = writer
        .finish()?
        .into_inner()
        .map_err(|e| ProcessingError::Io(e.into_error()))?;
    temp.persist(output)?;
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
