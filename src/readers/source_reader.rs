use crate::error::{ProcessingError, Result};
use crate::models::{DataRecord, Timestamp};
use crate::utils::constants::{DEFAULT_HEADER_LINES, DESCRIPTOR_LINE};
use memmap2::Mmap;
use std::borrow::Cow;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A Geo Data Portal CSV download, split into its preamble and data section.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_name: String,
    preamble: Vec<String>,
    body: String,
}

impl SourceFile {
    /// Split decoded text into `header_lines` preamble lines and the data body.
    pub fn from_text(path: &Path, text: &str, header_lines: usize) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or_else(|| ProcessingError::InvalidFormat("Invalid file path".to_string()))?
            .to_string();

        let mut preamble = Vec::with_capacity(header_lines);
        let mut offset = 0;
        for line in text.split_inclusive('\n').take(header_lines) {
            offset += line.len();
            preamble.push(line.trim_end_matches(['\r', '\n']).to_string());
        }

        if preamble.len() < header_lines {
            return Err(ProcessingError::InvalidFormat(format!(
                "file has {} lines, expected at least {} header lines",
                preamble.len(),
                header_lines
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            preamble,
            body: text[offset..].to_string(),
        })
    }

    pub fn name_line(&self) -> &str {
        self.preamble_line(1)
    }

    pub fn units_line(&self) -> &str {
        self.preamble_line(2)
    }

    /// The line carrying the quantity markers (`MEAN(mm)`, `MEAN(C)`)
    pub fn descriptor_line(&self) -> &str {
        self.preamble_line(DESCRIPTOR_LINE)
    }

    /// Observation columns announced by the descriptor line, for files with
    /// no data rows.
    pub fn descriptor_column_count(&self) -> usize {
        self.descriptor_line().split(',').count().saturating_sub(1)
    }

    /// File name without its extension
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name)
    }

    /// Iterate over the data rows in source order.
    pub fn records(&self) -> DataRecords<'_> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(self.body.as_bytes());

        DataRecords {
            inner: reader.into_records(),
            line_offset: self.preamble.len() as u64,
            expected_columns: None,
        }
    }

    fn preamble_line(&self, number: usize) -> &str {
        self.preamble
            .get(number - 1)
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Streaming iterator over parsed [`DataRecord`]s.
///
/// The first row fixes the observation column count; later rows must match.
pub struct DataRecords<'a> {
    inner: csv::StringRecordsIntoIter<&'a [u8]>,
    line_offset: u64,
    expected_columns: Option<usize>,
}

impl DataRecords<'_> {
    fn parse_record(&mut self, record: &csv::StringRecord) -> Result<DataRecord> {
        let line = self.line_offset + record.position().map_or(0, |p| p.line());

        let timestamp_str = record.get(0).unwrap_or("");
        let timestamp = Timestamp::decompose(timestamp_str).map_err(|reason| {
            ProcessingError::InvalidTimestamp {
                line,
                timestamp: timestamp_str.to_string(),
                reason,
            }
        })?;

        let values = record
            .iter()
            .skip(1)
            .map(|field| parse_value(field, line))
            .collect::<Result<Vec<f64>>>()?;

        match self.expected_columns {
            None if values.is_empty() => {
                return Err(ProcessingError::InvalidFormat(format!(
                    "Line {}: row has no observation columns",
                    line
                )));
            }
            None => self.expected_columns = Some(values.len()),
            Some(expected) if expected != values.len() => {
                return Err(ProcessingError::ColumnMismatch {
                    line,
                    expected,
                    found: values.len(),
                });
            }
            Some(_) => {}
        }

        Ok(DataRecord::new(line, timestamp, values))
    }
}

impl Iterator for DataRecords<'_> {
    type Item = Result<DataRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next()? {
            Ok(record) => Some(self.parse_record(&record)),
            Err(e) => Some(Err(e.into())),
        }
    }
}

fn parse_value(field: &str, line: u64) -> Result<f64> {
    match field.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ProcessingError::InvalidValue {
            line,
            value: field.to_string(),
        }),
    }
}

pub struct SourceReader {
    header_lines: usize,
    use_mmap: bool,
}

impl SourceReader {
    pub fn new() -> Self {
        Self {
            header_lines: DEFAULT_HEADER_LINES,
            use_mmap: false,
        }
    }

    pub fn with_header_lines(mut self, header_lines: usize) -> Self {
        self.header_lines = header_lines.max(DESCRIPTOR_LINE);
        self
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    /// Read and decode a source file.
    pub fn read(&self, path: &Path) -> Result<SourceFile> {
        let text = if self.use_mmap {
            let file = File::open(path)?;
            let mmap = unsafe { Mmap::map(&file)? };
            decode_text(&mmap, path).into_owned()
        } else {
            let bytes = std::fs::read(path)?;
            decode_text(&bytes, path).into_owned()
        };

        debug!("Read {} ({} bytes)", path.display(), text.len());
        SourceFile::from_text(path, &text, self.header_lines)
    }
}

impl Default for SourceReader {
    fn default() -> Self {
        Self::new()
    }
}

/// UTF-8 (BOM-aware), falling back to Windows-1252 for legacy downloads.
fn decode_text<'a>(bytes: &'a [u8], path: &Path) -> Cow<'a, str> {
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if !had_errors {
        return text;
    }

    warn!(
        "{} is not valid UTF-8, decoding as Windows-1252",
        path.display()
    );
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
# wicci_tmax_a1b
TIMESTEP,1,2
TIMESTEP,MEAN(C),MEAN(C)
2050-01-01T00:00:00Z,10.0,-5.5
2050-01-02T00:00:00Z,11.0,-4.0
";

    #[test]
    fn test_preamble_lines() {
        let source = SourceFile::from_text(Path::new("wicci_tmax_a1b.csv"), SAMPLE, 3).unwrap();

        assert_eq!(source.name_line(), "# wicci_tmax_a1b");
        assert_eq!(source.units_line(), "TIMESTEP,1,2");
        assert_eq!(source.descriptor_line(), "TIMESTEP,MEAN(C),MEAN(C)");
        assert_eq!(source.descriptor_column_count(), 2);
        assert_eq!(source.stem(), "wicci_tmax_a1b");
    }

    #[test]
    fn test_records() {
        let source = SourceFile::from_text(Path::new("wicci_tmax_a1b.csv"), SAMPLE, 3).unwrap();
        let records: Vec<DataRecord> = source.records().collect::<Result<_>>().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 4);
        assert_eq!(records[0].values, vec![10.0, -5.5]);
        assert_eq!(records[1].timestamp.day, 2);
    }

    #[test]
    fn test_blank_and_comment_lines_are_skipped() {
        let text = "a\nb\nTIMESTEP,MEAN(mm)\n\n# note\n2050-01-01T00:00:00Z,1.0\r\n";
        let source = SourceFile::from_text(Path::new("p.csv"), text, 3).unwrap();
        let records: Vec<DataRecord> = source.records().collect::<Result<_>>().unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].line, 6);
    }

    #[test]
    fn test_invalid_value() {
        let text = "a\nb\nc\n2050-01-01T00:00:00Z,\n";
        let source = SourceFile::from_text(Path::new("p.csv"), text, 3).unwrap();
        let err = source.records().next().unwrap().unwrap_err();
        assert!(matches!(err, ProcessingError::InvalidValue { line: 4, .. }));

        let text = "a\nb\nc\n2050-01-01T00:00:00Z,nan\n";
        let source = SourceFile::from_text(Path::new("p.csv"), text, 3).unwrap();
        assert!(source.records().next().unwrap().is_err());
    }

    #[test]
    fn test_column_mismatch() {
        let text = "a\nb\nc\n2050-01-01T00:00:00Z,1,2\n2050-01-02T00:00:00Z,1\n";
        let source = SourceFile::from_text(Path::new("p.csv"), text, 3).unwrap();
        let results: Vec<Result<DataRecord>> = source.records().collect();

        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(ProcessingError::ColumnMismatch {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_short_file() {
        let result = SourceFile::from_text(Path::new("p.csv"), "only\ntwo\n", 3);
        assert!(result.is_err());
    }

    #[test]
    fn test_read_windows_1252() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        temp_file.write_all(b"Station \xe9t\xe9\nunits\nTIMESTEP,MEAN(mm)\n2050-01-01T00:00:00Z,2.0\n")?;

        let source = SourceReader::new().read(temp_file.path())?;
        assert_eq!(source.name_line(), "Station été");
        assert_eq!(source.records().count(), 1);

        let mapped = SourceReader::new().with_mmap(true).read(temp_file.path())?;
        assert_eq!(mapped.descriptor_line(), "TIMESTEP,MEAN(mm)");

        Ok(())
    }
}
