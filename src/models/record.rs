use crate::models::Timestamp;
use std::fmt;

/// One data row of a source CSV, in source units.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRecord {
    /// 1-based line number in the source file
    pub line: u64,
    pub timestamp: Timestamp,
    pub values: Vec<f64>,
}

impl DataRecord {
    pub fn new(line: u64, timestamp: Timestamp, values: Vec<f64>) -> Self {
        Self {
            line,
            timestamp,
            values,
        }
    }

    pub fn column_count(&self) -> usize {
        self.values.len()
    }
}

/// One CBH data line: six date/time integers then the formatted values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub timestamp: Timestamp,
    pub values: Vec<String>,
}

/// Fields joined by single spaces, without the line terminator.
impl fmt::Display for OutputLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.timestamp)?;
        for value in &self.values {
            write!(f, " {}", value)?;
        }
        Ok(())
    }
}
