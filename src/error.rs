use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot read input directory {}: {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unrecognized parameter in descriptor line: '{descriptor}'")]
    UnrecognizedParameter { descriptor: String },

    #[error("Temperature file name '{file_name}' has no tmin/tmax marker")]
    AmbiguousTemperature { file_name: String },

    #[error("Line {line}: invalid timestamp '{timestamp}': {reason}")]
    InvalidTimestamp {
        line: u64,
        timestamp: String,
        reason: String,
    },

    #[error("Line {line}: invalid observation value '{value}'")]
    InvalidValue { line: u64, value: String },

    #[error("Line {line}: expected {expected} observation columns, found {found}")]
    ColumnMismatch {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("{file}: {source}")]
    File {
        file: String,
        #[source]
        source: Box<ProcessingError>,
    },

    #[error("Failed to move output into place: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration error: {0}")]
    ConfigLoad(#[from] ::config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl ProcessingError {
    /// Attach the name of the file being processed.
    pub fn in_file(self, file: impl Into<String>) -> Self {
        match self {
            already @ ProcessingError::File { .. } => already,
            other => ProcessingError::File {
                file: file.into(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying error, looking through any file context.
    pub fn root(&self) -> &ProcessingError {
        match self {
            ProcessingError::File { source, .. } => source.root(),
            other => other,
        }
    }

    /// File name attached by [`ProcessingError::in_file`], if any.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            ProcessingError::File { file, .. } => Some(file),
            _ => None,
        }
    }

    pub fn is_classification(&self) -> bool {
        matches!(
            self.root(),
            ProcessingError::UnrecognizedParameter { .. }
                | ProcessingError::AmbiguousTemperature { .. }
        )
    }

    pub fn is_format(&self) -> bool {
        matches!(
            self.root(),
            ProcessingError::InvalidTimestamp { .. }
                | ProcessingError::InvalidValue { .. }
                | ProcessingError::ColumnMismatch { .. }
                | ProcessingError::InvalidFormat(_)
        )
    }
}
