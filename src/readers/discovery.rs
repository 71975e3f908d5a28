use crate::error::{ProcessingError, Result};
use crate::utils::constants::SOURCE_EXTENSION;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Finds GDP CSV downloads in a flat input directory.
#[derive(Debug, Clone)]
pub struct SourceDiscovery {
    input_dir: PathBuf,
    file_pattern: Option<String>,
}

impl SourceDiscovery {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            file_pattern: None,
        }
    }

    /// Only keep files whose name contains `pattern` (empty means all).
    pub fn with_file_pattern(mut self, pattern: Option<&str>) -> Self {
        self.file_pattern = pattern.filter(|p| !p.is_empty()).map(str::to_string);
        self
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// List source files sorted by file name.
    pub async fn discover(&self) -> Result<Vec<PathBuf>> {
        let discovery_error = |source| ProcessingError::Discovery {
            path: self.input_dir.clone(),
            source,
        };

        let mut dir = fs::read_dir(&self.input_dir)
            .await
            .map_err(discovery_error)?;

        let mut files = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(discovery_error)? {
            let path = entry.path();
            if !entry.file_type().await.map_err(discovery_error)?.is_file() {
                continue;
            }
            if !is_source_file(&path) || !self.matches_pattern(&path) {
                continue;
            }
            files.push(path);
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        debug!(
            "Found {} source files in {}",
            files.len(),
            self.input_dir.display()
        );

        Ok(files)
    }

    fn matches_pattern(&self, path: &Path) -> bool {
        match &self.file_pattern {
            None => true,
            Some(pattern) => path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.contains(pattern.as_str())),
        }
    }
}

/// Case-insensitive `.csv` check
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
}
