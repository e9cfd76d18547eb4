//! File source: reads a JSON snapshot from a local file each tick.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::{MetricSource, SourceError};

/// A source that reads its snapshot from a JSON file.
///
/// Useful when a collector on the same host writes metrics to disk, and
/// for driving the pipeline from canned data.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    id: String,
}

impl FileSource {
    /// Create a file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let id = path.display().to_string();
        Self { path, id }
    }

    /// The path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MetricSource for FileSource {
    async fn fetch(&self) -> Result<Value, SourceError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Io(e.to_string()))?;

        serde_json::from_str(&content).map_err(|e| SourceError::Parse(e.to_string()))
    }

    fn id(&self) -> &str {
        &self.id
    }
}
