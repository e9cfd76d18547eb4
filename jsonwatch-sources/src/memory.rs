//! In-memory source, for tests and demos.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::{MetricSource, SourceError};

/// A source that serves a value held in memory.
///
/// The value can be swapped between ticks with [`set`](StaticSource::set),
/// which makes this the easiest way to drive the pipeline in tests:
///
/// ```rust
/// use jsonwatch_sources::StaticSource;
/// use serde_json::json;
///
/// let source = StaticSource::new("fake", json!({"v": 1}));
/// let handle = source.clone();
/// // ...hand `source` to the engine...
/// handle.set(json!({"v": 2})); // next tick sees the new value
/// ```
#[derive(Debug, Clone)]
pub struct StaticSource {
    id: String,
    root: Arc<RwLock<Value>>,
}

impl StaticSource {
    /// Create a source serving the given value.
    pub fn new(id: impl Into<String>, root: Value) -> Self {
        Self {
            id: id.into(),
            root: Arc::new(RwLock::new(root)),
        }
    }

    /// Replace the served value.
    pub fn set(&self, root: Value) {
        *self.root.write() = root;
    }
}

#[async_trait]
impl MetricSource for StaticSource {
    async fn fetch(&self) -> Result<Value, SourceError> {
        Ok(self.root.read().clone())
    }

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn serves_the_current_value() {
        let source = StaticSource::new("s", json!({"v": 1}));
        assert_eq!(source.fetch().await.unwrap(), json!({"v": 1}));

        source.set(json!({"v": 2}));
        assert_eq!(source.fetch().await.unwrap(), json!({"v": 2}));
    }

    #[tokio::test]
    async fn clones_share_the_value() {
        let source = StaticSource::new("s", json!(null));
        let handle = source.clone();
        handle.set(json!({"updated": true}));

        assert_eq!(source.fetch().await.unwrap(), json!({"updated": true}));
    }
}
