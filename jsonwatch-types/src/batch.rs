//! Per-tick fetch results and path resolution into raw JSON.

use serde_json::Value;

/// The JSON value returned by one source during one tick.
#[derive(Debug, Clone)]
pub struct SourceSnapshot {
    /// Identifier of the source, typically its URL. Used to label
    /// per-source series.
    pub source_id: String,
    /// The parsed response body.
    pub root: Value,
}

/// One polling tick's result: a timestamp and the snapshot of every source
/// that responded.
///
/// Sources that failed to respond are simply absent; a batch never contains
/// null entries.
#[derive(Debug, Clone)]
pub struct UpdateBatch {
    /// Time the batch was gathered, in milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    /// Snapshots in source order.
    pub snapshots: Vec<SourceSnapshot>,
}

impl UpdateBatch {
    /// Create an empty batch for the given timestamp.
    pub fn new(timestamp_ms: i64) -> Self {
        Self {
            timestamp_ms,
            snapshots: Vec::new(),
        }
    }

    /// Append one source's snapshot.
    pub fn push(&mut self, source_id: impl Into<String>, root: Value) {
        self.snapshots.push(SourceSnapshot {
            source_id: source_id.into(),
            root,
        });
    }

    /// Returns true if no source responded this tick.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Walk `root` by consuming `path` head-to-tail, descending into the object
/// keyed by each element.
///
/// Returns `None` if the path is empty, an intermediate key is missing, a
/// value along the path is not an object, or the resolved node is null.
/// Absence is a normal outcome under partial source failure, never an
/// error.
pub fn resolve_node<'a>(path: &[String], root: &'a Value) -> Option<&'a Value> {
    let (head, rest) = path.split_first()?;
    let node = root.as_object()?.get(head)?;
    if node.is_null() {
        return None;
    }
    if rest.is_empty() {
        Some(node)
    } else {
        resolve_node(rest, node)
    }
}

/// Resolve the node at `path`, then read the numeric field `metric` off it.
///
/// Returns `None` under the same conditions as [`resolve_node`], and also
/// when the field is missing or not a number.
pub fn resolve_value(path: &[String], metric: &str, root: &Value) -> Option<f64> {
    resolve_node(path, root)?.as_object()?.get(metric)?.as_f64()
}
