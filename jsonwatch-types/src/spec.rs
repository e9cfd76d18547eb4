//! Raw metric descriptors, as declared by callers or in a config file.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

/// Predicate over the raw JSON nodes (one per responding source) at a
/// metric's path.
///
/// Returning `false` excludes the metric from the current tick's visible
/// output; its retained window is untouched.
pub type FilterFn = Arc<dyn Fn(&[&Value]) -> bool + Send + Sync>;

/// A metric path: either a single key or a key sequence.
///
/// Config files may write `path = "stats"` or `path = ["stats", "http"]`;
/// both normalize to a sequence.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PathSpec {
    /// A single key, shorthand for a one-element sequence.
    Single(String),
    /// An ordered key sequence.
    Sequence(Vec<String>),
}

impl PathSpec {
    /// Normalize into a key sequence.
    pub fn into_segments(self) -> Vec<String> {
        match self {
            PathSpec::Single(key) => vec![key],
            PathSpec::Sequence(keys) => keys,
        }
    }
}

impl Default for PathSpec {
    fn default() -> Self {
        PathSpec::Sequence(Vec::new())
    }
}

impl<const N: usize> From<[&str; N]> for PathSpec {
    fn from(parts: [&str; N]) -> Self {
        PathSpec::Sequence(parts.iter().map(|p| p.to_string()).collect())
    }
}

impl From<&str> for PathSpec {
    fn from(key: &str) -> Self {
        PathSpec::Single(key.to_string())
    }
}

/// One user-declared metric to track, before validation.
///
/// A spec describes where a value lives inside each source's JSON snapshot
/// and how observations from multiple sources combine into one series. The
/// engine validates every spec at graph registration; a malformed spec is
/// rejected synchronously and never reaches tick time.
///
/// # Example
///
/// ```rust
/// use jsonwatch_types::MetricSpec;
///
/// // Track the per-queue message rate, discovered dynamically, showing
/// // only the three busiest queues.
/// let spec = MetricSpec::new(["queues"], "rate", "queue $1")
///     .key_regex("worker-(.*)")
///     .show_top(3);
/// ```
#[derive(Clone, Deserialize, Default)]
#[serde(default, rename_all = "snake_case")]
pub struct MetricSpec {
    /// Key sequence locating the JSON node holding the metric.
    pub path: PathSpec,
    /// Field name read off the node to obtain the value.
    pub metric: String,
    /// Display name. For regex specs this is a template; `$1`, `$2`, ...
    /// are replaced with the corresponding capture groups of the matched
    /// key.
    pub label: String,
    /// How values observed across sources combine in one tick: `"sum"`
    /// (default) or `"avg"`.
    pub operation: Option<String>,
    /// Treat a combined value of exactly zero as absent.
    pub ignore_zeros: bool,
    /// Marks this spec as a parent: it has no series of its own and
    /// instead discovers one child metric per JSON key matching the
    /// pattern.
    pub key_regex: Option<String>,
    /// Number of highest-valued children to surface (parents only).
    pub show_top: Option<i64>,
    /// Number of lowest-valued children to surface (parents only).
    pub show_bottom: Option<i64>,
    /// Also emit one series per source with that source's own value.
    pub show_individual: bool,
    /// Optional visibility predicate; not representable in config files,
    /// set programmatically via [`MetricSpec::filter`].
    #[serde(skip)]
    pub filter: Option<FilterFn>,
}

impl MetricSpec {
    /// Create a spec with the required fields.
    pub fn new(path: impl Into<PathSpec>, metric: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            metric: metric.into(),
            label: label.into(),
            ..Default::default()
        }
    }

    /// Set the aggregation operation (`"sum"` or `"avg"`).
    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Treat a combined value of exactly zero as absent.
    pub fn ignore_zeros(mut self, ignore_zeros: bool) -> Self {
        self.ignore_zeros = ignore_zeros;
        self
    }

    /// Turn this spec into a discovery parent matching keys against the
    /// given pattern.
    pub fn key_regex(mut self, pattern: impl Into<String>) -> Self {
        self.key_regex = Some(pattern.into());
        self
    }

    /// Surface only the `count` highest-valued children.
    pub fn show_top(mut self, count: i64) -> Self {
        self.show_top = Some(count);
        self
    }

    /// Surface only the `count` lowest-valued children.
    pub fn show_bottom(mut self, count: i64) -> Self {
        self.show_bottom = Some(count);
        self
    }

    /// Also emit one series per contributing source.
    pub fn show_individual(mut self, show_individual: bool) -> Self {
        self.show_individual = show_individual;
        self
    }

    /// Set a visibility predicate over the per-source nodes at this
    /// metric's path.
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&[&Value]) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }
}

impl fmt::Debug for MetricSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricSpec")
            .field("path", &self.path)
            .field("metric", &self.metric)
            .field("label", &self.label)
            .field("operation", &self.operation)
            .field("ignore_zeros", &self.ignore_zeros)
            .field("key_regex", &self.key_regex)
            .field("show_top", &self.show_top)
            .field("show_bottom", &self.show_bottom)
            .field("show_individual", &self.show_individual)
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
