//! Validated metric definitions.
//!
//! [`MetricDef::new`] is the sole validation gate for the pipeline: every
//! descriptor passes through it at graph registration, and nothing
//! re-validates at tick time.

use regex::Regex;
use thiserror::Error;

use jsonwatch_types::{FilterFn, MetricSpec, SeriesWindow};

/// Errors raised while registering a graph or its metrics.
///
/// Configuration errors are fatal and synchronous: they surface at the
/// moment of registration, never during a tick.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The descriptor has no path.
    #[error("metric '{0}' has an empty path")]
    EmptyPath(String),

    /// The descriptor has no metric field name.
    #[error("metric '{0}' is missing the metric field name")]
    MissingMetric(String),

    /// The descriptor names an unknown aggregation operation.
    #[error("invalid metric operation '{0}', expected \"sum\" or \"avg\"")]
    InvalidOperation(String),

    /// The key regex does not compile.
    #[error("invalid key regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A graph was registered with no metrics.
    #[error("graph '{0}' has no metric definitions")]
    NoMetrics(String),
}

/// How values observed across multiple sources combine in one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operation {
    /// Sum of every contributing source's value.
    #[default]
    Sum,
    /// Sum divided by the number of sources that actually produced a
    /// value. A source that errored or lacks the metric does not dilute
    /// the average.
    Avg,
}

impl Operation {
    fn parse(raw: Option<&str>) -> Result<Self, ConfigError> {
        match raw {
            None | Some("sum") => Ok(Operation::Sum),
            Some("avg") => Ok(Operation::Avg),
            Some(other) => Err(ConfigError::InvalidOperation(other.to_string())),
        }
    }
}

/// A validated metric, ready for collection.
///
/// Plain metrics own one aggregate series (and optionally one series per
/// source). Regex parents own no series of their own; they carry a
/// [`RegexParent`] that discovers and holds child metrics instead.
#[derive(Clone)]
pub struct MetricDef {
    /// Key sequence locating the JSON node inside each snapshot.
    pub path: Vec<String>,
    /// Field name read off the node.
    pub metric: String,
    /// Display label. `None` for regex parents, which have no series of
    /// their own.
    pub label: Option<String>,
    /// Cross-source aggregation operator.
    pub operation: Operation,
    /// Treat a combined value of exactly zero as absent.
    pub ignore_zeros: bool,
    /// Also emit one series per contributing source.
    pub show_individual: bool,
    /// Optional per-tick visibility predicate.
    pub filter: Option<FilterFn>,
    /// The aggregate sample history.
    pub window: SeriesWindow,
    /// Per-source sample histories, in first-contribution order. Only
    /// populated when `show_individual` is set.
    pub individual: Vec<(String, SeriesWindow)>,
    /// Present when this metric is a discovery parent.
    pub regex: Option<RegexParent>,
}

/// Discovery state of a regex parent metric.
#[derive(Debug, Clone)]
pub struct RegexParent {
    /// Compiled key pattern.
    pub pattern: Regex,
    /// Label template; `$1`, `$2`, ... are replaced with capture groups
    /// when a child is materialized.
    pub label_template: String,
    /// Number of highest-valued children to surface, 0 for no limit.
    pub show_top: usize,
    /// Number of lowest-valued children to surface, 0 for none.
    pub show_bottom: usize,
    /// Discovered children.
    pub children: ChildRegistry,
}

impl RegexParent {
    /// Whether selection is ranked (either top or bottom count is set).
    pub fn is_ranked(&self) -> bool {
        self.show_top > 0 || self.show_bottom > 0
    }
}

/// Insertion-ordered registry of discovered child metrics.
///
/// Children are keyed by `"<matched key>.<metric name>"`. The key is
/// stable across ticks: the same physical key never produces two distinct
/// children, and registry order is the tie-breaker for ranked selection.
#[derive(Debug, Clone, Default)]
pub struct ChildRegistry {
    entries: Vec<(String, MetricDef)>,
}

impl ChildRegistry {
    /// Returns true if a child is registered under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Register a child under `key`. Callers check [`contains`] first;
    /// re-discovery never replaces an existing child.
    pub fn insert(&mut self, key: impl Into<String>, child: MetricDef) {
        self.entries.push((key.into(), child));
    }

    /// The child registered under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&MetricDef> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, c)| c)
    }

    /// Children in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &MetricDef> {
        self.entries.iter().map(|(_, c)| c)
    }

    /// Mutable children in registration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MetricDef> {
        self.entries.iter_mut().map(|(_, c)| c)
    }

    /// The child at registration index `index`.
    pub fn at(&self, index: usize) -> &MetricDef {
        &self.entries[index].1
    }

    /// Number of registered children.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been discovered yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MetricDef {
    /// Validate a raw descriptor into a metric definition.
    ///
    /// Fails when the path or metric name is missing, the operation is
    /// not `sum`/`avg`, or the key regex does not compile.
    pub fn new(spec: MetricSpec) -> Result<Self, ConfigError> {
        let path = spec.path.into_segments();
        if path.is_empty() || path.iter().any(|segment| segment.is_empty()) {
            return Err(ConfigError::EmptyPath(spec.label));
        }
        if spec.metric.is_empty() {
            return Err(ConfigError::MissingMetric(spec.label));
        }

        let operation = Operation::parse(spec.operation.as_deref())?;

        let (label, regex) = match spec.key_regex {
            Some(pattern_str) => {
                let pattern =
                    Regex::new(&pattern_str).map_err(|source| ConfigError::InvalidRegex {
                        pattern: pattern_str,
                        source,
                    })?;
                // the parent has no display label of its own; the raw
                // label becomes the child label template
                let parent = RegexParent {
                    pattern,
                    label_template: spec.label,
                    show_top: spec.show_top.map(|n| n.max(0) as usize).unwrap_or(0),
                    show_bottom: spec.show_bottom.map(|n| n.max(0) as usize).unwrap_or(0),
                    children: ChildRegistry::default(),
                };
                (None, Some(parent))
            }
            None => {
                let label = if spec.label.is_empty() {
                    spec.metric.clone()
                } else {
                    spec.label
                };
                (Some(label), None)
            }
        };

        Ok(MetricDef {
            path,
            metric: spec.metric,
            label,
            operation,
            ignore_zeros: spec.ignore_zeros,
            show_individual: spec.show_individual,
            filter: spec.filter,
            window: SeriesWindow::new(),
            individual: Vec::new(),
            regex,
        })
    }

    /// The label shown for this metric's aggregate series.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.metric)
    }
}

impl std::fmt::Debug for MetricDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricDef")
            .field("path", &self.path)
            .field("metric", &self.metric)
            .field("label", &self.label)
            .field("operation", &self.operation)
            .field("ignore_zeros", &self.ignore_zeros)
            .field("show_individual", &self.show_individual)
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .field("window", &self.window)
            .field("individual", &self.individual)
            .field("regex", &self.regex)
            .finish()
    }
}
