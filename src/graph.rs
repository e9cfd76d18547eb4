//! Graphs: display units owning an ordered set of metrics.

use serde_json::Value;
use tracing::debug;

use jsonwatch_types::{MetricSpec, UpdateBatch};

use crate::collect::{aggregate, passes_filter};
use crate::discover::discover_children;
use crate::metric::{ConfigError, MetricDef};
use crate::render::Series;
use crate::select::select_children;

/// Default window bound when a graph does not set one.
pub const DEFAULT_TOTAL_POINTS: usize = 100;

/// One display unit: a render target, opaque render options, and an
/// ordered collection of metrics whose windows share `total_points`.
#[derive(Debug, Clone)]
pub struct Graph {
    /// Identifier of the surface the renderer draws on.
    pub target: String,
    /// Renderer options, passed through untouched.
    pub options: Value,
    /// Maximum retained samples per window.
    pub total_points: usize,
    metrics: Vec<MetricDef>,
}

impl Graph {
    /// Validate every descriptor and build the graph.
    ///
    /// Registration is atomic: if any descriptor is invalid, the whole
    /// graph is rejected and nothing is registered.
    pub fn new(
        target: impl Into<String>,
        options: Value,
        specs: Vec<MetricSpec>,
        total_points: usize,
    ) -> Result<Self, ConfigError> {
        let target = target.into();
        if specs.is_empty() {
            return Err(ConfigError::NoMetrics(target));
        }

        let metrics = specs
            .into_iter()
            .map(MetricDef::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            target,
            options,
            total_points,
            metrics,
        })
    }

    /// The graph's metrics, in declaration order.
    pub fn metrics(&self) -> &[MetricDef] {
        &self.metrics
    }

    /// Run one tick's pipeline over this graph.
    ///
    /// Every metric aggregates (advancing its window) whether or not its
    /// filter passes this tick; the filter gates only visibility. Regex
    /// parents discover, aggregate, and rank their children. Returns the
    /// visible series in order: aggregate series first, then any
    /// per-source breakdown series.
    pub fn apply(&mut self, batch: &UpdateBatch) -> Vec<Series> {
        let total_points = self.total_points;
        let mut mains = Vec::new();
        let mut individuals = Vec::new();

        for metric in &mut self.metrics {
            if metric.regex.is_none() {
                aggregate(metric, batch, total_points);
                if passes_filter(metric, batch) && !metric.window.is_empty() {
                    emit(metric, &mut mains, &mut individuals);
                }
                continue;
            }

            discover_children(metric, batch);

            let mut values = Vec::new();
            if let Some(regex) = metric.regex.as_mut() {
                for child in regex.children.iter_mut() {
                    values.push(aggregate(child, batch, total_points));
                }
            }

            if let Some(regex) = metric.regex.as_ref() {
                let valid: Vec<bool> =
                    regex.children.iter().map(|c| passes_filter(c, batch)).collect();
                for index in select_children(regex, &values, &valid) {
                    emit(regex.children.at(index), &mut mains, &mut individuals);
                }
            }
        }

        debug!(
            graph = %self.target,
            series = mains.len() + individuals.len(),
            "graph tick applied"
        );

        mains.extend(individuals);
        mains
    }
}

fn emit(metric: &MetricDef, mains: &mut Vec<Series>, individuals: &mut Vec<Series>) {
    mains.push(Series {
        label: metric.display_label().to_string(),
        samples: metric.window.samples().to_vec(),
    });
    for (source_id, window) in &metric.individual {
        individuals.push(Series {
            label: format!("{} ({source_id})", metric.display_label()),
            samples: window.samples().to_vec(),
        });
    }
}
