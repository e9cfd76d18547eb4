//! Cross-source aggregation of one metric over one batch.

use jsonwatch_types::{resolve_node, resolve_value, Sample, SeriesWindow, UpdateBatch};

use crate::metric::{MetricDef, Operation};

/// Aggregate one metric over one batch, advancing its window.
///
/// Every snapshot in the batch is probed at the metric's path; sources
/// where resolution yields nothing are skipped. The found values combine
/// per the metric's operation — for `avg` the divisor is the number of
/// sources that actually produced a value. Returns the combined value, or
/// `None` when no source contributed (or the combined value was zero with
/// `ignore_zeros` set), in which case the window does not advance.
///
/// When `show_individual` is set, each contributing source's own value is
/// also appended to that source's window under the same bound.
pub fn aggregate(metric: &mut MetricDef, batch: &UpdateBatch, max_points: usize) -> Option<f64> {
    let mut sum = 0.0;
    let mut contributors: Vec<(&str, f64)> = Vec::new();

    for snapshot in &batch.snapshots {
        if let Some(value) = resolve_value(&metric.path, &metric.metric, &snapshot.root) {
            sum += value;
            contributors.push((&snapshot.source_id, value));
        }
    }

    if contributors.is_empty() {
        return None;
    }

    let combined = match metric.operation {
        Operation::Sum => sum,
        Operation::Avg => sum / contributors.len() as f64,
    };

    if metric.ignore_zeros && combined == 0.0 {
        return None;
    }

    metric
        .window
        .push(Sample::new(batch.timestamp_ms, combined), max_points);

    if metric.show_individual {
        for (source_id, value) in contributors {
            let index = match metric
                .individual
                .iter()
                .position(|(id, _)| id == source_id)
            {
                Some(index) => index,
                None => {
                    metric
                        .individual
                        .push((source_id.to_string(), SeriesWindow::new()));
                    metric.individual.len() - 1
                }
            };
            metric.individual[index]
                .1
                .push(Sample::new(batch.timestamp_ms, value), max_points);
        }
    }

    Some(combined)
}

/// Evaluate a metric's visibility filter against one batch.
///
/// The filter receives the resolved path-node from every source that has
/// one. Metrics without a filter are always valid. Filtering gates
/// visibility only; it never touches the retained window.
pub fn passes_filter(metric: &MetricDef, batch: &UpdateBatch) -> bool {
    let Some(filter) = &metric.filter else {
        return true;
    };

    let nodes: Vec<&serde_json::Value> = batch
        .snapshots
        .iter()
        .filter_map(|snapshot| resolve_node(&metric.path, &snapshot.root))
        .collect();

    filter(&nodes)
}
