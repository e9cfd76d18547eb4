//! Ranked selection of a regex parent's children for display.

use crate::metric::RegexParent;

/// Pick which of a parent's children are visible this tick.
///
/// `values` and `valid` are indexed by registry position: the child's
/// aggregated value for this tick (if any) and the outcome of its filter.
/// Candidates are the valid children with a non-empty window; a child
/// that produced no value this tick still ranks by its latest retained
/// sample.
///
/// Without ranking (`show_top` and `show_bottom` both zero) every
/// candidate is visible, in registry order. With ranking, candidates are
/// stably sorted descending by value; the first `show_top` form the top
/// group and the trailing `show_bottom` of the remainder form the bottom
/// group, so the two never overlap. Returns registry indices, top group
/// first.
pub fn select_children(
    parent: &RegexParent,
    values: &[Option<f64>],
    valid: &[bool],
) -> Vec<usize> {
    let mut candidates: Vec<usize> = (0..parent.children.len())
        .filter(|&i| valid[i] && !parent.children.at(i).window.is_empty())
        .collect();

    if !parent.is_ranked() {
        return candidates;
    }

    let rank_value = |i: usize| -> f64 {
        values[i]
            .or_else(|| parent.children.at(i).window.latest().map(|s| s.value))
            .unwrap_or(f64::NEG_INFINITY)
    };

    // stable sort keeps registry order for ties
    candidates.sort_by(|&a, &b| {
        rank_value(b)
            .partial_cmp(&rank_value(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let top_len = parent.show_top.min(candidates.len());
    let remainder = candidates.len() - top_len;
    let bottom_len = parent.show_bottom.min(remainder);

    let mut selected: Vec<usize> = candidates[..top_len].to_vec();
    selected.extend_from_slice(&candidates[candidates.len() - bottom_len..]);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::aggregate;
    use crate::metric::MetricDef;
    use jsonwatch_types::{MetricSpec, UpdateBatch};
    use serde_json::json;

    /// Build a parent whose children each carry one sample, in the
    /// given key order, and return it with the per-child tick values.
    fn ranked_parent(
        show_top: i64,
        show_bottom: i64,
        children: &[(&str, f64)],
    ) -> (MetricDef, Vec<Option<f64>>) {
        let mut def = MetricDef::new(
            MetricSpec::new(["queues"], "depth", "queue $1")
                .key_regex("q-(.*)")
                .show_top(show_top)
                .show_bottom(show_bottom),
        )
        .unwrap();

        let mut values = Vec::new();
        for (key, value) in children {
            let mut batch = UpdateBatch::new(1000);
            batch.push("src", json!({"queues": {*key: {"depth": value}}}));
            crate::discover::discover_children(&mut def, &batch);

            let regex = def.regex.as_mut().unwrap();
            let child = regex.children.iter_mut().last().unwrap();
            values.push(aggregate(child, &batch, 100));
        }
        (def, values)
    }

    fn selected_values(def: &MetricDef, indices: &[usize]) -> Vec<f64> {
        let regex = def.regex.as_ref().unwrap();
        indices
            .iter()
            .map(|&i| regex.children.at(i).window.latest().unwrap().value)
            .collect()
    }

    #[test]
    fn top_one_bottom_one_picks_the_extremes() {
        let (def, values) =
            ranked_parent(1, 1, &[("q-a", 10.0), ("q-b", 30.0), ("q-c", 20.0), ("q-d", 5.0)]);
        let picked = select_children(def.regex.as_ref().unwrap(), &values, &[true; 4]);
        assert_eq!(selected_values(&def, &picked), vec![30.0, 5.0]);
    }

    #[test]
    fn bottom_two_picks_the_two_lowest() {
        let (def, values) =
            ranked_parent(0, 2, &[("q-a", 10.0), ("q-b", 30.0), ("q-c", 20.0), ("q-d", 5.0)]);
        let picked = select_children(def.regex.as_ref().unwrap(), &values, &[true; 4]);
        assert_eq!(selected_values(&def, &picked), vec![10.0, 5.0]);
    }

    #[test]
    fn top_two_picks_the_two_highest() {
        let (def, values) =
            ranked_parent(2, 0, &[("q-a", 10.0), ("q-b", 30.0), ("q-c", 20.0), ("q-d", 5.0)]);
        let picked = select_children(def.regex.as_ref().unwrap(), &values, &[true; 4]);
        assert_eq!(selected_values(&def, &picked), vec![30.0, 20.0]);
    }

    #[test]
    fn top_and_bottom_never_overlap() {
        let (def, values) = ranked_parent(2, 2, &[("q-a", 10.0), ("q-b", 30.0), ("q-c", 20.0)]);
        let picked = select_children(def.regex.as_ref().unwrap(), &values, &[true; 3]);
        // top takes 30 and 20; only 10 remains for the bottom group
        assert_eq!(selected_values(&def, &picked), vec![30.0, 20.0, 10.0]);
    }

    #[test]
    fn unranked_parent_shows_every_candidate_in_registry_order() {
        let (def, values) =
            ranked_parent(0, 0, &[("q-a", 10.0), ("q-b", 30.0), ("q-c", 20.0)]);
        let picked = select_children(def.regex.as_ref().unwrap(), &values, &[true; 3]);
        assert_eq!(picked, vec![0, 1, 2]);
    }

    #[test]
    fn invalid_children_are_excluded() {
        let (def, values) =
            ranked_parent(0, 0, &[("q-a", 10.0), ("q-b", 30.0), ("q-c", 20.0)]);
        let picked =
            select_children(def.regex.as_ref().unwrap(), &values, &[true, false, true]);
        assert_eq!(picked, vec![0, 2]);
    }

    #[test]
    fn empty_window_children_are_excluded() {
        let mut def = MetricDef::new(
            MetricSpec::new(["queues"], "depth", "queue $1").key_regex("q-(.*)"),
        )
        .unwrap();

        // discovered but never aggregated: the key matched while the
        // metric field itself was absent
        let mut batch = UpdateBatch::new(1000);
        batch.push("src", json!({"queues": {"q-a": {"other": 1}}}));
        crate::discover::discover_children(&mut def, &batch);

        let picked = select_children(def.regex.as_ref().unwrap(), &[None], &[true]);
        assert!(picked.is_empty());
    }

    #[test]
    fn ties_keep_registry_order() {
        let (def, values) =
            ranked_parent(2, 0, &[("q-a", 10.0), ("q-b", 10.0), ("q-c", 10.0)]);
        let picked = select_children(def.regex.as_ref().unwrap(), &values, &[true; 3]);
        assert_eq!(picked, vec![0, 1]);
    }

    #[test]
    fn missing_tick_value_falls_back_to_the_latest_sample() {
        let (def, mut values) =
            ranked_parent(1, 0, &[("q-a", 10.0), ("q-b", 30.0)]);
        // q-b produced nothing this tick but its retained 30 still ranks
        values[1] = None;
        let picked = select_children(def.regex.as_ref().unwrap(), &values, &[true; 2]);
        assert_eq!(picked, vec![1]);
    }

    #[test]
    fn counts_larger_than_the_registry_select_everything() {
        let (def, values) = ranked_parent(10, 10, &[("q-a", 10.0), ("q-b", 30.0)]);
        let picked = select_children(def.regex.as_ref().unwrap(), &values, &[true; 2]);
        assert_eq!(selected_values(&def, &picked), vec![30.0, 10.0]);
    }
}
