//! Dynamic discovery of child metrics under regex parents.

use regex::Captures;

use jsonwatch_types::{resolve_node, SeriesWindow, UpdateBatch};

use crate::metric::MetricDef;

/// Scan a batch for JSON keys matching a parent's pattern and materialize
/// one child metric per distinct matched key.
///
/// Children are registered under `"<matched key>.<metric name>"`; a key
/// seen again in a later tick neither creates a duplicate nor resets the
/// existing child's window. Does nothing for non-regex metrics.
pub fn discover_children(parent: &mut MetricDef, batch: &UpdateBatch) {
    let Some(regex) = parent.regex.as_mut() else {
        return;
    };

    for snapshot in &batch.snapshots {
        let Some(node) = resolve_node(&parent.path, &snapshot.root) else {
            continue;
        };
        let Some(object) = node.as_object() else {
            continue;
        };

        for key in object.keys() {
            let Some(captures) = regex.pattern.captures(key) else {
                continue;
            };

            let child_key = format!("{key}.{}", parent.metric);
            if regex.children.contains(&child_key) {
                continue;
            }

            let mut child_path = parent.path.clone();
            child_path.push(key.clone());

            let child = MetricDef {
                path: child_path,
                metric: parent.metric.clone(),
                label: Some(render_label(&regex.label_template, &captures)),
                operation: parent.operation,
                ignore_zeros: parent.ignore_zeros,
                show_individual: parent.show_individual,
                filter: parent.filter.clone(),
                window: SeriesWindow::new(),
                individual: Vec::new(),
                regex: None,
            };
            regex.children.insert(child_key, child);
        }
    }
}

/// Substitute capture-group placeholders into a label template.
///
/// Every `$1`..`$n` with a corresponding matched group is replaced by the
/// matched substring. A placeholder is the longest digit run after the
/// `$`, so `$12` is one token and is never treated as `$1` followed by
/// `2`. `$0` and placeholders beyond the group count are left untouched.
fn render_label(template: &str, captures: &Captures) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let digits = after.len() - after.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            out.push('$');
            rest = after;
            continue;
        }
        let token = &after[..digits];
        rest = &after[digits..];
        let matched = token
            .parse::<usize>()
            .ok()
            .filter(|&group| group > 0)
            .and_then(|group| captures.get(group));
        match matched {
            Some(group) => out.push_str(group.as_str()),
            None => {
                out.push('$');
                out.push_str(token);
            }
        }
    }
    out.push_str(rest);
    out
}
