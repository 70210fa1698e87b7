use crate::style::VisualAttributes;
use std::cmp::Ordering;

/// Picks the `count` largest nodes and returns their `(id, label)` pairs,
/// largest first. The sort is stable, so equal sizes keep node order.
pub fn select_labels(visuals: &VisualAttributes, count: usize) -> Vec<(String, String)> {
    let mut order: Vec<usize> = (0..visuals.node_ids.len()).collect();
    order.sort_by(|&a, &b| {
        visuals.node_sizes[b]
            .partial_cmp(&visuals.node_sizes[a])
            .unwrap_or(Ordering::Equal)
    });
    order
        .into_iter()
        .take(count)
        .map(|idx| (visuals.node_ids[idx].clone(), visuals.node_labels[idx].clone()))
        .collect()
}
