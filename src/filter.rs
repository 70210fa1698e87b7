use crate::error::Result;
use crate::graph::{AttrGraph, induced_subgraph};
use petgraph::EdgeType;
use std::cmp::Ordering;
use tracing::debug;

/// Ranks nodes by a numeric attribute, highest first. The sort is stable, so
/// nodes with equal values keep graph order.
pub fn rank_nodes<Ty: EdgeType>(graph: &AttrGraph<Ty>, filter_by: &str) -> Result<Vec<String>> {
    let mut scored: Vec<(f64, &str)> = graph
        .node_weights()
        .map(|node| Ok((node.numeric_attr(filter_by)?, node.id.as_str())))
        .collect::<Result<_>>()?;
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    Ok(scored.into_iter().map(|(_, id)| id.to_string()).collect())
}

/// Induced subgraph on the `top` nodes with the highest `filter_by` value.
///
/// Every node must carry a numeric `filter_by` attribute, even when `top`
/// covers the whole graph. The input is left untouched.
pub fn filter_graph<Ty: EdgeType>(
    graph: &AttrGraph<Ty>,
    filter_by: &str,
    top: usize,
) -> Result<AttrGraph<Ty>> {
    let ranked = rank_nodes(graph, filter_by)?;
    if top >= ranked.len() {
        return Ok(graph.clone());
    }
    let mut keep = ranked;
    keep.truncate(top);
    // Keep graph order in the result so that later stable sorts break ties
    // the same way this one did.
    let order: std::collections::HashSet<&str> = keep.iter().map(String::as_str).collect();
    let keep: Vec<String> = graph
        .node_weights()
        .filter(|node| order.contains(node.id.as_str()))
        .map(|node| node.id.clone())
        .collect();
    let filtered = induced_subgraph(graph, &keep);
    debug!(
        filter_by,
        top,
        nodes = filtered.node_count(),
        edges = filtered.edge_count(),
        "filtered graph"
    );
    Ok(filtered)
}
