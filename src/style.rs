//! Per-node and per-edge visual attributes.
//!
//! Every mapping returns values in graph order: node vectors follow
//! `node_weights()`, edge vectors follow `edge_weights()`.

use crate::config::{NULL_COLOR_KEY, PipelineConfig};
use crate::error::{Result, VizError};
use crate::graph::AttrGraph;
use petgraph::EdgeType;
use std::collections::{BTreeMap, HashMap};

/// Colors, sizes and labels for one rendered subgraph.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualAttributes {
    pub node_ids: Vec<String>,
    pub node_colors: Vec<String>,
    pub node_sizes: Vec<f64>,
    pub node_labels: Vec<String>,
    pub edge_colors: Vec<String>,
}

impl VisualAttributes {
    pub fn build<Ty: EdgeType>(graph: &AttrGraph<Ty>, config: &PipelineConfig) -> Result<Self> {
        let node_colors = node_colors(graph, &config.color_field, &config.colormap)?;
        let node_sizes = node_sizes(graph, &config.size_field, config.min_size, config.max_size)?;
        let node_labels = node_labels(graph, &config.label_field)?;
        let edge_colors = edge_colors(graph, &node_colors)?;
        Ok(Self {
            node_ids: graph.node_weights().map(|node| node.id.clone()).collect(),
            node_colors,
            node_sizes,
            node_labels,
            edge_colors,
        })
    }
}

/// `colormap[category]`, falling back to `colormap["null"]` when the node has
/// no category or an unlisted one.
pub fn node_colors<Ty: EdgeType>(
    graph: &AttrGraph<Ty>,
    color_by: &str,
    colormap: &BTreeMap<String, String>,
) -> Result<Vec<String>> {
    let fallback = colormap.get(NULL_COLOR_KEY).ok_or(VizError::MissingNullColor)?;
    Ok(graph
        .node_weights()
        .map(|node| {
            node.attr(color_by)
                .and_then(|value| colormap.get(&value.to_string()))
                .unwrap_or(fallback)
                .clone()
        })
        .collect())
}

/// Linear rescale of a numeric attribute from its observed range onto
/// `[min_size, max_size]`. When every node has the same value they all get
/// `min_size`.
pub fn node_sizes<Ty: EdgeType>(
    graph: &AttrGraph<Ty>,
    size_field: &str,
    min_size: f64,
    max_size: f64,
) -> Result<Vec<f64>> {
    let values: Vec<f64> = graph
        .node_weights()
        .map(|node| node.numeric_attr(size_field))
        .collect::<Result<_>>()?;
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = hi - lo;
    Ok(values
        .into_iter()
        .map(|value| {
            if span > 0.0 {
                // Written as a blend so both ends come out exact.
                let t = (value - lo) / span;
                min_size * (1.0 - t) + max_size * t
            } else {
                min_size
            }
        })
        .collect())
}

pub fn node_labels<Ty: EdgeType>(graph: &AttrGraph<Ty>, label_field: &str) -> Result<Vec<String>> {
    graph
        .node_weights()
        .map(|node| Ok(node.require_attr(label_field)?.to_string()))
        .collect()
}

/// Each edge takes the color of the node it originally came from.
pub fn edge_colors<Ty: EdgeType>(graph: &AttrGraph<Ty>, node_colors: &[String]) -> Result<Vec<String>> {
    let by_id: HashMap<&str, &String> = graph
        .node_weights()
        .map(|node| node.id.as_str())
        .zip(node_colors)
        .collect();
    graph
        .edge_weights()
        .map(|edge| {
            by_id
                .get(edge.source.as_str())
                .map(|color| (*color).clone())
                .ok_or_else(|| VizError::UnknownNode {
                    edge: edge.id.clone(),
                    node: edge.source.clone(),
                })
        })
        .collect()
}
