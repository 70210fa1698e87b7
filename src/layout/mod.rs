mod forceatlas2;
pub mod label_placement;
mod quadtree;

pub use forceatlas2::ForceAtlas2;
pub use label_placement::{LabelAdjuster, LabelBox, RepelAdjuster};

use crate::error::{Result, VizError};
use crate::filter::filter_graph;
use crate::graph::UnGraph;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Node id to layout coordinate, in data space.
pub type Positions = BTreeMap<String, Point>;

/// Computes 2D coordinates for every node of an undirected graph.
pub trait LayoutEngine {
    fn layout(&self, graph: &UnGraph) -> Result<Positions>;
}

/// Runs `engine` on `graph`, first cutting it down to the `threshold` nodes
/// ranked highest by `rank_by` when it is larger than that.
///
/// Returns the graph the layout was computed on together with the positions;
/// callers must draw their final node set from that graph.
pub fn layout_positions(
    graph: &UnGraph,
    engine: &dyn LayoutEngine,
    rank_by: &str,
    threshold: usize,
) -> Result<(UnGraph, Positions)> {
    let graph = if graph.node_count() > threshold {
        info!(
            nodes = graph.node_count(),
            threshold, "component too large, laying out the top nodes only"
        );
        filter_graph(graph, rank_by, threshold)?
    } else {
        graph.clone()
    };
    let positions = engine.layout(&graph)?;
    info!(nodes = positions.len(), "extracted the positions");
    Ok((graph, positions))
}

/// Looks up the position of every node in `graph`.
pub fn restrict(positions: &Positions, graph: &UnGraph) -> Result<Positions> {
    graph
        .node_weights()
        .map(|node| {
            positions
                .get(&node.id)
                .map(|point| (node.id.clone(), *point))
                .ok_or_else(|| VizError::MissingPosition(node.id.clone()))
        })
        .collect()
}
