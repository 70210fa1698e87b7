//! Load-to-scene orchestration. Everything here is pure with respect to the
//! configuration it is handed; the CLI only adds file I/O around it.

use crate::components::{ComponentFinder, largest_weak_component, to_undirected};
use crate::config::Config;
use crate::error::Result;
use crate::filter::filter_graph;
use crate::graph::{DiGraph, UnGraph};
use crate::labels::select_labels;
use crate::layout::{LayoutEngine, Positions, layout_positions, restrict};
use crate::style::VisualAttributes;
use tracing::{debug, info};

/// What the renderer draws: the filtered subgraph, its node positions, the
/// visual attributes and the labels chosen for display.
#[derive(Debug, Clone)]
pub struct Scene {
    pub graph: UnGraph,
    /// Positions of the nodes of `graph` only.
    pub positions: Positions,
    pub visuals: VisualAttributes,
    /// `(node id, label)` pairs, largest node first.
    pub labels: Vec<(String, String)>,
    /// Number of nodes the layout was computed on.
    pub layout_nodes: usize,
}

/// The pluggable pieces of the pipeline.
pub struct Collaborators<'a> {
    pub components: &'a dyn ComponentFinder,
    pub layout: &'a dyn LayoutEngine,
}

pub fn build_scene(graph: &DiGraph, config: &Config, with: &Collaborators<'_>) -> Result<Scene> {
    let pipeline = &config.pipeline;

    let component = largest_weak_component(graph, with.components)?;
    info!(
        nodes = component.node_count(),
        edges = component.edge_count(),
        "selected the largest weakly connected component"
    );
    let undirected = to_undirected(&component);
    debug!(edges = undirected.edge_count(), "converted to undirected");

    let (laid_out, positions) = layout_positions(
        &undirected,
        with.layout,
        &pipeline.filter_field,
        pipeline.layout_threshold,
    )?;

    let graph = filter_graph(&laid_out, &pipeline.filter_field, pipeline.top_k)?;
    info!(nodes = graph.node_count(), top_k = pipeline.top_k, "filtered the graph");
    let positions = restrict(&positions, &graph)?;

    let visuals = VisualAttributes::build(&graph, pipeline)?;
    let labels = select_labels(&visuals, pipeline.num_labels);
    debug!(labels = labels.len(), "selected labels");

    Ok(Scene {
        graph,
        positions,
        visuals,
        labels,
        layout_nodes: laid_out.node_count(),
    })
}
