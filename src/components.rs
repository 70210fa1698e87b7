use crate::error::{Result, VizError};
use crate::graph::{DiGraph, Edge, Node, UnGraph, build_graph};
use petgraph::graph::NodeIndex;
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Splits a directed graph into weakly-connected components.
pub trait ComponentFinder {
    fn components(&self, graph: &DiGraph) -> Vec<Vec<NodeIndex>>;
}

/// Union-find over the edge list, ignoring direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnionFindComponents;

impl ComponentFinder for UnionFindComponents {
    fn components(&self, graph: &DiGraph) -> Vec<Vec<NodeIndex>> {
        let mut sets = UnionFind::<usize>::new(graph.node_count());
        for edge in graph.edge_references() {
            sets.union(edge.source().index(), edge.target().index());
        }
        let labels = sets.into_labeling();
        let mut groups: BTreeMap<usize, Vec<NodeIndex>> = BTreeMap::new();
        for idx in graph.node_indices() {
            groups.entry(labels[idx.index()]).or_default().push(idx);
        }
        groups.into_values().collect()
    }
}

/// Returns the weakly-connected component with the most nodes.
///
/// Ties go to the component whose smallest node id sorts first. The result
/// lists nodes by ascending id and edges by ascending `(source, target, id)`;
/// later stable sorts inherit this order.
pub fn largest_weak_component(graph: &DiGraph, finder: &dyn ComponentFinder) -> Result<DiGraph> {
    let mut best: Option<Vec<&Node>> = None;
    let components = finder.components(graph);
    let total = components.len();
    for component in components {
        let mut members: Vec<&Node> = component.iter().map(|&idx| &graph[idx]).collect();
        if members.is_empty() {
            continue;
        }
        members.sort_by(|a, b| a.id.cmp(&b.id));
        let better = match &best {
            None => true,
            Some(current) => {
                members.len() > current.len()
                    || (members.len() == current.len() && members[0].id < current[0].id)
            }
        };
        if better {
            best = Some(members);
        }
    }
    let members = best.ok_or(VizError::EmptyGraph)?;
    debug!(
        components = total,
        largest = members.len(),
        "selected largest weak component"
    );

    let keep: HashSet<&str> = members.iter().map(|node| node.id.as_str()).collect();
    let nodes: Vec<Node> = members.into_iter().cloned().collect();
    let mut edges: Vec<Edge> = graph
        .edge_weights()
        .filter(|edge| keep.contains(edge.source.as_str()) && keep.contains(edge.target.as_str()))
        .cloned()
        .collect();
    edges.sort_by(canonical_edge_order);
    build_graph(nodes, edges)
}

fn canonical_edge_order(a: &Edge, b: &Edge) -> std::cmp::Ordering {
    (&a.source, &a.target, &a.id).cmp(&(&b.source, &b.target, &b.id))
}

/// Collapses a directed graph into an undirected one.
///
/// Every node survives. Edges joining the same unordered pair (parallel or
/// reciprocal) merge into one: the first in `(source, target, id)` order is
/// kept whole, including its direction, and the rest are dropped.
pub fn to_undirected(graph: &DiGraph) -> UnGraph {
    let mut out = UnGraph::with_capacity(graph.node_count(), graph.edge_count());
    for node in graph.node_weights() {
        out.add_node(node.clone());
    }

    let mut ordered: Vec<(NodeIndex, NodeIndex, &Edge)> = graph
        .edge_references()
        .map(|edge| (edge.source(), edge.target(), edge.weight()))
        .collect();
    ordered.sort_by(|a, b| canonical_edge_order(a.2, b.2));

    let mut seen: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
    let mut merged = 0usize;
    for (a, b, edge) in ordered {
        let key = if a <= b { (a, b) } else { (b, a) };
        if !seen.insert(key) {
            merged += 1;
            continue;
        }
        // Indices line up because nodes were copied in order.
        out.add_edge(a, b, edge.clone());
    }
    if merged > 0 {
        debug!(merged, "collapsed duplicate edges");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node_ids;

    fn digraph(nodes: &[&str], edges: &[(&str, &str)]) -> DiGraph {
        let nodes = nodes.iter().map(|id| Node::new(*id)).collect();
        let edges = edges
            .iter()
            .enumerate()
            .map(|(i, (s, t))| Edge::new(format!("e{i}"), *s, *t))
            .collect();
        build_graph(nodes, edges).unwrap()
    }

    #[test]
    fn picks_strictly_largest_component() {
        let graph = digraph(
            &["a", "b", "c", "d", "e", "f"],
            &[("a", "b"), ("d", "e"), ("f", "e"), ("e", "d")],
        );
        let largest = largest_weak_component(&graph, &UnionFindComponents).unwrap();
        assert_eq!(node_ids(&largest), vec!["d", "e", "f"]);
        assert_eq!(largest.edge_count(), 3);
    }

    #[test]
    fn direction_is_ignored_for_reachability() {
        // a -> b <- c is one weak component even though c is unreachable from a.
        let graph = digraph(&["a", "b", "c", "z"], &[("a", "b"), ("c", "b")]);
        let largest = largest_weak_component(&graph, &UnionFindComponents).unwrap();
        assert_eq!(node_ids(&largest), vec!["a", "b", "c"]);
    }

    #[test]
    fn ties_go_to_smallest_identifier() {
        let graph = digraph(&["x", "y", "b", "a"], &[("x", "y"), ("b", "a")]);
        let largest = largest_weak_component(&graph, &UnionFindComponents).unwrap();
        assert_eq!(node_ids(&largest), vec!["a", "b"]);
    }

    #[test]
    fn empty_graph_has_no_component() {
        let graph = digraph(&[], &[]);
        assert!(matches!(
            largest_weak_component(&graph, &UnionFindComponents),
            Err(VizError::EmptyGraph)
        ));
    }

    #[test]
    fn undirected_conversion_merges_reciprocal_edges() {
        let graph = digraph(
            &["a", "b", "c"],
            &[("b", "a"), ("a", "b"), ("b", "c"), ("b", "c")],
        );
        let undirected = to_undirected(&graph);
        assert_eq!(node_ids(&undirected), vec!["a", "b", "c"]);
        assert_eq!(undirected.edge_count(), 2);
        let kept: Vec<(&str, &str)> = undirected
            .edge_weights()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(kept, vec![("a", "b"), ("b", "c")]);
    }

    #[test]
    fn undirected_conversion_keeps_isolated_nodes() {
        let graph = digraph(&["a", "b", "solo"], &[("a", "b")]);
        let undirected = to_undirected(&graph);
        assert_eq!(undirected.node_count(), 3);
        assert_eq!(undirected.edge_count(), 1);
    }
}
