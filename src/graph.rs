use crate::error::{Result, VizError};
use petgraph::graph::{Graph, NodeIndex};
use petgraph::{Directed, EdgeType, Undirected};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A typed GEXF attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl AttrValue {
    /// Numeric view used for ranking and sizing. Strings that parse as a
    /// number count as numeric since GEXF files often omit attribute types.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(v) => Some(*v as f64),
            AttrValue::Float(v) if v.is_finite() => Some(*v),
            AttrValue::Float(_) => None,
            AttrValue::Str(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            AttrValue::Bool(_) => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => f.write_str(s),
            AttrValue::Int(v) => write!(f, "{v}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub attributes: BTreeMap<String, AttrValue>,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn require_attr(&self, name: &str) -> Result<&AttrValue> {
        self.attr(name).ok_or_else(|| VizError::MissingAttribute {
            node: self.id.clone(),
            attribute: name.to_string(),
        })
    }

    pub fn numeric_attr(&self, name: &str) -> Result<f64> {
        let value = self.require_attr(name)?;
        value.as_f64().ok_or_else(|| VizError::NonNumericAttribute {
            node: self.id.clone(),
            attribute: name.to_string(),
            value: value.to_string(),
        })
    }
}

/// An edge keeps the ids of its original directed endpoints, so the
/// direction is still known after the graph has been made undirected.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub attributes: BTreeMap<String, AttrValue>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            weight: 1.0,
            attributes: BTreeMap::new(),
        }
    }
}

pub type AttrGraph<Ty> = Graph<Node, Edge, Ty>;
pub type DiGraph = AttrGraph<Directed>;
pub type UnGraph = AttrGraph<Undirected>;

/// Maps node ids to their index in `graph`.
pub fn index_by_id<Ty: EdgeType>(graph: &AttrGraph<Ty>) -> HashMap<String, NodeIndex> {
    graph
        .node_indices()
        .map(|idx| (graph[idx].id.clone(), idx))
        .collect()
}

/// Builds a graph from node and edge lists, checking id uniqueness and that
/// every edge endpoint exists.
pub fn build_graph<Ty: EdgeType>(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<AttrGraph<Ty>> {
    let mut graph = AttrGraph::<Ty>::with_capacity(nodes.len(), edges.len());
    let mut index: HashMap<String, NodeIndex> = HashMap::with_capacity(nodes.len());
    for node in nodes {
        if index.contains_key(&node.id) {
            return Err(VizError::DuplicateNode(node.id));
        }
        let id = node.id.clone();
        let idx = graph.add_node(node);
        index.insert(id, idx);
    }
    for edge in edges {
        let lookup = |id: &str| {
            index.get(id).copied().ok_or_else(|| VizError::UnknownNode {
                edge: edge.id.clone(),
                node: id.to_string(),
            })
        };
        let from = lookup(&edge.source)?;
        let to = lookup(&edge.target)?;
        graph.add_edge(from, to, edge);
    }
    Ok(graph)
}

/// Induced subgraph on `keep`, with nodes in the order given and edges in
/// the source graph's edge order. Ids not present in `graph` are skipped.
pub fn induced_subgraph<Ty: EdgeType>(graph: &AttrGraph<Ty>, keep: &[String]) -> AttrGraph<Ty> {
    let index = index_by_id(graph);
    let mut out = AttrGraph::<Ty>::with_capacity(keep.len(), 0);
    let mut remap: HashMap<NodeIndex, NodeIndex> = HashMap::with_capacity(keep.len());
    for id in keep {
        if let Some(&old) = index.get(id) {
            if remap.contains_key(&old) {
                continue;
            }
            remap.insert(old, out.add_node(graph[old].clone()));
        }
    }
    for edge in graph.edge_indices() {
        let Some((a, b)) = graph.edge_endpoints(edge) else {
            continue;
        };
        if let (Some(&na), Some(&nb)) = (remap.get(&a), remap.get(&b)) {
            out.add_edge(na, nb, graph[edge].clone());
        }
    }
    out
}

/// Node ids in graph order.
pub fn node_ids<Ty: EdgeType>(graph: &AttrGraph<Ty>) -> Vec<String> {
    graph.node_weights().map(|node| node.id.clone()).collect()
}
