//! GEXF reader.
//!
//! Supports the static subset of GEXF 1.1 through 1.3: typed attribute
//! declarations with defaults, `attvalues` on nodes and edges, node labels
//! and edge weights. Dynamic attributes, hierarchies and `viz` data are
//! ignored. Every edge is read as directed, whatever `defaultedgetype` says;
//! the component extractor makes the graph undirected later.

use crate::error::{Result, VizError};
use crate::graph::{AttrValue, DiGraph, Edge, Node, build_graph};
use roxmltree::{Document, Node as XmlNode};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrType {
    Integer,
    Float,
    Boolean,
    Text,
}

impl AttrType {
    fn from_token(token: &str) -> Self {
        match token {
            "integer" | "long" | "short" | "byte" => Self::Integer,
            "float" | "double" => Self::Float,
            "boolean" => Self::Boolean,
            _ => Self::Text,
        }
    }
}

#[derive(Debug, Clone)]
struct AttrDecl {
    title: String,
    kind: AttrType,
    default: Option<AttrValue>,
}

/// Attribute declarations for one `class` (node or edge), keyed by id.
#[derive(Debug, Default)]
struct AttrTable {
    decls: HashMap<String, AttrDecl>,
    order: Vec<String>,
}

impl AttrTable {
    fn defaults(&self) -> BTreeMap<String, AttrValue> {
        self.order
            .iter()
            .filter_map(|id| self.decls.get(id))
            .filter_map(|decl| Some((decl.title.clone(), decl.default.clone()?)))
            .collect()
    }
}

pub fn load_gexf(path: &Path) -> Result<DiGraph> {
    let text = std::fs::read_to_string(path).map_err(|source| VizError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let graph = parse_gexf(&text)?;
    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "loaded graph"
    );
    Ok(graph)
}

pub fn parse_gexf(text: &str) -> Result<DiGraph> {
    let doc = Document::parse(text)?;
    let root = doc.root_element();
    if root.tag_name().name() != "gexf" {
        return Err(VizError::InvalidGexf(format!(
            "root element is <{}>, expected <gexf>",
            root.tag_name().name()
        )));
    }
    let graph_el = child(root, "graph")
        .ok_or_else(|| VizError::InvalidGexf("missing <graph> element".to_string()))?;
    if let Some(kind) = graph_el.attribute("defaultedgetype") {
        debug!(defaultedgetype = kind, "reading all edges as directed");
    }

    let mut node_attrs = AttrTable::default();
    let mut edge_attrs = AttrTable::default();
    for block in children(graph_el, "attributes") {
        let table = match block.attribute("class") {
            Some("edge") => &mut edge_attrs,
            _ => &mut node_attrs,
        };
        read_attribute_block(block, table)?;
    }

    let nodes = match child(graph_el, "nodes") {
        Some(list) => children(list, "node")
            .map(|el| read_node(el, &node_attrs))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    let edges = match child(graph_el, "edges") {
        Some(list) => children(list, "edge")
            .enumerate()
            .map(|(idx, el)| read_edge(idx, el, &edge_attrs))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    build_graph(nodes, edges)
}

fn child<'a, 'input>(parent: XmlNode<'a, 'input>, name: &str) -> Option<XmlNode<'a, 'input>> {
    parent
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn children<'a, 'input: 'a>(
    parent: XmlNode<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = XmlNode<'a, 'input>> + 'a {
    parent
        .children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn read_attribute_block(block: XmlNode, table: &mut AttrTable) -> Result<()> {
    for el in children(block, "attribute") {
        let id = el
            .attribute("id")
            .ok_or_else(|| VizError::InvalidGexf("<attribute> without id".to_string()))?;
        let title = el.attribute("title").unwrap_or(id).to_string();
        let kind = AttrType::from_token(el.attribute("type").unwrap_or("string"));
        let default = match child(el, "default").and_then(|d| d.text()) {
            Some(raw) => Some(convert_value(kind, raw.trim(), &title)?),
            None => None,
        };
        table.order.push(id.to_string());
        table.decls.insert(id.to_string(), AttrDecl { title, kind, default });
    }
    Ok(())
}

fn read_attvalues(el: XmlNode, table: &AttrTable) -> Result<BTreeMap<String, AttrValue>> {
    let mut values = table.defaults();
    let Some(list) = child(el, "attvalues") else {
        return Ok(values);
    };
    for att in children(list, "attvalue") {
        // GEXF 1.1 drafts used `id` where 1.2 uses `for`.
        let key = att
            .attribute("for")
            .or_else(|| att.attribute("id"))
            .ok_or_else(|| VizError::InvalidGexf("<attvalue> without for".to_string()))?;
        let raw = att.attribute("value").unwrap_or_default();
        match table.decls.get(key) {
            Some(decl) => {
                values.insert(decl.title.clone(), convert_value(decl.kind, raw, &decl.title)?);
            }
            None => {
                values.insert(key.to_string(), AttrValue::from(raw));
            }
        }
    }
    Ok(values)
}

fn convert_value(kind: AttrType, raw: &str, title: &str) -> Result<AttrValue> {
    let bad = || VizError::InvalidGexf(format!("attribute {title:?} has invalid value {raw:?}"));
    Ok(match kind {
        AttrType::Integer => AttrValue::Int(raw.trim().parse().map_err(|_| bad())?),
        AttrType::Float => AttrValue::Float(raw.trim().parse().map_err(|_| bad())?),
        AttrType::Boolean => match raw.trim() {
            "true" | "1" => AttrValue::Bool(true),
            "false" | "0" => AttrValue::Bool(false),
            _ => return Err(bad()),
        },
        AttrType::Text => AttrValue::from(raw),
    })
}

fn read_node(el: XmlNode, table: &AttrTable) -> Result<Node> {
    let id = el
        .attribute("id")
        .ok_or_else(|| VizError::InvalidGexf("<node> without id".to_string()))?;
    let mut node = Node::new(id);
    node.attributes = read_attvalues(el, table)?;
    // An explicit label wins over an attribute column of the same name; the
    // id is the last resort.
    match el.attribute("label") {
        Some(label) => {
            node.attributes
                .insert("label".to_string(), AttrValue::from(label));
        }
        None => {
            node.attributes
                .entry("label".to_string())
                .or_insert_with(|| AttrValue::from(id));
        }
    }
    Ok(node)
}

fn read_edge(idx: usize, el: XmlNode, table: &AttrTable) -> Result<Edge> {
    let id = el
        .attribute("id")
        .map(str::to_string)
        .unwrap_or_else(|| idx.to_string());
    let source = el
        .attribute("source")
        .ok_or_else(|| VizError::InvalidGexf(format!("edge {id:?} without source")))?;
    let target = el
        .attribute("target")
        .ok_or_else(|| VizError::InvalidGexf(format!("edge {id:?} without target")))?;
    let mut edge = Edge::new(id.clone(), source, target);
    if let Some(raw) = el.attribute("weight") {
        let weight: f64 = raw
            .trim()
            .parse()
            .map_err(|_| VizError::InvalidGexf(format!("edge {id:?} has invalid weight {raw:?}")))?;
        // Layout raises weights to a fractional power.
        if !weight.is_finite() || weight < 0.0 {
            return Err(VizError::InvalidGexf(format!(
                "edge {id:?} has negative or non-finite weight {raw:?}"
            )));
        }
        edge.weight = weight;
    }
    edge.attributes = read_attvalues(el, table)?;
    if let Some(label) = el.attribute("label") {
        edge.attributes
            .insert("label".to_string(), AttrValue::from(label));
    }
    Ok(edge)
}
