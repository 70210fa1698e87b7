use crate::pipeline::Scene;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub layout_nodes: usize,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub size: f64,
    pub color: String,
    /// Present only for nodes whose label is drawn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: String,
    pub source: String,
    pub target: String,
    pub color: String,
}

impl LayoutDump {
    pub fn from_scene(scene: &Scene) -> Self {
        let visuals = &scene.visuals;
        let labels: HashMap<&str, &str> = scene
            .labels
            .iter()
            .map(|(id, label)| (id.as_str(), label.as_str()))
            .collect();

        let nodes = visuals
            .node_ids
            .iter()
            .enumerate()
            .filter_map(|(idx, id)| {
                let point = scene.positions.get(id)?;
                Some(NodeDump {
                    id: id.clone(),
                    x: point.x,
                    y: point.y,
                    size: visuals.node_sizes[idx],
                    color: visuals.node_colors[idx].clone(),
                    label: labels.get(id.as_str()).map(|label| label.to_string()),
                })
            })
            .collect();

        let edges = scene
            .graph
            .edge_weights()
            .zip(&visuals.edge_colors)
            .map(|(edge, color)| EdgeDump {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                color: color.clone(),
            })
            .collect();

        LayoutDump {
            layout_nodes: scene.layout_nodes,
            nodes,
            edges,
        }
    }
}

pub fn write_layout_dump(path: &Path, scene: &Scene) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_scene(scene);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::graph::{Edge, Node, UnGraph, build_graph};
    use crate::layout::{Point, Positions};
    use crate::style::VisualAttributes;

    #[test]
    fn dump_lists_positions_and_drawn_labels() {
        let nodes = vec![
            Node::new("a").with_attr("inlink_count", 4i64).with_attr("label", "A"),
            Node::new("b").with_attr("inlink_count", 1i64).with_attr("label", "B"),
        ];
        let graph: UnGraph = build_graph(nodes, vec![Edge::new("e1", "b", "a")]).unwrap();
        let visuals = VisualAttributes::build(&graph, &PipelineConfig::default()).unwrap();
        let mut positions = Positions::new();
        positions.insert("a".to_string(), Point::new(1.0, 2.0));
        positions.insert("b".to_string(), Point::new(-1.0, 0.5));
        let scene = Scene {
            graph,
            positions,
            visuals,
            labels: vec![("a".to_string(), "A".to_string())],
            layout_nodes: 7,
        };

        let value = serde_json::to_value(LayoutDump::from_scene(&scene)).unwrap();
        assert_eq!(value["layoutNodes"], 7);
        assert_eq!(value["nodes"][0]["id"], "a");
        assert_eq!(value["nodes"][0]["label"], "A");
        assert!(value["nodes"][1].get("label").is_none());
        assert_eq!(value["nodes"][1]["x"], -1.0);
        assert_eq!(value["edges"][0]["source"], "b");
        assert_eq!(value["edges"][0]["color"], "lightgray");
    }
}
