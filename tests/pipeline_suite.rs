use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use gexf_viz::components::UnionFindComponents;
use gexf_viz::config::apply_config_source;
use gexf_viz::gexf::load_gexf;
use gexf_viz::layout::{ForceAtlas2, RepelAdjuster};
use gexf_viz::layout_dump::write_layout_dump;
use gexf_viz::render::{render_svg, write_output_svg};
use gexf_viz::{Collaborators, Config, Scene, build_scene};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gexf-viz-suite-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("scratch dir");
    dir.join(name)
}

fn scene_for(name: &str, config: &Config) -> Scene {
    let graph = load_gexf(&fixture(name)).expect("fixture load failed");
    let engine = ForceAtlas2::new(config.layout.clone());
    let with = Collaborators {
        components: &UnionFindComponents,
        layout: &engine,
    };
    build_scene(&graph, config, &with).expect("pipeline failed")
}

#[test]
fn five_node_graph_keeps_three_nodes_and_renders() {
    let mut config = Config::default();
    config.pipeline.top_k = 3;
    let scene = scene_for("five_nodes.gexf", &config);

    let ids: BTreeSet<&str> = scene.positions.keys().map(String::as_str).collect();
    assert_eq!(ids, BTreeSet::from(["a", "c", "e"]));
    assert!(scene.positions.values().all(|p| p.x.is_finite() && p.y.is_finite()));
    assert_eq!(scene.layout_nodes, 5);
    // a-e and e-a collapse into one edge.
    assert_eq!(scene.graph.edge_count(), 3);
    assert_eq!(scene.labels.len(), 3);
    assert_eq!(scene.labels[0].1, "alpha.blogspot.com");

    let svg = render_svg(&scene, &config.theme, &config.render, &RepelAdjuster::default())
        .expect("render failed");
    assert_eq!(svg.matches("<circle").count(), 3);
    assert_eq!(svg.matches("<text").count(), 3);

    let path = scratch("five.svg");
    write_output_svg(&svg, &path).expect("svg write failed");
    assert!(std::fs::metadata(&path).expect("svg missing").len() > 0);
}

#[cfg(feature = "png")]
#[test]
fn five_node_graph_writes_png() {
    let mut config = Config::default();
    config.pipeline.top_k = 3;
    let scene = scene_for("five_nodes.gexf", &config);
    let svg = render_svg(&scene, &config.theme, &config.render, &RepelAdjuster::default())
        .expect("render failed");

    let path = scratch("five.png");
    gexf_viz::render::write_output_png(&svg, &path, &config.theme).expect("png write failed");
    let bytes = std::fs::read(&path).expect("png missing");
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
}

#[test]
fn smaller_components_are_left_out() {
    let scene = scene_for("two_components.gexf", &Config::default());
    assert_eq!(scene.visuals.node_ids, vec!["n1", "n2", "n3", "n4"]);
    assert!(!scene.positions.contains_key("x1"));
    assert!(!scene.positions.contains_key("lonely"));
    // n4 has no inlink_count and falls back to the declared default of 0.
    assert_eq!(scene.visuals.node_sizes[3], config_min_size());
    // Liberal n1 colors its edge to n2 blue.
    assert_eq!(scene.visuals.edge_colors.len(), 3);
    assert!(scene.visuals.edge_colors.iter().any(|c| c == "b"));
}

fn config_min_size() -> f64 {
    Config::default().pipeline.min_size
}

#[test]
fn config_file_changes_counts_and_colors() {
    let mut config = Config::default();
    apply_config_source(
        &mut config,
        r#"{
            // JSON5 comments are fine
            pipeline: { topK: 2, numLabels: 1, colormap: { "null": "black", partisan_2012_liberal: "green" } },
            forceAtlas2: { iterations: 10, seed: 3 },
        }"#,
    )
    .expect("config parse failed");
    config.validate().expect("config invalid");

    let scene = scene_for("two_components.gexf", &config);
    assert_eq!(scene.visuals.node_ids, vec!["n1", "n3"]);
    assert_eq!(scene.visuals.node_colors, vec!["green", "black"]);
    assert_eq!(scene.labels, vec![("n1".to_string(), "one".to_string())]);
}

#[test]
fn layout_dump_round_trips_positions() {
    let mut config = Config::default();
    config.pipeline.top_k = 4;
    let scene = scene_for("five_nodes.gexf", &config);
    let path = scratch("dump.json");
    write_layout_dump(&path, &scene).expect("dump failed");

    let text = std::fs::read_to_string(&path).expect("dump missing");
    let value: serde_json::Value = serde_json::from_str(&text).expect("dump is not json");
    let nodes = value["nodes"].as_array().expect("nodes array");
    assert_eq!(nodes.len(), 4);
    for node in nodes {
        let id = node["id"].as_str().expect("id");
        let point = scene.positions[id];
        assert_eq!(node["x"].as_f64().expect("x") as f32, point.x);
    }
}

#[test]
fn same_seed_gives_same_picture() {
    let config = Config::default();
    let first = scene_for("five_nodes.gexf", &config);
    let second = scene_for("five_nodes.gexf", &config);
    assert_eq!(first.positions, second.positions);
}
