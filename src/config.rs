use crate::error::VizError;
use crate::theme::{Theme, resolve_color};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Category key every colormap must carry; it colors nodes whose category
/// is absent or not listed.
pub const NULL_COLOR_KEY: &str = "null";

const DEFAULT_COLORMAP: [(&str, &str); 4] = [
    (NULL_COLOR_KEY, "lightgray"),
    ("partisan_2012_conservative", "r"),
    ("partisan_2012_liberal", "b"),
    ("partisan_2012_libertarian", "y"),
];

/// Field names, counts and thresholds that drive filtering and the visual
/// mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub colormap: BTreeMap<String, String>,
    pub color_field: String,
    pub size_field: String,
    pub filter_field: String,
    pub label_field: String,
    /// Labels drawn for the largest nodes only.
    pub num_labels: usize,
    /// Nodes kept in the rendered subgraph.
    pub top_k: usize,
    /// Components larger than this are cut down before the layout runs.
    pub layout_threshold: usize,
    pub min_size: f64,
    pub max_size: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            colormap: DEFAULT_COLORMAP
                .iter()
                .map(|(key, color)| (key.to_string(), color.to_string()))
                .collect(),
            color_field: "partisan_code".to_string(),
            size_field: "inlink_count".to_string(),
            filter_field: "inlink_count".to_string(),
            label_field: "label".to_string(),
            num_labels: 20,
            top_k: 100,
            layout_threshold: 1000,
            min_size: 0.1,
            max_size: 800.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceAtlas2Config {
    pub iterations: usize,
    pub outbound_attraction_distribution: bool,
    pub lin_log_mode: bool,
    pub prevent_overlapping: bool,
    pub edge_weight_influence: f64,
    pub jitter_tolerance: f64,
    pub barnes_hut_optimize: bool,
    pub barnes_hut_theta: f64,
    pub scaling_ratio: f64,
    pub strong_gravity_mode: bool,
    pub multithread: bool,
    pub gravity: f64,
    /// Seed for the random initial positions.
    pub seed: u64,
}

impl Default for ForceAtlas2Config {
    fn default() -> Self {
        Self {
            iterations: 50,
            outbound_attraction_distribution: true,
            lin_log_mode: true,
            prevent_overlapping: true,
            edge_weight_influence: 1.0,
            jitter_tolerance: 1.0,
            barnes_hut_optimize: true,
            barnes_hut_theta: 0.5,
            scaling_ratio: 38.0,
            strong_gravity_mode: false,
            multithread: false,
            gravity: 1.0,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Figure size in pixels.
    pub width: f32,
    pub height: f32,
    /// Pixels per inch; node sizes and stroke widths are given in points.
    pub dpi: f32,
    /// Fraction of the figure kept free around the drawing.
    pub margin: f32,
    pub node_alpha: f32,
    pub edge_alpha: f32,
    pub edge_width: f32,
    pub label_font_size: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 1000.0,
            dpi: 100.0,
            margin: 0.05,
            node_alpha: 0.7,
            edge_alpha: 0.01,
            edge_width: 1.0,
            label_font_size: 8.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub pipeline: PipelineConfig,
    pub layout: ForceAtlas2Config,
    pub render: RenderConfig,
}

impl Config {
    /// Checks that the colormap has its fallback entry, that every color in
    /// it and in the theme can be resolved, and that sizes and figure
    /// geometry are in range.
    pub fn validate(&self) -> Result<(), VizError> {
        if !self.pipeline.colormap.contains_key(NULL_COLOR_KEY) {
            return Err(VizError::MissingNullColor);
        }
        for color in self.pipeline.colormap.values() {
            resolve_color(color)?;
        }
        resolve_color(&self.theme.background)?;
        resolve_color(&self.theme.label_color)?;
        resolve_color(&self.theme.leader_color)?;

        let pipeline = &self.pipeline;
        if !(pipeline.min_size >= 0.0 && pipeline.min_size <= pipeline.max_size) {
            return Err(VizError::InvalidConfig(format!(
                "node sizes must satisfy 0 <= minSize <= maxSize, got {} and {}",
                pipeline.min_size, pipeline.max_size
            )));
        }
        let render = &self.render;
        if !(render.width > 0.0 && render.height > 0.0 && render.dpi > 0.0) {
            return Err(VizError::InvalidConfig(format!(
                "figure width, height and dpi must be positive, got {}x{} at {}",
                render.width, render.height, render.dpi
            )));
        }
        if !(0.0..0.5).contains(&render.margin) {
            return Err(VizError::InvalidConfig(format!(
                "margin must lie in [0, 0.5), got {}",
                render.margin
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    background: Option<String>,
    label_color: Option<String>,
    leader_color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipelineConfigFile {
    colormap: Option<BTreeMap<String, String>>,
    color_field: Option<String>,
    size_field: Option<String>,
    filter_field: Option<String>,
    label_field: Option<String>,
    num_labels: Option<usize>,
    top_k: Option<usize>,
    layout_threshold: Option<usize>,
    min_size: Option<f64>,
    max_size: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForceAtlas2ConfigFile {
    iterations: Option<usize>,
    outbound_attraction_distribution: Option<bool>,
    lin_log_mode: Option<bool>,
    prevent_overlapping: Option<bool>,
    edge_weight_influence: Option<f64>,
    jitter_tolerance: Option<f64>,
    barnes_hut_optimize: Option<bool>,
    barnes_hut_theta: Option<f64>,
    scaling_ratio: Option<f64>,
    strong_gravity_mode: Option<bool>,
    multithread: Option<bool>,
    gravity: Option<f64>,
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    dpi: Option<f32>,
    margin: Option<f32>,
    node_alpha: Option<f32>,
    edge_alpha: Option<f32>,
    edge_width: Option<f32>,
    label_font_size: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    pipeline: Option<PipelineConfigFile>,
    #[serde(rename = "forceAtlas2")]
    force_atlas2: Option<ForceAtlas2ConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    apply_config_source(&mut config, &contents)?;
    config.validate()?;
    Ok(config)
}

/// Overlays a JSON5 document onto `config`. Plain JSON is valid JSON5.
pub fn apply_config_source(config: &mut Config, contents: &str) -> anyhow::Result<()> {
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        config.theme = match theme_name {
            "modern" => Theme::modern(),
            "classic" | "default" => Theme::classic(),
            other => return Err(anyhow::anyhow!("unknown theme {other:?}")),
        };
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.label_color {
            config.theme.label_color = v;
        }
        if let Some(v) = vars.leader_color {
            config.theme.leader_color = v;
        }
    }

    if let Some(pipeline) = parsed.pipeline {
        let target = &mut config.pipeline;
        if let Some(v) = pipeline.colormap {
            target.colormap = v;
        }
        if let Some(v) = pipeline.color_field {
            target.color_field = v;
        }
        if let Some(v) = pipeline.size_field {
            target.size_field = v;
        }
        if let Some(v) = pipeline.filter_field {
            target.filter_field = v;
        }
        if let Some(v) = pipeline.label_field {
            target.label_field = v;
        }
        if let Some(v) = pipeline.num_labels {
            target.num_labels = v;
        }
        if let Some(v) = pipeline.top_k {
            target.top_k = v;
        }
        if let Some(v) = pipeline.layout_threshold {
            target.layout_threshold = v;
        }
        if let Some(v) = pipeline.min_size {
            target.min_size = v;
        }
        if let Some(v) = pipeline.max_size {
            target.max_size = v;
        }
    }

    if let Some(fa2) = parsed.force_atlas2 {
        let target = &mut config.layout;
        if let Some(v) = fa2.iterations {
            target.iterations = v;
        }
        if let Some(v) = fa2.outbound_attraction_distribution {
            target.outbound_attraction_distribution = v;
        }
        if let Some(v) = fa2.lin_log_mode {
            target.lin_log_mode = v;
        }
        if let Some(v) = fa2.prevent_overlapping {
            target.prevent_overlapping = v;
        }
        if let Some(v) = fa2.edge_weight_influence {
            target.edge_weight_influence = v;
        }
        if let Some(v) = fa2.jitter_tolerance {
            target.jitter_tolerance = v;
        }
        if let Some(v) = fa2.barnes_hut_optimize {
            target.barnes_hut_optimize = v;
        }
        if let Some(v) = fa2.barnes_hut_theta {
            target.barnes_hut_theta = v;
        }
        if let Some(v) = fa2.scaling_ratio {
            target.scaling_ratio = v;
        }
        if let Some(v) = fa2.strong_gravity_mode {
            target.strong_gravity_mode = v;
        }
        if let Some(v) = fa2.multithread {
            target.multithread = v;
        }
        if let Some(v) = fa2.gravity {
            target.gravity = v;
        }
        if let Some(v) = fa2.seed {
            target.seed = v;
        }
    }

    if let Some(render) = parsed.render {
        let target = &mut config.render;
        if let Some(v) = render.width {
            target.width = v;
        }
        if let Some(v) = render.height {
            target.height = v;
        }
        if let Some(v) = render.dpi {
            target.dpi = v;
        }
        if let Some(v) = render.margin {
            target.margin = v;
        }
        if let Some(v) = render.node_alpha {
            target.node_alpha = v;
        }
        if let Some(v) = render.edge_alpha {
            target.edge_alpha = v;
        }
        if let Some(v) = render.edge_width {
            target.edge_width = v;
        }
        if let Some(v) = render.label_font_size {
            target.label_font_size = v;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_partisan_setup() {
        let config = Config::default();
        assert_eq!(config.pipeline.colormap["null"], "lightgray");
        assert_eq!(config.pipeline.colormap.len(), 4);
        assert_eq!(config.pipeline.top_k, 100);
        assert_eq!(config.pipeline.num_labels, 20);
        assert_eq!(config.layout.iterations, 50);
        assert_eq!(config.layout.scaling_ratio, 38.0);
        assert!(!config.layout.multithread);
        config.validate().unwrap();
    }

    #[test]
    fn json5_overlay_changes_only_given_fields() {
        let mut config = Config::default();
        let source = r##"{
            // comments are allowed
            theme: "modern",
            pipeline: { topK: 25, colormap: { "null": "#cccccc", red_team: "r" } },
            forceAtlas2: { iterations: 10, linLogMode: false },
            render: { width: 640 },
        }"##;
        apply_config_source(&mut config, source).unwrap();
        assert_eq!(config.pipeline.top_k, 25);
        assert_eq!(config.pipeline.num_labels, 20);
        assert_eq!(config.pipeline.colormap.len(), 2);
        assert_eq!(config.layout.iterations, 10);
        assert!(!config.layout.lin_log_mode);
        assert!(config.layout.prevent_overlapping);
        assert_eq!(config.render.width, 640.0);
        assert_eq!(config.render.height, 1000.0);
        assert_eq!(config.theme.font_family, Theme::modern().font_family);
        config.validate().unwrap();
    }

    #[test]
    fn colormap_without_null_is_rejected() {
        let mut config = Config::default();
        apply_config_source(&mut config, r#"{"pipeline": {"colormap": {"a": "r"}}}"#).unwrap();
        assert!(matches!(config.validate(), Err(VizError::MissingNullColor)));
    }

    #[test]
    fn out_of_range_sizes_and_figure_are_rejected() {
        let cases = [
            r#"{"pipeline": {"minSize": 900, "maxSize": 10}}"#,
            r#"{"pipeline": {"minSize": -1}}"#,
            r#"{"render": {"width": 0}}"#,
            r#"{"render": {"height": -200}}"#,
            r#"{"render": {"margin": 0.5}}"#,
            r#"{"render": {"margin": -0.1}}"#,
        ];
        for source in cases {
            let mut config = Config::default();
            apply_config_source(&mut config, source).unwrap();
            assert!(
                matches!(config.validate(), Err(VizError::InvalidConfig(_))),
                "{source} should be rejected"
            );
        }

        let mut config = Config::default();
        apply_config_source(&mut config, r#"{"pipeline": {"minSize": 5, "maxSize": 5}, "render": {"margin": 0}}"#)
            .unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn unknown_theme_is_an_error() {
        let mut config = Config::default();
        assert!(apply_config_source(&mut config, r#"{"theme": "neon"}"#).is_err());
    }
}
