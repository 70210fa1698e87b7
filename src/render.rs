use crate::config::RenderConfig;
use crate::error::{Result, VizError};
use crate::layout::label_placement::leader_line;
use crate::layout::{LabelAdjuster, LabelBox, Point, Positions};
use crate::pipeline::Scene;
use crate::text_metrics::label_box_size;
use crate::theme::{Theme, resolve_color};
use std::path::Path;
use tracing::{debug, info, warn};

const POINTS_PER_INCH: f32 = 72.0;

/// Maps data coordinates onto the figure, leaving `margin` of each side free
/// and flipping the y axis so larger values sit higher.
#[derive(Debug, Clone, Copy)]
struct FigureTransform {
    min: (f32, f32),
    span: (f32, f32),
    origin: (f32, f32),
    extent: (f32, f32),
}

impl FigureTransform {
    fn fit(positions: &Positions, config: &RenderConfig) -> Self {
        let mut min = (f32::INFINITY, f32::INFINITY);
        let mut max = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for point in positions.values() {
            min = (min.0.min(point.x), min.1.min(point.y));
            max = (max.0.max(point.x), max.1.max(point.y));
        }
        if positions.is_empty() {
            min = (0.0, 0.0);
            max = (0.0, 0.0);
        }
        let origin = (config.width * config.margin, config.height * config.margin);
        Self {
            min,
            span: (max.0 - min.0, max.1 - min.1),
            origin,
            extent: (config.width - 2.0 * origin.0, config.height - 2.0 * origin.1),
        }
    }

    fn to_pixels(&self, point: Point) -> (f32, f32) {
        let axis = |value: f32, min: f32, span: f32| {
            if span > f32::EPSILON { (value - min) / span } else { 0.5 }
        };
        let tx = axis(point.x, self.min.0, self.span.0);
        let ty = axis(point.y, self.min.1, self.span.1);
        (
            self.origin.0 + tx * self.extent.0,
            self.origin.1 + (1.0 - ty) * self.extent.1,
        )
    }
}

/// Draws the scene as an SVG document: edges first, then nodes, then the
/// selected labels placed by `adjuster` with leader arrows back to their
/// nodes.
pub fn render_svg(
    scene: &Scene,
    theme: &Theme,
    config: &RenderConfig,
    adjuster: &dyn LabelAdjuster,
) -> Result<String> {
    let width = config.width;
    let height = config.height;
    let pt = config.dpi / POINTS_PER_INCH;
    let transform = FigureTransform::fit(&scene.positions, config);
    let pixel = |id: &str| {
        scene
            .positions
            .get(id)
            .map(|point| transform.to_pixels(*point))
            .ok_or_else(|| VizError::MissingPosition(id.to_string()))
    };

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        resolve_color(&theme.background)?
    ));

    let leader_color = resolve_color(&theme.leader_color)?;
    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"leader\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto\"><path d=\"M 0 0 L 10 5 L 0 10\" fill=\"none\" stroke=\"{leader_color}\" stroke-width=\"1.5\"/></marker>",
    ));
    svg.push_str("</defs>");

    let edge_width = config.edge_width * pt;
    svg.push_str("<g class=\"edges\">");
    for (edge, color) in scene.graph.edge_weights().zip(&scene.visuals.edge_colors) {
        let (x1, y1) = pixel(&edge.source)?;
        let (x2, y2) = pixel(&edge.target)?;
        svg.push_str(&format!(
            "<line x1=\"{x1:.2}\" y1=\"{y1:.2}\" x2=\"{x2:.2}\" y2=\"{y2:.2}\" stroke=\"{}\" stroke-opacity=\"{}\" stroke-width=\"{edge_width:.2}\"/>",
            resolve_color(color)?,
            config.edge_alpha
        ));
    }
    svg.push_str("</g>");

    let visuals = &scene.visuals;
    let mut obstacles = Vec::with_capacity(visuals.node_ids.len());
    svg.push_str("<g class=\"nodes\">");
    for ((id, color), size) in visuals.node_ids.iter().zip(&visuals.node_colors).zip(&visuals.node_sizes) {
        let (cx, cy) = pixel(id)?;
        obstacles.push((cx, cy));
        // Sizes are marker areas in square points.
        let radius = (size.max(0.0).sqrt() / 2.0) as f32 * pt;
        svg.push_str(&format!(
            "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{radius:.2}\" fill=\"{}\" fill-opacity=\"{}\"/>",
            resolve_color(color)?,
            config.node_alpha
        ));
    }
    svg.push_str("</g>");

    let font_size = config.label_font_size * pt;
    let boxes = scene
        .labels
        .iter()
        .map(|(id, text)| {
            let (w, h) = label_box_size(text, font_size, &theme.font_family);
            Ok(LabelBox {
                anchor: pixel(id)?,
                width: w,
                height: h,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let centers = adjuster.adjust(&boxes, &obstacles, (width, height));
    debug!(labels = boxes.len(), "placed labels");

    let label_color = resolve_color(&theme.label_color)?;
    svg.push_str("<g class=\"labels\">");
    for ((label, center), (_, text)) in boxes.iter().zip(&centers).zip(&scene.labels) {
        if let Some(((x1, y1), (x2, y2))) = leader_line(label, *center) {
            svg.push_str(&format!(
                "<line x1=\"{x1:.2}\" y1=\"{y1:.2}\" x2=\"{x2:.2}\" y2=\"{y2:.2}\" stroke=\"{leader_color}\" stroke-width=\"{:.2}\" marker-end=\"url(#leader)\"/>",
                pt
            ));
        }
        let (x, y) = *center;
        let baseline = y - label.height / 2.0 + font_size;
        svg.push_str(&format!(
            "<text x=\"{x:.2}\" y=\"{baseline:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{font_size:.2}\" fill=\"{label_color}\">{}</text>",
            escape_xml(&theme.font_family),
            escape_xml(text)
        ));
    }
    svg.push_str("</g>");

    svg.push_str("</svg>");
    Ok(svg)
}

pub fn write_output_svg(svg: &str, output: &Path) -> anyhow::Result<()> {
    std::fs::write(output, svg)?;
    info!(path = %output.display(), "wrote SVG");
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, theme: &Theme) -> anyhow::Result<()> {
    let mut opt = usvg::Options::default();
    if let Some(family) = theme.font_family.split(',').map(str::trim).find(|f| !f.is_empty()) {
        opt.font_family = family.to_string();
    }
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    info!(path = %output.display(), "wrote PNG");
    Ok(())
}

/// Opens `path` in the platform image viewer. Failure only logs a warning.
pub fn show_output(path: &Path) {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    };
    match std::process::Command::new(opener).arg(path).spawn() {
        Ok(_) => debug!(opener, path = %path.display(), "opened viewer"),
        Err(err) => warn!(opener, %err, "could not open the image viewer"),
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::graph::{Edge, Node, UnGraph, build_graph};
    use crate::layout::RepelAdjuster;
    use crate::style::VisualAttributes;

    fn scene() -> Scene {
        let nodes = vec![
            Node::new("a")
                .with_attr("inlink_count", 10i64)
                .with_attr("partisan_code", "partisan_2012_conservative")
                .with_attr("label", "R & D"),
            Node::new("b")
                .with_attr("inlink_count", 2i64)
                .with_attr("partisan_code", "partisan_2012_liberal")
                .with_attr("label", "Beta"),
        ];
        let graph: UnGraph = build_graph(nodes, vec![Edge::new("e", "a", "b")]).unwrap();
        let visuals = VisualAttributes::build(&graph, &PipelineConfig::default()).unwrap();
        let mut positions = Positions::new();
        positions.insert("a".to_string(), Point::new(-3.0, 1.0));
        positions.insert("b".to_string(), Point::new(5.0, 9.0));
        Scene {
            graph,
            positions,
            visuals,
            labels: vec![("a".to_string(), "R & D".to_string())],
            layout_nodes: 2,
        }
    }

    #[test]
    fn draws_edges_under_nodes_under_labels() {
        let svg = render_svg(&scene(), &Theme::classic(), &RenderConfig::default(), &RepelAdjuster::default())
            .unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<circle").count(), 2);
        assert_eq!(svg.matches("<text").count(), 1);
        assert!(svg.contains("R &amp; D"));
        assert!(!svg.contains("Beta"));
        let edges = svg.find("class=\"edges\"").unwrap();
        let nodes = svg.find("class=\"nodes\"").unwrap();
        let labels = svg.find("class=\"labels\"").unwrap();
        assert!(edges < nodes && nodes < labels);
        // Edge takes the conservative source color at the configured alpha.
        assert!(svg.contains("stroke=\"#FF0000\" stroke-opacity=\"0.01\""));
        assert!(svg.contains("fill=\"#0000FF\" fill-opacity=\"0.7\""));
    }

    #[test]
    fn data_extent_fills_the_figure_inside_the_margin() {
        let config = RenderConfig::default();
        let scene = scene();
        let transform = FigureTransform::fit(&scene.positions, &config);
        let (ax, ay) = transform.to_pixels(scene.positions["a"]);
        let (bx, by) = transform.to_pixels(scene.positions["b"]);
        assert!((ax - 50.0).abs() < 1e-3);
        assert!((ay - 950.0).abs() < 1e-3);
        assert!((bx - 950.0).abs() < 1e-3);
        assert!((by - 50.0).abs() < 1e-3);
    }

    #[test]
    fn single_point_is_centered() {
        let mut positions = Positions::new();
        positions.insert("only".to_string(), Point::new(7.0, -2.0));
        let transform = FigureTransform::fit(&positions, &RenderConfig::default());
        assert_eq!(transform.to_pixels(Point::new(7.0, -2.0)), (500.0, 500.0));
    }

    #[test]
    fn missing_position_is_an_error() {
        let mut scene = scene();
        scene.positions.remove("b");
        let result = render_svg(&scene, &Theme::classic(), &RenderConfig::default(), &RepelAdjuster::default());
        assert!(matches!(result, Err(VizError::MissingPosition(id)) if id == "b"));
    }

    #[test]
    fn writes_svg_file() {
        let path = std::env::temp_dir().join(format!("gexf-viz-render-{}.svg", std::process::id()));
        write_output_svg("<svg/>", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<svg/>");
        let _ = std::fs::remove_file(path);
    }
}
