use crate::components::UnionFindComponents;
use crate::config::{Config, load_config};
use crate::gexf::load_gexf;
use crate::layout::{ForceAtlas2, RepelAdjuster};
use crate::layout_dump::write_layout_dump;
use crate::pipeline::{Collaborators, build_scene};
use crate::render::{render_svg, show_output, write_output_svg};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "gexfviz",
    version,
    about = "Draw the largest connected component of a GEXF graph with ForceAtlas2"
)]
pub struct Args {
    /// Input GEXF file
    pub input: PathBuf,

    /// Output image (png or svg)
    #[arg(short = 'o', long = "output", default_value = "1.png")]
    pub output: PathBuf,

    /// Output format. Inferred from the output extension when omitted.
    #[arg(short = 'e', long = "outputFormat", value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Number of nodes to draw, by inlink count
    #[arg(short = 'k', long = "top")]
    pub top: Option<usize>,

    /// Number of nodes that get a label
    #[arg(short = 'n', long = "labels")]
    pub labels: Option<usize>,

    /// Seed for the initial layout positions
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Also write node positions and styles as JSON
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,

    /// Open the image once it is written
    #[arg(long = "show")]
    pub show: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut config = load_config(args.config.as_deref())?;
    apply_args(&mut config, &args);
    config.validate()?;

    let graph = load_gexf(&args.input)?;
    let engine = ForceAtlas2::new(config.layout.clone());
    let collaborators = Collaborators {
        components: &UnionFindComponents,
        layout: &engine,
    };
    let scene = build_scene(&graph, &config, &collaborators)?;

    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &scene)?;
        info!(path = %path.display(), "wrote layout dump");
    }

    let svg = render_svg(&scene, &config.theme, &config.render, &RepelAdjuster::default())?;
    match args.output_format.unwrap_or_else(|| infer_format(&args.output)) {
        OutputFormat::Svg => write_output_svg(&svg, &args.output)?,
        OutputFormat::Png => write_png(&svg, &args.output, &config)?,
    }

    if args.show {
        show_output(&args.output);
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gexf_viz=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Command-line flags win over the config file.
fn apply_args(config: &mut Config, args: &Args) {
    if let Some(top) = args.top {
        config.pipeline.top_k = top;
    }
    if let Some(labels) = args.labels {
        config.pipeline.num_labels = labels;
    }
    if let Some(seed) = args.seed {
        config.layout.seed = seed;
    }
}

fn infer_format(output: &Path) -> OutputFormat {
    match output.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("svg") => OutputFormat::Svg,
        _ => OutputFormat::Png,
    }
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, config: &Config) -> Result<()> {
    crate::render::write_output_png(svg, output, &config.theme)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}
