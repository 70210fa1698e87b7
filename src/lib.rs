#[cfg(feature = "cli")]
pub mod cli;
pub mod components;
pub mod config;
pub mod error;
pub mod filter;
pub mod gexf;
pub mod graph;
pub mod labels;
pub mod layout;
pub mod layout_dump;
pub mod pipeline;
pub mod render;
pub mod style;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, load_config};
pub use error::{Result, VizError};
pub use pipeline::{Collaborators, Scene, build_scene};
