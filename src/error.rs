use std::path::PathBuf;

/// Faults raised by the graph pipeline itself. The CLI wraps these in
/// `anyhow::Error` together with I/O and rendering failures.
#[derive(Debug, thiserror::Error)]
pub enum VizError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("invalid GEXF document: {0}")]
    InvalidGexf(String),

    #[error("duplicate node id {0:?}")]
    DuplicateNode(String),

    #[error("edge {edge:?} references unknown node {node:?}")]
    UnknownNode { edge: String, node: String },

    #[error("graph has no nodes, so there is no largest component")]
    EmptyGraph,

    #[error("node {node:?} has no attribute {attribute:?}")]
    MissingAttribute { node: String, attribute: String },

    #[error("node {node:?} attribute {attribute:?} is not numeric: {value:?}")]
    NonNumericAttribute {
        node: String,
        attribute: String,
        value: String,
    },

    #[error("node {0:?} has no layout position")]
    MissingPosition(String),

    #[error("unknown color {0:?}")]
    UnknownColor(String),

    #[error("colormap has no \"null\" fallback entry")]
    MissingNullColor,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, VizError>;
