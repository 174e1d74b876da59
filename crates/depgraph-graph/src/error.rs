use depgraph_core::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    /// A registered node has no position after layout.
    #[error("Layout produced no position for node {0}")]
    MissingLayoutPosition(NodeId),
    #[error("Invalid graph configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Failed to read graph configuration: {0}")]
    Io(#[from] std::io::Error),
}
