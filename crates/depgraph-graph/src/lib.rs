pub mod assemble;
pub mod config;
pub mod correlate;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod layout;
pub mod style;
pub mod synth;

pub use assemble::{AssembledGraph, GraphAssembler, GraphInputs};
pub use config::{GraphConfig, LayoutConfig};
pub use correlate::{
    AnomalyIndex, CorrelationStrategy, DEFAULT_ANOMALY_LABEL, MAX_ANOMALY_HISTORY,
    apply_anomaly_index, apply_degraded_resources, build_anomaly_index, find_degraded_resources,
    observations_near, resolve_resource_from_title,
};
pub use error::GraphError;
pub use graph::{EdgeIndex, GraphModel, NodeIndex, Vec2};
pub use ingest::{EdgeIngestor, IngestedEdges};
pub use layout::{LayeredLayouter, LayoutResult, Layouter, to_top_left};
pub use style::{
    Color, EdgeStyle, NodeColors, NodeStyle, get_edge_style, get_node_colors, get_node_style,
    icon_for,
};
pub use synth::{FallbackRenderer, NodeRenderer, NodeSynthesizer, RendererRegistry};
