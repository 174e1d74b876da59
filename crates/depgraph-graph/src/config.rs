use crate::error::GraphError;
use depgraph_core::LayoutDirection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunables for graph construction. Every key is optional in the JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub layout: LayoutConfig,
    /// Vertical distance between nodes in the pre-layout stack.
    pub stack_spacing: f32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            stack_spacing: 70.0,
        }
    }
}

impl GraphConfig {
    pub fn from_json_str(json: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub direction: LayoutDirection,
    pub default_node_width: f32,
    pub default_node_height: f32,
    /// Gap between neighbouring boxes inside one rank.
    pub node_spacing: f32,
    /// Gap between consecutive ranks.
    pub rank_spacing: f32,
    /// Barycenter down+up sweeps used for crossing reduction.
    pub ordering_sweeps: usize,
}

impl LayoutConfig {
    pub const DEFAULT_NODE_WIDTH: f32 = 250.0;
    pub const DEFAULT_NODE_HEIGHT: f32 = 50.0;
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            direction: LayoutDirection::TopBottom,
            default_node_width: Self::DEFAULT_NODE_WIDTH,
            default_node_height: Self::DEFAULT_NODE_HEIGHT,
            node_spacing: 40.0,
            rank_spacing: 80.0,
            ordering_sweeps: 4,
        }
    }
}
