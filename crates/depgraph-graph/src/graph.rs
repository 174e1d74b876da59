use depgraph_core::{NodeId, Size};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeIndex(pub usize);

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeIndex(pub usize);

impl fmt::Display for EdgeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<Size> for Vec2 {
    fn from(size: Size) -> Self {
        Self::new(size.width, size.height)
    }
}

impl From<Vec2> for Size {
    fn from(value: Vec2) -> Self {
        Size::new(value.x, value.y)
    }
}

/// A box to be placed by the layouter. `size` is `None` until the surface measures it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutNode {
    pub id: NodeId,
    pub size: Option<Vec2>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub source_idx: NodeIndex,
    pub target_idx: NodeIndex,
}

#[derive(Debug)]
pub struct Graph {
    nodes: Vec<LayoutNode>,
    edges: Vec<LayoutEdge>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn add_node(&mut self, node: LayoutNode) -> NodeIndex {
        let idx = NodeIndex(self.nodes.len());
        self.nodes.push(node);
        idx
    }

    pub fn add_edge(
        &mut self,
        source_idx: NodeIndex,
        target_idx: NodeIndex,
        edge: LayoutEdge,
    ) -> EdgeIndex {
        let idx = EdgeIndex(self.edges.len());
        let mut edge = edge;
        edge.source_idx = source_idx;
        edge.target_idx = target_idx;
        self.edges.push(edge);
        idx
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        (0..self.nodes.len()).map(NodeIndex)
    }

    pub fn edge_indices(&self) -> impl Iterator<Item = EdgeIndex> {
        (0..self.edges.len()).map(EdgeIndex)
    }

    pub fn edge_endpoints(&self, index: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.edges
            .get(index.0)
            .map(|e| (e.source_idx, e.target_idx))
    }
}

impl Index<NodeIndex> for Graph {
    type Output = LayoutNode;
    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index.0]
    }
}

impl IndexMut<NodeIndex> for Graph {
    fn index_mut(&mut self, index: NodeIndex) -> &mut Self::Output {
        &mut self.nodes[index.0]
    }
}

/// Layout input: registered nodes in insertion order plus directed edges between them.
#[derive(Debug, Default)]
pub struct GraphModel {
    pub graph: Graph,
    pub node_map: HashMap<NodeId, NodeIndex>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node. Adding an id twice keeps the first registration.
    pub fn add_node(&mut self, id: NodeId, size: Option<Size>) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(LayoutNode {
            id: id.clone(),
            size: size.map(Vec2::from),
        });
        self.node_map.insert(id, idx);
        idx
    }

    pub fn add_edge(&mut self, source: &NodeId, target: &NodeId) -> Option<EdgeIndex> {
        if let (Some(&src), Some(&dst)) = (self.node_map.get(source), self.node_map.get(target)) {
            let edge = LayoutEdge {
                source: source.clone(),
                target: target.clone(),
                source_idx: src,
                target_idx: dst,
            };
            return Some(self.graph.add_edge(src, dst, edge));
        }

        if !self.node_map.contains_key(source) {
            tracing::warn!(
                "Dropping layout edge {} -> {} because the source node is not registered",
                source,
                target
            );
        }
        if !self.node_map.contains_key(target) {
            tracing::warn!(
                "Dropping layout edge {} -> {} because the target node is not registered",
                source,
                target
            );
        }
        None
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn index_of(&self, id: &NodeId) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    pub fn get_node(&self, id: &NodeId) -> Option<&LayoutNode> {
        self.node_map.get(id).map(|&idx| &self.graph[idx])
    }

    pub fn set_size(&mut self, id: &NodeId, size: Size) -> bool {
        match self.node_map.get(id) {
            Some(&idx) => {
                self.graph[idx].size = Some(size.into());
                true
            }
            None => false,
        }
    }
}
