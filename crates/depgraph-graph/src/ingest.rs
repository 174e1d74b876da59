use depgraph_core::{Edge, NodeId, ResourceItem};
use std::collections::HashSet;

/// Unique node ids and renderable edges derived from a raw edge list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestedEdges {
    /// Root first, then every endpoint in first-seen order.
    pub node_ids: Vec<NodeId>,
    /// Input edges minus self-loops, in input order.
    pub edges: Vec<Edge>,
}

pub struct EdgeIngestor;

impl EdgeIngestor {
    pub fn ingest(root: &ResourceItem, edges: &[Edge]) -> IngestedEdges {
        let root_id = NodeId::from(root);
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut node_ids = Vec::with_capacity(edges.len() * 2 + 1);

        seen.insert(root_id.clone());
        node_ids.push(root_id);

        let mut kept = Vec::with_capacity(edges.len());
        let mut self_loops = 0usize;

        for edge in edges {
            let source = NodeId::source_of(edge);
            let destination = NodeId::destination_of(edge);
            let is_self_loop = source == destination;

            for id in [source, destination] {
                if seen.insert(id.clone()) {
                    node_ids.push(id);
                }
            }

            if is_self_loop {
                self_loops += 1;
                continue;
            }
            kept.push(edge.clone());
        }

        tracing::debug!(
            nodes = node_ids.len(),
            edges = kept.len(),
            self_loops,
            "ingested dependency edges"
        );

        IngestedEdges {
            node_ids,
            edges: kept,
        }
    }
}
