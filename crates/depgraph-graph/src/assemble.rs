//! End-to-end graph construction.
//!
//! Ingest edges, synthesize nodes, correlate diagnostics, lay out, then convert
//! center anchors to top-left positions. Nothing here fetches or waits: when
//! either input collection is still `None` a pending graph comes back instead.

use crate::config::GraphConfig;
use crate::correlate::{
    CorrelationStrategy, apply_anomaly_index, apply_degraded_resources, build_anomaly_index,
    find_degraded_resources,
};
use crate::error::GraphError;
use crate::graph::GraphModel;
use crate::ingest::EdgeIngestor;
use crate::layout::{LayeredLayouter, Layouter, to_top_left};
use crate::style::{EdgeStyle, NodeStyle, get_edge_style, get_node_style};
use crate::synth::{NodeSynthesizer, RendererRegistry};
use depgraph_core::{
    DashboardRecord, Edge, GraphEdge, GraphNode, NodeId, Position, ResourceCatalogs, ResourceItem,
    Size, TimeWindow,
};
use depgraph_events::{Event, EventBus, telemetry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphInputs {
    pub root: ResourceItem,
    #[serde(default)]
    pub time_window: TimeWindow,
    /// `None` until the edge source has answered.
    pub edges: Option<Vec<Edge>>,
    /// `None` until the diagnostics source has answered.
    pub dashboards: Option<Vec<DashboardRecord>>,
    #[serde(default)]
    pub catalogs: ResourceCatalogs,
    /// Sizes measured by the rendering surface. Unmeasured nodes use the layout default.
    #[serde(default)]
    pub node_sizes: BTreeMap<NodeId, Size>,
}

impl GraphInputs {
    pub fn new(root: ResourceItem) -> Self {
        Self {
            root,
            time_window: TimeWindow::unbounded(),
            edges: None,
            dashboards: None,
            catalogs: ResourceCatalogs::default(),
            node_sizes: BTreeMap::new(),
        }
    }

    pub fn with_edges(mut self, edges: Vec<Edge>) -> Self {
        self.edges = Some(edges);
        self
    }

    pub fn with_dashboards(mut self, dashboards: Vec<DashboardRecord>) -> Self {
        self.dashboards = Some(dashboards);
        self
    }

    pub fn with_catalogs(mut self, catalogs: ResourceCatalogs) -> Self {
        self.catalogs = catalogs;
        self
    }

    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = window;
        self
    }

    pub fn with_node_size(mut self, id: NodeId, size: Size) -> Self {
        self.node_sizes.insert(id, size);
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.edges.is_some() && self.dashboards.is_some()
    }
}

/// What the rendering surface consumes. Nothing should be drawn until `is_ready`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub is_ready: bool,
}

impl AssembledGraph {
    pub fn pending() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            is_ready: false,
        }
    }

    pub fn root(&self) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.is_root)
    }

    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    pub fn degraded_edge_count(&self) -> usize {
        self.edges.iter().filter(|edge| edge.is_degraded()).count()
    }

    pub fn node_style(&self, node: &GraphNode) -> NodeStyle {
        get_node_style(node.presentation.kind, node.is_root)
    }

    pub fn edge_style(&self, edge: &GraphEdge) -> EdgeStyle {
        get_edge_style(edge.classification)
    }
}

pub struct GraphAssembler {
    config: GraphConfig,
    registry: RendererRegistry,
    layouter: Box<dyn Layouter>,
    events: Option<EventBus>,
}

impl Default for GraphAssembler {
    fn default() -> Self {
        Self::new(GraphConfig::default())
    }
}

impl GraphAssembler {
    pub fn new(config: GraphConfig) -> Self {
        let layouter = LayeredLayouter::from_config(&config.layout);
        Self {
            config,
            registry: RendererRegistry::with_defaults(),
            layouter: Box::new(layouter),
            events: None,
        }
    }

    pub fn with_registry(mut self, registry: RendererRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_layouter<L: Layouter + 'static>(mut self, layouter: L) -> Self {
        self.layouter = Box::new(layouter);
        self
    }

    /// Publishes `GraphBuilt` / `GraphBuildFailed` for every completed build.
    ///
    /// The bus queue is unbounded and only shrinks when a listener drains it
    /// with [`EventBus::dispatch_to`] or a receiver, so attach a bus only when
    /// something consumes it.
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Organization summary: degraded resources come from plot titles.
    pub fn build_summary(&self, inputs: &GraphInputs) -> Result<AssembledGraph, GraphError> {
        self.build(inputs, CorrelationStrategy::TitleHeuristic)
    }

    /// Single resource view: per-edge anomaly history from explicit edge ids.
    pub fn build_resource_detail(
        &self,
        inputs: &GraphInputs,
    ) -> Result<AssembledGraph, GraphError> {
        self.build(inputs, CorrelationStrategy::ExplicitIndex)
    }

    pub fn build(
        &self,
        inputs: &GraphInputs,
        strategy: CorrelationStrategy,
    ) -> Result<AssembledGraph, GraphError> {
        let root = NodeId::from(&inputs.root);
        let (Some(edges), Some(dashboards)) = (inputs.edges.as_deref(), inputs.dashboards.as_deref())
        else {
            tracing::debug!(
                root = %root,
                edges_loaded = inputs.edges.is_some(),
                dashboards_loaded = inputs.dashboards.is_some(),
                "graph inputs not loaded, returning pending graph"
            );
            return Ok(AssembledGraph::pending());
        };

        let variant = strategy.variant();
        let root_key = root.key();
        let correlation_id = telemetry::new_correlation_id();
        telemetry::build_start(&root_key, variant, &correlation_id);
        let started = Instant::now();

        match self.assemble(inputs, edges, dashboards, strategy, &correlation_id) {
            Ok(graph) => {
                telemetry::build_success(
                    &root_key,
                    variant,
                    &correlation_id,
                    (graph.nodes.len(), graph.edges.len()),
                    Some(started.elapsed().as_millis()),
                );
                self.publish(Event::GraphBuilt {
                    root,
                    variant,
                    node_count: graph.nodes.len(),
                    edge_count: graph.edges.len(),
                    degraded_edge_count: graph.degraded_edge_count(),
                    is_ready: graph.is_ready,
                });
                Ok(graph)
            }
            Err(err) => {
                telemetry::build_failure(&root_key, variant, &correlation_id, Some(err.to_string()));
                self.publish(Event::GraphBuildFailed {
                    root,
                    variant,
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn publish(&self, event: Event) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }

    fn assemble(
        &self,
        inputs: &GraphInputs,
        edges: &[Edge],
        dashboards: &[DashboardRecord],
        strategy: CorrelationStrategy,
        correlation_id: &str,
    ) -> Result<AssembledGraph, GraphError> {
        let root = NodeId::from(&inputs.root);
        let ingested = EdgeIngestor::ingest(&inputs.root, edges);

        let synthesizer = NodeSynthesizer::new(&self.registry, self.config.stack_spacing);
        let mut nodes = synthesizer.synthesize(&root, &ingested.node_ids, &inputs.catalogs);
        for node in &mut nodes {
            node.size = inputs.node_sizes.get(&node.id).copied();
        }

        let mut graph_edges: Vec<GraphEdge> =
            ingested.edges.iter().map(GraphEdge::from_edge).collect();

        let degraded = match strategy {
            CorrelationStrategy::TitleHeuristic => {
                let resources =
                    find_degraded_resources(dashboards, &inputs.catalogs, &inputs.time_window);
                apply_degraded_resources(&mut graph_edges, &resources)
            }
            CorrelationStrategy::ExplicitIndex => {
                let index = build_anomaly_index(dashboards, &inputs.time_window);
                apply_anomaly_index(&mut graph_edges, &index)
            }
        };

        telemetry::debug_context(
            &root.key(),
            correlation_id,
            &format!(
                "{} nodes, {} edges, {} degraded",
                nodes.len(),
                graph_edges.len(),
                degraded
            ),
        );

        self.apply_layout(&mut nodes, &graph_edges)?;

        Ok(AssembledGraph {
            nodes,
            edges: graph_edges,
            is_ready: true,
        })
    }

    fn apply_layout(&self, nodes: &mut [GraphNode], edges: &[GraphEdge]) -> Result<(), GraphError> {
        let mut model = GraphModel::new();
        for node in nodes.iter() {
            model.add_node(node.id.clone(), node.size);
        }
        for edge in edges {
            model.add_edge(&edge.source, &edge.target);
        }

        let layout = self.layouter.execute(&model);

        for node in nodes.iter_mut() {
            let placed = model.index_of(&node.id).and_then(|idx| {
                let center = layout.center(idx)?;
                let size = layout.sizes.get(&idx).copied()?;
                Some((center, size))
            });
            let Some((center, size)) = placed else {
                tracing::error!(node = %node.id, "node missing from layout result");
                return Err(GraphError::MissingLayoutPosition(node.id.clone()));
            };

            let corner = to_top_left(center, size);
            node.position = Position::new(corner.x, corner.y);
            node.size = Some(size.into());
        }

        Ok(())
    }
}
