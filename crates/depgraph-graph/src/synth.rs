//! Turns node ids into renderable graph nodes.
//!
//! Rendering is dispatched by resource type through a [`RendererRegistry`].
//! Types without a registered renderer, and ids missing from their catalog,
//! go to the fallback renderer and show the raw id.

use crate::style::{ICON_APP, ICON_CUSTOM_RESOURCE, ICON_GENERIC, icon_for};
use depgraph_core::{
    CatalogEntry, GraphNode, NodeId, NodePresentation, Position, PresentationKind,
    ResourceCatalogs, ResourceType,
};
use std::collections::HashMap;

pub trait NodeRenderer: Send + Sync {
    /// `entry` is always the catalog record for `node_id`.
    fn render(&self, node_id: &NodeId, entry: &CatalogEntry) -> NodePresentation;
}

pub struct AppRenderer;

impl NodeRenderer for AppRenderer {
    fn render(&self, _node_id: &NodeId, entry: &CatalogEntry) -> NodePresentation {
        NodePresentation {
            kind: PresentationKind::App,
            label: entry.handle.clone(),
            subtitle: None,
            icon: ICON_APP.to_string(),
        }
    }
}

pub struct DatabaseRenderer;

impl NodeRenderer for DatabaseRenderer {
    fn render(&self, _node_id: &NodeId, entry: &CatalogEntry) -> NodePresentation {
        NodePresentation {
            kind: PresentationKind::Database,
            label: entry.handle.clone(),
            subtitle: entry.subtype.clone(),
            icon: icon_for(PresentationKind::Database, entry.subtype.as_deref()).to_string(),
        }
    }
}

pub struct CustomResourceRenderer;

impl NodeRenderer for CustomResourceRenderer {
    fn render(&self, _node_id: &NodeId, entry: &CatalogEntry) -> NodePresentation {
        NodePresentation {
            kind: PresentationKind::CustomResource,
            label: entry.handle.clone(),
            subtitle: entry.subtype.clone(),
            icon: ICON_CUSTOM_RESOURCE.to_string(),
        }
    }
}

/// Generic label node for anything the registry cannot render.
pub struct FallbackRenderer;

impl FallbackRenderer {
    pub fn render_bare(&self, node_id: &NodeId) -> NodePresentation {
        NodePresentation {
            kind: PresentationKind::Generic,
            label: node_id.resource_id.clone(),
            subtitle: Some(node_id.resource_type.to_string()),
            icon: ICON_GENERIC.to_string(),
        }
    }
}

impl NodeRenderer for FallbackRenderer {
    fn render(&self, node_id: &NodeId, _entry: &CatalogEntry) -> NodePresentation {
        self.render_bare(node_id)
    }
}

pub struct RendererRegistry {
    renderers: HashMap<ResourceType, Box<dyn NodeRenderer>>,
    fallback: FallbackRenderer,
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl RendererRegistry {
    /// A registry that renders everything through the fallback.
    pub fn empty() -> Self {
        Self {
            renderers: HashMap::new(),
            fallback: FallbackRenderer,
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(ResourceType::App, AppRenderer);
        registry.register(ResourceType::Database, DatabaseRenderer);
        registry.register(ResourceType::CustomResource, CustomResourceRenderer);
        registry
    }

    /// Replaces any renderer already registered for `resource_type`.
    pub fn register<R: NodeRenderer + 'static>(&mut self, resource_type: ResourceType, renderer: R) {
        self.renderers.insert(resource_type, Box::new(renderer));
    }

    pub fn render(&self, node_id: &NodeId, catalogs: &ResourceCatalogs) -> NodePresentation {
        let renderer = self.renderers.get(&node_id.resource_type);
        let entry = catalogs.find_by_id(&node_id.resource_type, &node_id.resource_id);

        match (renderer, entry) {
            (Some(renderer), Some(entry)) => renderer.render(node_id, entry),
            (None, _) => {
                tracing::trace!("No renderer for {}, using fallback", node_id.resource_type);
                self.fallback.render_bare(node_id)
            }
            (Some(_), None) => {
                tracing::trace!("{} is not catalogued, using fallback", node_id);
                self.fallback.render_bare(node_id)
            }
        }
    }
}

pub struct NodeSynthesizer<'a> {
    registry: &'a RendererRegistry,
    stack_spacing: f32,
}

impl<'a> NodeSynthesizer<'a> {
    pub fn new(registry: &'a RendererRegistry, stack_spacing: f32) -> Self {
        Self {
            registry,
            stack_spacing,
        }
    }

    /// Nodes in `node_ids` order, stacked vertically until the layout runs.
    pub fn synthesize(
        &self,
        root: &NodeId,
        node_ids: &[NodeId],
        catalogs: &ResourceCatalogs,
    ) -> Vec<GraphNode> {
        node_ids
            .iter()
            .enumerate()
            .map(|(index, id)| GraphNode {
                id: id.clone(),
                resource_type: id.resource_type.clone(),
                resource_id: id.resource_id.clone(),
                is_root: id == root,
                position: Position::new(0.0, index as f32 * self.stack_spacing),
                size: None,
                presentation: self.registry.render(id, catalogs),
            })
            .collect()
    }
}
