//! Records delivered by the diagnostics source and the resource catalogs.

use crate::{NodeId, ResourceType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One diagnostic dashboard, produced for a subject resource at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRecord {
    pub id: String,
    pub resource_id: String,
    pub resource_type: ResourceType,
    pub observation_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub data: DiagnosticData,
}

impl DashboardRecord {
    /// The resource this dashboard was generated for.
    pub fn subject(&self) -> NodeId {
        NodeId::new(self.resource_type.clone(), self.resource_id.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticData {
    #[serde(default)]
    pub ranked_plots: Vec<RankedPlot>,
    /// Keyed by resource label; iteration order is the sorted label order.
    #[serde(default)]
    pub resources: BTreeMap<String, DiagnosticResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedPlot {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub resource_label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticResource {
    #[serde(default)]
    pub edge_id: Option<String>,
    #[serde(default)]
    pub analysis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub handle: String,
    /// Database engine or external resource kind, when the catalog knows it.
    #[serde(default)]
    pub subtype: Option<String>,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            handle: handle.into(),
            subtype: None,
        }
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }
}

/// Known resources per type, already loaded by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCatalogs {
    #[serde(default)]
    pub apps: Vec<CatalogEntry>,
    #[serde(default)]
    pub databases: Vec<CatalogEntry>,
    #[serde(default)]
    pub custom_resources: Vec<CatalogEntry>,
}

impl ResourceCatalogs {
    pub fn catalog(&self, resource_type: &ResourceType) -> Option<&[CatalogEntry]> {
        match resource_type {
            ResourceType::App => Some(&self.apps),
            ResourceType::Database => Some(&self.databases),
            ResourceType::CustomResource => Some(&self.custom_resources),
            ResourceType::Other(_) => None,
        }
    }

    /// Exact handle match. When several entries share a handle the first one wins.
    pub fn find_by_handle(
        &self,
        resource_type: &ResourceType,
        handle: &str,
    ) -> Option<&CatalogEntry> {
        self.catalog(resource_type)?
            .iter()
            .find(|entry| entry.handle == handle)
    }

    pub fn find_by_id(&self, resource_type: &ResourceType, id: &str) -> Option<&CatalogEntry> {
        self.catalog(resource_type)?
            .iter()
            .find(|entry| entry.id == id)
    }
}
