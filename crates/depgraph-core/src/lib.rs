use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

pub mod diagnostics;
pub mod error;
pub mod identity;

pub use diagnostics::{
    CatalogEntry, DashboardRecord, DiagnosticData, DiagnosticResource, RankedPlot,
    ResourceCatalogs,
};
pub use error::IdentityError;
pub use identity::{ID_DELIMITER, NodeId, generate_id, parse_id};

/// Kind of infrastructure entity a node stands for.
///
/// Unrecognised type strings are kept verbatim in [`ResourceType::Other`] so the
/// graph can still render them through the fallback renderer.
///
/// Equality, ordering and hashing go through the type string, so
/// `Other("app")` is the same type as `App`. [`ResourceType::normalized`]
/// turns such values into their known variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceType {
    App,
    Database,
    CustomResource,
    Other(String),
}

impl ResourceType {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::App => "app",
            ResourceType::Database => "database",
            ResourceType::CustomResource => "custom_resource",
            ResourceType::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(ResourceType::from(self.as_str()), ResourceType::Other(_))
    }

    pub fn normalized(self) -> Self {
        match self {
            ResourceType::Other(raw) => ResourceType::from(raw),
            known => known,
        }
    }
}

impl PartialEq for ResourceType {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for ResourceType {}

impl PartialOrd for ResourceType {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResourceType {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Hash for ResourceType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl From<&str> for ResourceType {
    fn from(value: &str) -> Self {
        match value {
            "app" => ResourceType::App,
            "database" => ResourceType::Database,
            "custom_resource" => ResourceType::CustomResource,
            other => ResourceType::Other(other.to_string()),
        }
    }
}

impl From<String> for ResourceType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "app" | "database" | "custom_resource" => ResourceType::from(value.as_str()),
            _ => ResourceType::Other(value),
        }
    }
}

impl From<ResourceType> for String {
    fn from(value: ResourceType) -> Self {
        match value {
            ResourceType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resource a graph is rooted at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceItem {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub id: String,
}

impl ResourceItem {
    pub fn new(resource_type: ResourceType, id: impl Into<String>) -> Self {
        Self {
            resource_type,
            id: id.into(),
        }
    }

    pub fn app(id: impl Into<String>) -> Self {
        Self::new(ResourceType::App, id)
    }

    pub fn database(id: impl Into<String>) -> Self {
        Self::new(ResourceType::Database, id)
    }
}

/// A directed dependency between two resources, as delivered by the edge source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source_resource_type: ResourceType,
    pub source_resource_id: String,
    pub destination_resource_type: ResourceType,
    pub destination_resource_id: String,
    pub relationship_type: String,
}

impl Edge {
    pub fn between(
        id: impl Into<String>,
        source: &ResourceItem,
        destination: &ResourceItem,
        relationship_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_resource_type: source.resource_type.clone(),
            source_resource_id: source.id.clone(),
            destination_resource_type: destination.resource_type.clone(),
            destination_resource_id: destination.id.clone(),
            relationship_type: relationship_type.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationKind {
    App,
    Database,
    CustomResource,
    Generic,
}

/// What the rendering surface draws inside a node box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePresentation {
    pub kind: PresentationKind,
    pub label: String,
    pub subtitle: Option<String>,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub resource_type: ResourceType,
    pub resource_id: String,
    pub is_root: bool,
    pub position: Position,
    pub size: Option<Size>,
    pub presentation: NodePresentation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeClassification {
    #[default]
    Normal,
    Degraded,
}

/// One anomaly finding attached to a degraded edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyObservation {
    pub dashboard_id: String,
    pub timestamp: DateTime<Utc>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    pub classification: EdgeClassification,
    pub relationship_label: String,
    pub anomaly_history: Option<Vec<AnomalyObservation>>,
}

impl GraphEdge {
    pub fn from_edge(edge: &Edge) -> Self {
        Self {
            id: edge.id.clone(),
            source: NodeId::source_of(edge),
            target: NodeId::destination_of(edge),
            classification: EdgeClassification::Normal,
            relationship_label: edge.relationship_type.clone(),
            anomaly_history: None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.classification == EdgeClassification::Degraded
    }
}

/// A resource that a diagnostic finding points at. Derived per build, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedResource {
    pub resource_id: String,
    pub resource_type: ResourceType,
    pub handle: String,
    pub description: String,
}

impl DegradedResource {
    pub fn node_id(&self) -> NodeId {
        NodeId::new(self.resource_type.clone(), self.resource_id.clone())
    }
}

/// Error type for enum conversion failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnumConversionError {
    #[error("Invalid LayoutDirection value: {0}")]
    InvalidLayoutDirection(String),
}

/// Flow direction of the layered layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LayoutDirection {
    #[default]
    #[serde(rename = "TB")]
    TopBottom,
    #[serde(rename = "BT")]
    BottomTop,
    #[serde(rename = "LR")]
    LeftRight,
    #[serde(rename = "RL")]
    RightLeft,
}

impl LayoutDirection {
    pub const ALL: [LayoutDirection; 4] = [
        LayoutDirection::TopBottom,
        LayoutDirection::BottomTop,
        LayoutDirection::LeftRight,
        LayoutDirection::RightLeft,
    ];

    /// Ranks advance along the x axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, LayoutDirection::LeftRight | LayoutDirection::RightLeft)
    }

    /// Ranks advance towards negative coordinates.
    pub fn is_reversed(self) -> bool {
        matches!(self, LayoutDirection::BottomTop | LayoutDirection::RightLeft)
    }
}

impl FromStr for LayoutDirection {
    type Err = EnumConversionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TB" | "TD" => Ok(LayoutDirection::TopBottom),
            "BT" => Ok(LayoutDirection::BottomTop),
            "LR" => Ok(LayoutDirection::LeftRight),
            "RL" => Ok(LayoutDirection::RightLeft),
            _ => Err(EnumConversionError::InvalidLayoutDirection(
                value.to_string(),
            )),
        }
    }
}

/// Bounds of the active time window. An open bound is unbounded; both bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn since(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| at >= start) && self.end.is_none_or(|end| at <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_resource_type_parses_known_and_unknown() {
        assert_eq!(ResourceType::from("app"), ResourceType::App);
        assert_eq!(ResourceType::from("database"), ResourceType::Database);
        assert_eq!(
            ResourceType::from("custom_resource"),
            ResourceType::CustomResource
        );
        assert_eq!(
            ResourceType::from("stack"),
            ResourceType::Other("stack".to_string())
        );
        assert!(!ResourceType::from("stack").is_known());
    }

    #[test]
    fn test_edge_deserializes_from_camel_case() {
        let json = r#"{
            "id": "e1",
            "sourceResourceType": "app",
            "sourceResourceId": "42",
            "destinationResourceType": "database",
            "destinationResourceId": "7",
            "relationshipType": "connects_to"
        }"#;
        let edge: Edge = serde_json::from_str(json).expect("edge should parse");
        assert_eq!(edge.source_resource_type, ResourceType::App);
        assert_eq!(edge.destination_resource_type, ResourceType::Database);
        assert_eq!(edge.relationship_type, "connects_to");
    }

    #[test]
    fn test_resource_item_uses_type_key() {
        let item: ResourceItem =
            serde_json::from_str(r#"{"type":"custom_resource","id":"9"}"#).unwrap();
        assert_eq!(item.resource_type, ResourceType::CustomResource);
        let json = serde_json::to_string(&ResourceItem::app("1")).unwrap();
        assert_eq!(json, r#"{"type":"app","id":"1"}"#);
    }

    #[test]
    fn test_layout_direction_from_str() {
        assert_eq!(
            "lr".parse::<LayoutDirection>(),
            Ok(LayoutDirection::LeftRight)
        );
        assert_eq!(
            "TD".parse::<LayoutDirection>(),
            Ok(LayoutDirection::TopBottom)
        );
        assert!("diagonal".parse::<LayoutDirection>().is_err());
        assert!(LayoutDirection::RightLeft.is_horizontal());
        assert!(LayoutDirection::RightLeft.is_reversed());
        assert!(!LayoutDirection::TopBottom.is_reversed());
    }

    #[test]
    fn test_time_window_bounds_are_inclusive() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        let window = TimeWindow::between(start, end);

        assert!(window.contains(start));
        assert!(window.contains(end));
        assert!(!window.contains(end + chrono::Duration::seconds(1)));
        assert!(TimeWindow::unbounded().contains(start));
        assert!(!TimeWindow::since(end).contains(start));
    }
}
