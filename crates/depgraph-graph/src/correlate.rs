//! Joins diagnostic dashboards onto dependency edges.
//!
//! Two strategies exist side by side and are not reconciled:
//!
//! * [`CorrelationStrategy::TitleHeuristic`] (summary view) parses free-text plot
//!   titles such as `"High CPU in app checkout-worker"` and matches the trailing
//!   resource against the catalogs by handle.
//! * [`CorrelationStrategy::ExplicitIndex`] (resource detail view) trusts the
//!   `edge_id` recorded on dashboard resource entries and keeps a short anomaly
//!   history per edge.
//!
//! The two can disagree for the same inputs. Callers pick one per graph.

use chrono::{DateTime, TimeDelta, Utc};
use depgraph_core::{
    AnomalyObservation, CatalogEntry, DashboardRecord, DegradedResource, EdgeClassification,
    GraphEdge, NodeId, ResourceCatalogs, ResourceType, TimeWindow,
};
use depgraph_events::GraphVariant;
use std::collections::{BTreeMap, HashMap, HashSet};

pub const DEFAULT_ANOMALY_LABEL: &str = "Anomaly found";
pub const MAX_ANOMALY_HISTORY: usize = 3;

const TITLE_RESOURCE_DELIMITER: &str = " in ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CorrelationStrategy {
    TitleHeuristic,
    ExplicitIndex,
}

impl CorrelationStrategy {
    pub fn variant(self) -> GraphVariant {
        match self {
            CorrelationStrategy::TitleHeuristic => GraphVariant::Summary,
            CorrelationStrategy::ExplicitIndex => GraphVariant::ResourceDetail,
        }
    }
}

/// Edge id to observations, newest first, at most [`MAX_ANOMALY_HISTORY`] each.
pub type AnomalyIndex = BTreeMap<String, Vec<AnomalyObservation>>;

/// Resolves the resource named at the end of a plot title.
///
/// Only `app` and `database` are recognised, matched by exact handle.
pub fn resolve_resource_from_title<'c>(
    title: &str,
    catalogs: &'c ResourceCatalogs,
) -> Option<(ResourceType, &'c CatalogEntry)> {
    let (_, described) = title.rsplit_once(TITLE_RESOURCE_DELIMITER)?;
    let mut words = described.split_whitespace();
    let type_word = words.next()?;
    let handle = words.next()?;

    let resource_type = match type_word {
        "app" => ResourceType::App,
        "database" => ResourceType::Database,
        _ => return None,
    };
    let entry = catalogs.find_by_handle(&resource_type, handle)?;
    Some((resource_type, entry))
}

fn label_or_default(text: &str) -> String {
    if text.trim().is_empty() {
        DEFAULT_ANOMALY_LABEL.to_string()
    } else {
        text.to_string()
    }
}

fn newest_first<'d>(dashboards: &'d [DashboardRecord], window: &TimeWindow) -> Vec<&'d DashboardRecord> {
    let mut in_window: Vec<&DashboardRecord> = dashboards
        .iter()
        .filter(|dashboard| window.contains(dashboard.observation_timestamp))
        .collect();
    in_window.sort_by(|a, b| {
        b.observation_timestamp
            .cmp(&a.observation_timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });
    in_window
}

/// Title heuristic: resources named by ranked plots, excluding each dashboard's own subject.
///
/// Dashboards are scanned newest first, so when several findings name the same
/// resource the newest description is kept.
pub fn find_degraded_resources(
    dashboards: &[DashboardRecord],
    catalogs: &ResourceCatalogs,
    window: &TimeWindow,
) -> Vec<DegradedResource> {
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut found = Vec::new();

    for dashboard in newest_first(dashboards, window) {
        let subject = dashboard.subject();
        for plot in &dashboard.data.ranked_plots {
            let Some((resource_type, entry)) = resolve_resource_from_title(&plot.title, catalogs)
            else {
                tracing::trace!(
                    dashboard = %dashboard.id,
                    title = %plot.title,
                    "plot title does not name a catalogued resource"
                );
                continue;
            };

            let node_id = NodeId::new(resource_type.clone(), entry.id.clone());
            if node_id == subject {
                tracing::trace!(dashboard = %dashboard.id, "skipping finding about the dashboard subject");
                continue;
            }
            if !seen.insert(node_id) {
                continue;
            }

            found.push(DegradedResource {
                resource_id: entry.id.clone(),
                resource_type,
                handle: entry.handle.clone(),
                description: label_or_default(&plot.description),
            });
        }
    }

    found
}

/// Marks every edge whose destination is degraded. Returns the number of edges changed.
pub fn apply_degraded_resources(edges: &mut [GraphEdge], degraded: &[DegradedResource]) -> usize {
    let by_node: HashMap<NodeId, &DegradedResource> = degraded
        .iter()
        .map(|resource| (resource.node_id(), resource))
        .collect();

    let mut changed = 0;
    for edge in edges.iter_mut() {
        if let Some(resource) = by_node.get(&edge.target) {
            edge.classification = EdgeClassification::Degraded;
            edge.relationship_label = resource.description.clone();
            changed += 1;
        }
    }
    changed
}

/// Explicit index: observations per edge id from dashboard resource entries.
pub fn build_anomaly_index(dashboards: &[DashboardRecord], window: &TimeWindow) -> AnomalyIndex {
    let mut index = AnomalyIndex::new();

    for dashboard in dashboards
        .iter()
        .filter(|dashboard| window.contains(dashboard.observation_timestamp))
    {
        for (resource_label, resource) in &dashboard.data.resources {
            let Some(edge_id) = resource.edge_id.as_ref() else {
                continue;
            };

            let label = resource
                .analysis
                .as_deref()
                .filter(|analysis| !analysis.trim().is_empty())
                .or_else(|| {
                    dashboard
                        .data
                        .ranked_plots
                        .iter()
                        .find(|plot| plot.resource_label.as_deref() == Some(resource_label.as_str()))
                        .map(|plot| plot.description.as_str())
                })
                .map(label_or_default)
                .unwrap_or_else(|| DEFAULT_ANOMALY_LABEL.to_string());

            index
                .entry(edge_id.clone())
                .or_default()
                .push(AnomalyObservation {
                    dashboard_id: dashboard.id.clone(),
                    timestamp: dashboard.observation_timestamp,
                    label,
                });
        }
    }

    for history in index.values_mut() {
        history.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.dashboard_id.cmp(&b.dashboard_id))
        });
        // One observation per instant.
        history.dedup_by(|later, kept| later.timestamp == kept.timestamp);
        history.truncate(MAX_ANOMALY_HISTORY);
    }

    index
}

/// Attaches anomaly history to matching edges. Returns the number of edges changed.
pub fn apply_anomaly_index(edges: &mut [GraphEdge], index: &AnomalyIndex) -> usize {
    let mut changed = 0;
    for edge in edges.iter_mut() {
        let Some(history) = index.get(&edge.id).filter(|history| !history.is_empty()) else {
            continue;
        };
        edge.anomaly_history = Some(history.clone());
        edge.classification = EdgeClassification::Degraded;
        changed += 1;
    }
    changed
}

/// Observations within `tolerance` of a hovered instant, newest first.
pub fn observations_near(
    history: &[AnomalyObservation],
    at: DateTime<Utc>,
    tolerance: TimeDelta,
) -> Vec<&AnomalyObservation> {
    let mut near: Vec<&AnomalyObservation> = history
        .iter()
        .filter(|observation| {
            let delta = observation.timestamp.signed_duration_since(at);
            delta <= tolerance && delta >= -tolerance
        })
        .collect();
    near.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    near
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use depgraph_core::{DiagnosticData, DiagnosticResource, Edge, RankedPlot, ResourceItem};
    use proptest::prelude::*;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 9, minute, 0).unwrap()
    }

    fn catalogs() -> ResourceCatalogs {
        ResourceCatalogs {
            apps: vec![
                CatalogEntry::new("api", "api"),
                CatalogEntry::new("cw", "checkout-worker"),
            ],
            databases: vec![CatalogEntry::new("db1", "orders")],
            custom_resources: vec![],
        }
    }

    fn plot(title: &str, description: &str) -> RankedPlot {
        RankedPlot {
            title: title.to_string(),
            description: description.to_string(),
            resource_label: None,
        }
    }

    fn dashboard(id: &str, subject: &str, minute: u32, plots: Vec<RankedPlot>) -> DashboardRecord {
        DashboardRecord {
            id: id.to_string(),
            resource_id: subject.to_string(),
            resource_type: ResourceType::App,
            observation_timestamp: at(minute),
            data: DiagnosticData {
                ranked_plots: plots,
                resources: BTreeMap::new(),
            },
        }
    }

    fn graph_edge(id: &str, source: ResourceItem, target: ResourceItem) -> GraphEdge {
        GraphEdge::from_edge(&Edge::between(id, &source, &target, "calls"))
    }

    #[test]
    fn test_resolve_resource_from_title() {
        let catalogs = catalogs();

        let (resource_type, entry) =
            resolve_resource_from_title("High CPU in app checkout-worker", &catalogs).unwrap();
        assert_eq!(resource_type, ResourceType::App);
        assert_eq!(entry.id, "cw");

        let (resource_type, entry) =
            resolve_resource_from_title("Slow queries in database orders", &catalogs).unwrap();
        assert_eq!(resource_type, ResourceType::Database);
        assert_eq!(entry.id, "db1");
    }

    #[test]
    fn test_resolve_uses_last_delimiter() {
        let catalogs = catalogs();
        let found = resolve_resource_from_title("Errors in login in app api", &catalogs);
        assert_eq!(found.map(|(_, entry)| entry.id.as_str()), Some("api"));
    }

    #[test]
    fn test_unresolvable_titles() {
        let catalogs = catalogs();
        assert!(resolve_resource_from_title("High CPU", &catalogs).is_none());
        assert!(resolve_resource_from_title("High CPU in app", &catalogs).is_none());
        assert!(resolve_resource_from_title("High CPU in queue jobs", &catalogs).is_none());
        assert!(resolve_resource_from_title("High CPU in app unknown", &catalogs).is_none());
    }

    #[test]
    fn test_degraded_resource_found_for_other_resource() {
        let dashboards = vec![dashboard(
            "d1",
            "api",
            0,
            vec![plot("High CPU in app checkout-worker", "CPU is pegged")],
        )];

        let degraded = find_degraded_resources(&dashboards, &catalogs(), &TimeWindow::unbounded());

        assert_eq!(degraded.len(), 1);
        assert_eq!(degraded[0].resource_id, "cw");
        assert_eq!(degraded[0].handle, "checkout-worker");
        assert_eq!(degraded[0].description, "CPU is pegged");
    }

    #[test]
    fn test_dashboard_subject_is_excluded() {
        let dashboards = vec![dashboard(
            "d1",
            "cw",
            0,
            vec![plot("High CPU in app checkout-worker", "CPU is pegged")],
        )];

        let degraded = find_degraded_resources(&dashboards, &catalogs(), &TimeWindow::unbounded());
        assert!(degraded.is_empty());
    }

    #[test]
    fn test_empty_description_uses_default_label() {
        let dashboards = vec![dashboard("d1", "api", 0, vec![plot("Locks in database orders", "")])];

        let degraded = find_degraded_resources(&dashboards, &catalogs(), &TimeWindow::unbounded());
        assert_eq!(degraded[0].description, DEFAULT_ANOMALY_LABEL);
    }

    #[test]
    fn test_newest_finding_wins() {
        let dashboards = vec![
            dashboard("old", "api", 1, vec![plot("x in database orders", "older")]),
            dashboard("new", "api", 5, vec![plot("y in database orders", "newer")]),
        ];

        let degraded = find_degraded_resources(&dashboards, &catalogs(), &TimeWindow::unbounded());
        assert_eq!(degraded.len(), 1);
        assert_eq!(degraded[0].description, "newer");
    }

    #[test]
    fn test_time_window_filters_dashboards() {
        let dashboards = vec![
            dashboard("early", "api", 1, vec![plot("x in database orders", "early")]),
            dashboard("late", "api", 30, vec![plot("y in app checkout-worker", "late")]),
        ];

        let degraded =
            find_degraded_resources(&dashboards, &catalogs(), &TimeWindow::between(at(0), at(10)));
        assert_eq!(degraded.len(), 1);
        assert_eq!(degraded[0].description, "early");
    }

    #[test]
    fn test_apply_degraded_resources_matches_destination() {
        let mut edges = vec![
            graph_edge("1", ResourceItem::app("api"), ResourceItem::app("cw")),
            graph_edge("2", ResourceItem::app("cw"), ResourceItem::app("api")),
        ];
        let degraded = vec![DegradedResource {
            resource_id: "cw".to_string(),
            resource_type: ResourceType::App,
            handle: "checkout-worker".to_string(),
            description: "CPU is pegged".to_string(),
        }];

        let changed = apply_degraded_resources(&mut edges, &degraded);

        assert_eq!(changed, 1);
        assert!(edges[0].is_degraded());
        assert_eq!(edges[0].relationship_label, "CPU is pegged");
        assert!(!edges[1].is_degraded());
        assert_eq!(edges[1].relationship_label, "calls");
    }

    fn indexed_dashboard(
        id: &str,
        minute: u32,
        entries: Vec<(&str, Option<&str>, Option<&str>)>,
        plots: Vec<RankedPlot>,
    ) -> DashboardRecord {
        let resources = entries
            .into_iter()
            .map(|(label, edge_id, analysis)| {
                (
                    label.to_string(),
                    DiagnosticResource {
                        edge_id: edge_id.map(str::to_string),
                        analysis: analysis.map(str::to_string),
                    },
                )
            })
            .collect();
        DashboardRecord {
            id: id.to_string(),
            resource_id: "api".to_string(),
            resource_type: ResourceType::App,
            observation_timestamp: at(minute),
            data: DiagnosticData {
                ranked_plots: plots,
                resources,
            },
        }
    }

    #[test]
    fn test_anomaly_label_precedence() {
        let labelled_plot = RankedPlot {
            title: "Latency".to_string(),
            description: "p99 doubled".to_string(),
            resource_label: Some("db".to_string()),
        };
        let dashboards = vec![indexed_dashboard(
            "d1",
            0,
            vec![
                ("cache", Some("e1"), Some("evictions spiking")),
                ("db", Some("e2"), None),
                ("queue", Some("e3"), None),
                ("orphan", None, Some("ignored")),
            ],
            vec![labelled_plot],
        )];

        let index = build_anomaly_index(&dashboards, &TimeWindow::unbounded());

        assert_eq!(index.len(), 3);
        assert_eq!(index["e1"][0].label, "evictions spiking");
        assert_eq!(index["e2"][0].label, "p99 doubled");
        assert_eq!(index["e3"][0].label, DEFAULT_ANOMALY_LABEL);
    }

    #[test]
    fn test_anomaly_history_is_newest_first_unique_and_capped() {
        let dashboards: Vec<DashboardRecord> = [1, 4, 4, 2, 9, 6]
            .iter()
            .enumerate()
            .map(|(i, &minute)| {
                indexed_dashboard(&format!("d{i}"), minute, vec![("db", Some("e1"), Some("slow"))], vec![])
            })
            .collect();

        let index = build_anomaly_index(&dashboards, &TimeWindow::unbounded());
        let stamps: Vec<DateTime<Utc>> = index["e1"].iter().map(|o| o.timestamp).collect();

        assert_eq!(stamps, vec![at(9), at(6), at(4)]);
    }

    #[test]
    fn test_apply_anomaly_index_sets_history() {
        let mut edges = vec![
            graph_edge("e1", ResourceItem::app("api"), ResourceItem::database("db1")),
            graph_edge("e2", ResourceItem::app("api"), ResourceItem::app("cw")),
        ];
        let dashboards = vec![indexed_dashboard("d1", 3, vec![("db", Some("e1"), None)], vec![])];
        let index = build_anomaly_index(&dashboards, &TimeWindow::unbounded());

        assert_eq!(apply_anomaly_index(&mut edges, &index), 1);
        assert!(edges[0].is_degraded());
        assert_eq!(edges[0].anomaly_history.as_ref().map(Vec::len), Some(1));
        assert!(edges[1].anomaly_history.is_none());
        assert!(!edges[1].is_degraded());
    }

    #[test]
    fn test_observations_near_hovered_instant() {
        let history = vec![
            AnomalyObservation {
                dashboard_id: "a".to_string(),
                timestamp: at(10),
                label: "a".to_string(),
            },
            AnomalyObservation {
                dashboard_id: "b".to_string(),
                timestamp: at(12),
                label: "b".to_string(),
            },
            AnomalyObservation {
                dashboard_id: "c".to_string(),
                timestamp: at(30),
                label: "c".to_string(),
            },
        ];

        let near = observations_near(&history, at(11), TimeDelta::minutes(1));
        let ids: Vec<&str> = near.iter().map(|o| o.dashboard_id.as_str()).collect();

        assert_eq!(ids, vec!["b", "a"]);
        assert!(observations_near(&history, at(20), TimeDelta::minutes(1)).is_empty());
    }

    #[test]
    fn test_strategy_variants() {
        assert_eq!(CorrelationStrategy::TitleHeuristic.variant(), GraphVariant::Summary);
        assert_eq!(CorrelationStrategy::ExplicitIndex.variant(), GraphVariant::ResourceDetail);
    }

    proptest! {
        #[test]
        fn prop_anomaly_history_capped_and_ordered(minutes in proptest::collection::vec(0u32..60, 0..20)) {
            let dashboards: Vec<DashboardRecord> = minutes
                .iter()
                .enumerate()
                .map(|(i, &minute)| indexed_dashboard(&format!("d{i}"), minute, vec![("db", Some("e1"), None)], vec![]))
                .collect();

            let index = build_anomaly_index(&dashboards, &TimeWindow::unbounded());

            match index.get("e1") {
                None => prop_assert!(minutes.is_empty()),
                Some(history) => {
                    prop_assert!(history.len() <= MAX_ANOMALY_HISTORY);
                    for pair in history.windows(2) {
                        prop_assert!(pair[0].timestamp > pair[1].timestamp);
                    }
                    let newest = minutes.iter().max().copied().map(at);
                    prop_assert_eq!(history.first().map(|o| o.timestamp), newest);
                }
            }
        }
    }
}
