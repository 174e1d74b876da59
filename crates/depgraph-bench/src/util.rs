use chrono::{Duration, TimeZone, Utc};
use depgraph_core::{
    CatalogEntry, DashboardRecord, DiagnosticData, DiagnosticResource, Edge, NodeId, RankedPlot,
    ResourceCatalogs, ResourceItem, ResourceType,
};
use depgraph_graph::{GraphInputs, GraphModel};
use std::collections::BTreeMap;

fn resource(index: usize) -> ResourceItem {
    match index % 3 {
        0 => ResourceItem::app(format!("app_{index}")),
        1 => ResourceItem::database(format!("db_{index}")),
        _ => ResourceItem::new(ResourceType::CustomResource, format!("cr_{index}")),
    }
}

/// A layered fan-out: every resource depends on the next `fan_out` resources,
/// with an occasional back edge so cycle handling is exercised.
pub fn generate_synthetic_edges(resource_count: usize, fan_out: usize) -> Vec<Edge> {
    let mut edges = Vec::with_capacity(resource_count * (fan_out + 1));
    for i in 0..resource_count {
        for step in 1..=fan_out {
            let target = i + step;
            if target >= resource_count {
                break;
            }
            edges.push(Edge::between(
                format!("e_{i}_{target}"),
                &resource(i),
                &resource(target),
                "depends_on",
            ));
        }
        if i > 0 && i % 10 == 0 {
            edges.push(Edge::between(
                format!("back_{i}"),
                &resource(i),
                &resource(i - 10),
                "notifies",
            ));
        }
    }
    edges
}

pub fn generate_catalogs(resource_count: usize) -> ResourceCatalogs {
    let mut catalogs = ResourceCatalogs::default();
    for i in 0..resource_count {
        let item = resource(i);
        let entry = CatalogEntry::new(item.id.clone(), item.id.clone());
        match item.resource_type {
            ResourceType::App => catalogs.apps.push(entry),
            ResourceType::Database => catalogs.databases.push(entry.with_subtype("postgres")),
            _ => catalogs.custom_resources.push(entry),
        }
    }
    catalogs
}

/// One dashboard per app, each naming a neighbouring resource and recording an edge finding.
pub fn generate_dashboards(
    resource_count: usize,
    edges: &[Edge],
) -> anyhow::Result<Vec<DashboardRecord>> {
    let base = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| anyhow::anyhow!("invalid base timestamp"))?;
    let dashboards: Vec<DashboardRecord> = (0..resource_count)
        .step_by(3)
        .enumerate()
        .map(|(n, i)| {
            let neighbour = resource(i + 1);
            let mut resources = BTreeMap::new();
            if let Some(edge) = edges.get(n) {
                resources.insert(
                    neighbour.id.clone(),
                    DiagnosticResource {
                        edge_id: Some(edge.id.clone()),
                        analysis: Some("latency regression".to_string()),
                    },
                );
            }
            DashboardRecord {
                id: format!("dash_{i}"),
                resource_id: format!("app_{i}"),
                resource_type: ResourceType::App,
                observation_timestamp: base + Duration::minutes(n as i64),
                data: DiagnosticData {
                    ranked_plots: vec![RankedPlot {
                        title: format!("Slow queries in {} {}", neighbour.resource_type, neighbour.id),
                        description: "p99 above threshold".to_string(),
                        resource_label: Some(neighbour.id),
                    }],
                    resources,
                },
            }
        })
        .collect();
    Ok(dashboards)
}

pub fn generate_inputs(resource_count: usize, fan_out: usize) -> anyhow::Result<GraphInputs> {
    let edges = generate_synthetic_edges(resource_count, fan_out);
    let dashboards = generate_dashboards(resource_count, &edges)?;
    Ok(GraphInputs::new(resource(0))
        .with_catalogs(generate_catalogs(resource_count))
        .with_edges(edges)
        .with_dashboards(dashboards))
}

pub fn generate_layout_model(resource_count: usize, fan_out: usize) -> GraphModel {
    let mut model = GraphModel::new();
    for i in 0..resource_count {
        model.add_node(NodeId::from(&resource(i)), None);
    }
    for edge in generate_synthetic_edges(resource_count, fan_out) {
        model.add_edge(&NodeId::source_of(&edge), &NodeId::destination_of(&edge));
    }
    model
}
