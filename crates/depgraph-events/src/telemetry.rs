use crate::GraphVariant;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info};
use uuid::Uuid;

const TELEMETRY_TARGET: &str = "depgraph::events::telemetry";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BuildLifecycle {
    Start,
    Success,
    Failure,
}

impl fmt::Display for BuildLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "build_start"),
            Self::Success => write!(f, "build_success"),
            Self::Failure => write!(f, "build_failure"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildTelemetry {
    pub correlation_id: String,
    pub root: String,
    pub variant: GraphVariant,
    pub lifecycle: BuildLifecycle,
    pub error_reason: Option<String>,
    pub duration_ms: Option<u128>,
    pub node_count: Option<usize>,
    pub edge_count: Option<usize>,
}

impl BuildTelemetry {
    fn new(
        root: &str,
        variant: GraphVariant,
        correlation_id: &str,
        lifecycle: BuildLifecycle,
    ) -> Self {
        Self {
            correlation_id: correlation_id.to_string(),
            root: root.to_string(),
            variant,
            lifecycle,
            error_reason: None,
            duration_ms: None,
            node_count: None,
            edge_count: None,
        }
    }

    pub fn start(root: &str, variant: GraphVariant, correlation_id: &str) -> Self {
        Self::new(root, variant, correlation_id, BuildLifecycle::Start)
    }

    pub fn success(
        root: &str,
        variant: GraphVariant,
        correlation_id: &str,
        counts: (usize, usize),
        duration_ms: Option<u128>,
    ) -> Self {
        let mut telemetry = Self::new(root, variant, correlation_id, BuildLifecycle::Success);
        telemetry.node_count = Some(counts.0);
        telemetry.edge_count = Some(counts.1);
        telemetry.duration_ms = duration_ms;
        telemetry
    }

    pub fn failure(
        root: &str,
        variant: GraphVariant,
        correlation_id: &str,
        reason: Option<String>,
    ) -> Self {
        let mut telemetry = Self::new(root, variant, correlation_id, BuildLifecycle::Failure);
        telemetry.error_reason = reason;
        telemetry
    }

    fn now_unix_ms() -> u128 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default()
    }
}

pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn build_start(root: &str, variant: GraphVariant, correlation_id: &str) -> BuildTelemetry {
    let telemetry = BuildTelemetry::start(root, variant, correlation_id);
    info!(
        target: TELEMETRY_TARGET,
        root = %telemetry.root,
        variant = telemetry.variant.as_str(),
        correlation_id = %telemetry.correlation_id,
        lifecycle = %telemetry.lifecycle,
        timestamp_ms = BuildTelemetry::now_unix_ms(),
        "build_start"
    );
    telemetry
}

pub fn build_success(
    root: &str,
    variant: GraphVariant,
    correlation_id: &str,
    counts: (usize, usize),
    duration_ms: Option<u128>,
) -> BuildTelemetry {
    let telemetry = BuildTelemetry::success(root, variant, correlation_id, counts, duration_ms);
    info!(
        target: TELEMETRY_TARGET,
        root = %telemetry.root,
        variant = telemetry.variant.as_str(),
        correlation_id = %telemetry.correlation_id,
        lifecycle = %telemetry.lifecycle,
        node_count = ?telemetry.node_count,
        edge_count = ?telemetry.edge_count,
        duration_ms = ?telemetry.duration_ms,
        timestamp_ms = BuildTelemetry::now_unix_ms(),
        "build_success"
    );
    telemetry
}

pub fn build_failure(
    root: &str,
    variant: GraphVariant,
    correlation_id: &str,
    reason: Option<String>,
) -> BuildTelemetry {
    let telemetry = BuildTelemetry::failure(root, variant, correlation_id, reason);
    let error_reason = telemetry.error_reason.as_deref().unwrap_or("unclassified");

    error!(
        target: TELEMETRY_TARGET,
        root = %telemetry.root,
        variant = telemetry.variant.as_str(),
        correlation_id = %telemetry.correlation_id,
        lifecycle = %telemetry.lifecycle,
        error = %error_reason,
        timestamp_ms = BuildTelemetry::now_unix_ms(),
        "build_failure"
    );

    telemetry
}

pub fn debug_context(root: &str, correlation_id: &str, context: &str) {
    debug!(
        target: TELEMETRY_TARGET,
        root = %root,
        correlation_id = %correlation_id,
        context = %context,
        timestamp_ms = BuildTelemetry::now_unix_ms(),
        "build_context"
    );
}
