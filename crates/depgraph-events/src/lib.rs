use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender, unbounded};
use depgraph_core::{NodeId, ResourceItem, TimeWindow};
use serde::{Deserialize, Serialize};

pub mod telemetry;
pub mod timeline;

pub use timeline::TimelineHover;

/// Which correlation strategy produced a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphVariant {
    /// Whole-organization summary, degraded resources found by title matching.
    Summary,
    /// Single resource view with per-edge anomaly history.
    ResourceDetail,
}

impl GraphVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            GraphVariant::Summary => "summary",
            GraphVariant::ResourceDetail => "resource_detail",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // View inputs
    RootChanged {
        root: ResourceItem,
    },
    TimeWindowChanged {
        window: TimeWindow,
    },
    /// A chart or timeline hovered an instant, or the hover ended.
    TimelineHoverChanged {
        at: Option<DateTime<Utc>>,
    },

    // Graph construction
    GraphBuilt {
        root: NodeId,
        variant: GraphVariant,
        node_count: usize,
        edge_count: usize,
        degraded_edge_count: usize,
        is_ready: bool,
    },
    GraphBuildFailed {
        root: NodeId,
        variant: GraphVariant,
        error: String,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<Event> {
        self.rx.clone()
    }

    /// Queues without bound until `dispatch_to` or a receiver drains it.
    pub fn publish(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    /// Dispatch all pending events to a listener.
    pub fn dispatch_to<L: EventListener>(&self, listener: &mut L) {
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
        }
    }
}

/// Trait for components that respond to events.
pub trait EventListener {
    fn handle_event(&mut self, event: &Event);
}
