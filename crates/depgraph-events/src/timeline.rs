//! Shared hover instant between the dependency graph and adjacent timeline charts.
//!
//! The value lives in a context handle that callers create per view and pass
//! down explicitly. Clones share the same instant; separate handles never do.

use crate::{Event, EventBus};
use chrono::{DateTime, Utc};
use crossbeam_channel::Sender;
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct TimelineHover {
    hovered: Arc<RwLock<Option<DateTime<Utc>>>>,
    notify: Option<Sender<Event>>,
}

impl TimelineHover {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `TimelineHoverChanged` on `bus` whenever the instant changes.
    pub fn with_bus(bus: &EventBus) -> Self {
        Self {
            hovered: Arc::default(),
            notify: Some(bus.sender()),
        }
    }

    pub fn get(&self) -> Option<DateTime<Utc>> {
        *self.hovered.read()
    }

    pub fn set(&self, at: Option<DateTime<Utc>>) {
        {
            let mut hovered = self.hovered.write();
            if *hovered == at {
                return;
            }
            *hovered = at;
        }

        tracing::trace!(hovered = ?at, "timeline hover changed");
        if let Some(tx) = &self.notify {
            let _ = tx.send(Event::TimelineHoverChanged { at });
        }
    }

    pub fn clear(&self) {
        self.set(None);
    }
}
