//! Change events for the confession table
//!
//! Provides the change-feed event type and the EventBus used by the
//! self-hosted backend to publish row-level changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::model::Confession;

/// Row-level change delivered by a change feed
///
/// Events are best-effort: no replay after a dropped connection, no
/// ordering beyond "arrives after the write it reports".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChangeEvent {
    /// Row inserted or updated; carries the post-change record
    Upserted {
        confession: Confession,
        timestamp: DateTime<Utc>,
    },

    /// Row deleted
    Removed {
        id: Uuid,
        timestamp: DateTime<Utc>,
    },
}

impl ChangeEvent {
    pub fn upserted(confession: Confession) -> Self {
        ChangeEvent::Upserted {
            confession,
            timestamp: Utc::now(),
        }
    }

    pub fn removed(id: Uuid) -> Self {
        ChangeEvent::Removed {
            id,
            timestamp: Utc::now(),
        }
    }

    /// Get event type as string for logging and filtering
    pub fn event_type(&self) -> &str {
        match self {
            ChangeEvent::Upserted { .. } => "Upserted",
            ChangeEvent::Removed { .. } => "Removed",
        }
    }

    /// Id of the affected row
    pub fn confession_id(&self) -> Uuid {
        match self {
            ChangeEvent::Upserted { confession, .. } => confession.id,
            ChangeEvent::Removed { id, .. } => *id,
        }
    }

    /// Whether the event passes the public feed filter (`is_approved = true`)
    ///
    /// Removals always pass: subscribers ignore ids they do not hold.
    pub fn is_public(&self) -> bool {
        match self {
            ChangeEvent::Upserted { confession, .. } => confession.is_approved,
            ChangeEvent::Removed { .. } => true,
        }
    }
}

/// In-process distribution bus for change events
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block writers)
/// - Multiple concurrent subscribers
/// - Lagged subscribers lose the oldest events
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
