//! Local SQLite gateway
//!
//! Self-hosted stand-in for the hosted service. Writes go through the
//! shared `db` queries and are announced on an in-process EventBus.
//!
//! The change feed forwards those pushes and also polls the table, so
//! writes from other processes on the same file are reported too.

use std::path::Path;
use std::time::Duration;

use confess_common::db;
use confess_common::{ChangeEvent, Confession, Error, EventBus, NewConfession, Result};
use sqlx::SqlitePool;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::gateway::{ConfessionGateway, FeedSnapshot, Subscription, SUBSCRIPTION_BUFFER};

/// EventBus capacity; lagging subscribers lose the oldest events
const EVENT_BUS_CAPACITY: usize = 256;

/// Default period for polling writes made by other processes
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct SqliteGateway {
    pool: SqlitePool,
    events: EventBus,
    poll_interval: Duration,
}

impl SqliteGateway {
    /// Open (or create) the database file
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = db::init_database(path).await?;
        Ok(Self::with_pool(pool))
    }

    /// Fresh in-memory database
    pub async fn in_memory() -> Result<Self> {
        let pool = db::init_memory_database().await?;
        Ok(Self::with_pool(pool))
    }

    /// Wrap a pool whose schema is already in place
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            events: EventBus::new(EVENT_BUS_CAPACITY),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Period of the change-feed poll of the table
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Announce the current state of a row after a write
    async fn publish_row(&self, id: Uuid) -> Result<()> {
        if let Some(confession) = db::get_by_id(&self.pool, id).await? {
            self.publish(ChangeEvent::upserted(confession));
        }
        Ok(())
    }

    fn publish(&self, event: ChangeEvent) {
        if !event.is_public() {
            return;
        }
        debug!(
            event = event.event_type(),
            id = %event.confession_id(),
            subscribers = self.events.subscriber_count(),
            "Publishing change event"
        );
        self.events.emit_lossy(event);
    }
}

impl ConfessionGateway for SqliteGateway {
    async fn create(&self, record: NewConfession) -> Result<Confession> {
        let confession = db::insert_confession(&self.pool, &record).await?;
        info!(id = %confession.id, slug = %confession.unique_slug, "Confession created");
        self.publish(ChangeEvent::upserted(confession.clone()));
        Ok(confession)
    }

    async fn list_approved(&self) -> Result<Vec<Confession>> {
        db::list_approved(&self.pool).await
    }

    async fn list_all(&self) -> Result<Vec<Confession>> {
        db::list_all(&self.pool).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Confession>> {
        db::get_approved_by_slug(&self.pool, slug).await
    }

    async fn increment_view(&self, id: Uuid) -> Result<()> {
        if !db::increment_views(&self.pool, id).await? {
            return Err(Error::NotFound(format!("confession {}", id)));
        }
        self.publish_row(id).await
    }

    async fn set_like(&self, id: Uuid, liked: bool) -> Result<()> {
        match db::adjust_like_count(&self.pool, id, liked).await? {
            Some(count) => {
                debug!(id = %id, liked, count, "Like count updated");
                self.publish_row(id).await
            }
            None => Err(Error::NotFound(format!("confession {}", id))),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        if db::delete_confession(&self.pool, id).await? {
            info!(id = %id, "Confession deleted");
            self.publish(ChangeEvent::removed(id));
        } else {
            debug!(id = %id, "Delete of absent confession");
        }
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        let events = self.events.subscribe();
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let task = tokio::spawn(feed(self.pool.clone(), events, self.poll_interval, tx));
        Subscription::new(rx, task)
    }
}

/// Forward in-process pushes and poll the table for everything else
async fn feed(
    pool: SqlitePool,
    mut events: broadcast::Receiver<ChangeEvent>,
    poll_interval: Duration,
    tx: mpsc::Sender<ChangeEvent>,
) {
    let mut snapshot = FeedSnapshot::default();
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut pushes_open = true;

    loop {
        let batch = tokio::select! {
            received = events.recv(), if pushes_open => match received {
                Ok(event) => {
                    snapshot.note(&event);
                    vec![event]
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Change feed subscriber lagged; events dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    pushes_open = false;
                    continue;
                }
            },
            _ = ticker.tick() => match db::list_approved(&pool).await {
                Ok(records) => snapshot.diff(records),
                // Best-effort feed: a failed poll is skipped, not retried
                Err(e) => {
                    warn!(error = %e, "Change feed poll failed");
                    continue;
                }
            },
        };

        for event in batch {
            if tx.send(event).await.is_err() {
                debug!("Change feed forwarder stopped");
                return;
            }
        }
    }
}
