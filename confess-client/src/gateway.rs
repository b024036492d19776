//! Remote data gateway
//!
//! Thin async interface over the `confessions` table plus its change
//! feed. Every call is single-shot: failures are returned to the caller
//! unchanged and nothing is retried here.

use std::collections::HashSet;
use std::future::Future;

use confess_common::{ChangeEvent, Confession, NewConfession, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Buffered change events per subscription before the producer waits
pub const SUBSCRIPTION_BUFFER: usize = 64;

/// CRUD and change-feed access to the confession table
pub trait ConfessionGateway: Send + Sync + 'static {
    /// Insert a record; the service assigns id, timestamp, and slug
    fn create(&self, record: NewConfession) -> impl Future<Output = Result<Confession>> + Send;

    /// Approved records, newest first
    fn list_approved(&self) -> impl Future<Output = Result<Vec<Confession>>> + Send;

    /// Every record regardless of approval, newest first (admin view)
    fn list_all(&self) -> impl Future<Output = Result<Vec<Confession>>> + Send;

    /// Approved record by slug; `None` when missing or unapproved
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = Result<Option<Confession>>> + Send;

    /// `views = views + 1`
    fn increment_view(&self, id: Uuid) -> impl Future<Output = Result<()>> + Send;

    /// Add (`liked = true`) or remove one like
    fn set_like(&self, id: Uuid, liked: bool) -> impl Future<Output = Result<()>> + Send;

    /// Unconditional permanent removal
    fn delete(&self, id: Uuid) -> impl Future<Output = Result<()>> + Send;

    /// Change feed of approved records
    ///
    /// Must be called inside a tokio runtime. The feed stops when the
    /// returned subscription is dropped.
    fn subscribe(&self) -> Subscription;
}

/// Inbound queue of change events from one subscription
///
/// Dropping it stops the producing task.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<ChangeEvent>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wrap a receiver fed by `task`
    pub fn new(rx: mpsc::Receiver<ChangeEvent>, task: JoinHandle<()>) -> Self {
        Self {
            rx,
            task: Some(task),
        }
    }

    /// Subscription fed directly through the returned sender (no task)
    pub fn channel() -> (mpsc::Sender<ChangeEvent>, Self) {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        (tx, Self { rx, task: None })
    }

    /// Next event, or None once the feed has ended
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    /// Next already-delivered event without waiting
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Ids seen by the previous poll of a polled change feed
///
/// The first poll reports every record; subscribers merge idempotently,
/// so overlap with their initial load is harmless.
#[derive(Debug, Default)]
pub(crate) struct FeedSnapshot {
    known: HashSet<Uuid>,
}

impl FeedSnapshot {
    /// Events turning the previous snapshot into `records` (newest first)
    ///
    /// Removals come first; insertions are ordered oldest first so that
    /// prepending them preserves newest-first order.
    pub(crate) fn diff(&mut self, records: Vec<Confession>) -> Vec<ChangeEvent> {
        let current: HashSet<Uuid> = records.iter().map(|c| c.id).collect();

        let mut events: Vec<ChangeEvent> = self
            .known
            .difference(&current)
            .map(|id| ChangeEvent::removed(*id))
            .collect();

        events.extend(
            records
                .into_iter()
                .rev()
                .filter(|c| !self.known.contains(&c.id))
                .map(ChangeEvent::upserted),
        );

        self.known = current;
        events
    }

    /// Record an event delivered by another path so the next poll does
    /// not report it again
    pub(crate) fn note(&mut self, event: &ChangeEvent) {
        match event {
            ChangeEvent::Upserted { confession, .. } if confession.is_approved => {
                self.known.insert(confession.id);
            }
            ChangeEvent::Upserted { .. } => {}
            ChangeEvent::Removed { id, .. } => {
                self.known.remove(id);
            }
        }
    }
}
