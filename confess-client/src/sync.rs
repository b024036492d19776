//! List synchronizer
//!
//! Owns the in-memory confession list (newest first, unique by id) and
//! is its single merge point: the initial load replaces the list, and
//! change events are applied one at a time through [`ListSynchronizer::apply`].
//!
//! The search view is recomputed synchronously whenever the list or the
//! term changes.

use std::time::Duration;

use confess_common::{ChangeEvent, Confession, Result};
use tokio::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::gateway::{ConfessionGateway, Subscription};

/// How long the "new item" signal stays raised after an insertion
pub const NEW_ITEM_SIGNAL_DURATION: Duration = Duration::from_secs(3);

/// What a change event did to the list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Record was not present and has been prepended
    Inserted,
    /// Record was present and has been dropped
    Removed,
    /// Nothing changed (duplicate insert, update of a held record, or unknown removal)
    Unchanged,
}

#[derive(Debug, Default)]
pub struct ListSynchronizer {
    items: Vec<Confession>,
    search: String,
    /// Indexes into `items` matching `search`
    visible: Vec<usize>,
    new_item_until: Option<Instant>,
}

impl ListSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list with the gateway's approved records
    ///
    /// On failure the list is left empty and the error is returned for
    /// the caller to surface.
    pub async fn load<G: ConfessionGateway>(&mut self, gateway: &G) -> Result<usize> {
        match gateway.list_approved().await {
            Ok(records) => {
                self.replace(records);
                info!(count = self.items.len(), "Confessions loaded");
                Ok(self.items.len())
            }
            Err(e) => {
                error!(error = %e, "Error loading confessions");
                self.replace(Vec::new());
                Err(e)
            }
        }
    }

    /// Replace the whole list, keeping the first occurrence of each id
    pub fn replace(&mut self, records: Vec<Confession>) {
        let mut seen = std::collections::HashSet::with_capacity(records.len());
        self.items = records
            .into_iter()
            .filter(|record| seen.insert(record.id))
            .collect();
        self.refilter();
    }

    /// Merge one change event
    ///
    /// Upserts of unknown ids are prepended and raise the new-item signal;
    /// upserts of held ids are ignored, so overlapping initial-load and
    /// feed delivery never duplicate a record.
    pub fn apply(&mut self, event: ChangeEvent) -> MergeOutcome {
        match event {
            ChangeEvent::Upserted { confession, .. } => {
                if !confession.is_approved || self.contains(confession.id) {
                    return MergeOutcome::Unchanged;
                }
                debug!(id = %confession.id, "New confession merged from change feed");
                self.items.insert(0, confession);
                self.new_item_until = Some(Instant::now() + NEW_ITEM_SIGNAL_DURATION);
                self.refilter();
                MergeOutcome::Inserted
            }
            ChangeEvent::Removed { id, .. } => {
                if self.remove(id) {
                    MergeOutcome::Removed
                } else {
                    MergeOutcome::Unchanged
                }
            }
        }
    }

    /// Apply every event already waiting on the subscription
    pub fn drain(&mut self, subscription: &mut Subscription) -> usize {
        let mut inserted = 0;
        while let Some(event) = subscription.try_recv() {
            if self.apply(event) == MergeOutcome::Inserted {
                inserted += 1;
            }
        }
        inserted
    }

    /// Drop a record by id; returns whether it was present
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|c| c.id != id);
        let removed = self.items.len() != before;
        if removed {
            self.refilter();
        }
        removed
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.refilter();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Records matching the current search term, in list order
    pub fn visible(&self) -> impl Iterator<Item = &Confession> + '_ {
        self.visible.iter().map(move |&i| &self.items[i])
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// The full list, newest first
    pub fn items(&self) -> &[Confession] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.items.iter().any(|c| c.id == id)
    }

    pub fn get(&self, id: Uuid) -> Option<&Confession> {
        self.items.iter().find(|c| c.id == id)
    }

    /// True for three seconds after the latest feed insertion
    pub fn new_item_signal(&self) -> bool {
        self.new_item_until
            .map(|until| Instant::now() < until)
            .unwrap_or(false)
    }

    fn refilter(&mut self) {
        let needle = self.search.to_lowercase();
        self.visible = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, c)| c.matches(&needle))
            .map(|(i, _)| i)
            .collect();
    }
}
