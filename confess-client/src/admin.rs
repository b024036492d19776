//! Admin console
//!
//! Lists every confession (approved or not), filters with the same search
//! as the public list, and deletes after an explicit confirmation.

use std::sync::Arc;

use confess_common::{Confession, Result};
use tracing::{error, info};
use uuid::Uuid;

use crate::gateway::ConfessionGateway;
use crate::sync::ListSynchronizer;

/// Counters shown above the admin list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminStats {
    pub total: usize,
    pub with_song: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Confirmation declined; no remote call made
    Declined,
}

pub struct AdminConsole<G> {
    gateway: Arc<G>,
    list: ListSynchronizer,
}

impl<G: ConfessionGateway> AdminConsole<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            list: ListSynchronizer::new(),
        }
    }

    /// Reload every record, newest first
    pub async fn load(&mut self) -> Result<usize> {
        match self.gateway.list_all().await {
            Ok(records) => {
                self.list.replace(records);
                Ok(self.list.len())
            }
            Err(e) => {
                error!(error = %e, "Error loading confessions");
                self.list.replace(Vec::new());
                Err(e)
            }
        }
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.list.set_search(term);
    }

    pub fn visible(&self) -> impl Iterator<Item = &Confession> + '_ {
        self.list.visible()
    }

    pub fn list(&self) -> &ListSynchronizer {
        &self.list
    }

    pub fn stats(&self) -> AdminStats {
        let items = self.list.items();
        AdminStats {
            total: items.len(),
            with_song: items.iter().filter(|c| c.has_song()).count(),
        }
    }

    /// Permanently delete `id` once `confirm` approves
    ///
    /// `confirm` receives the held record, or None if it is not in the
    /// loaded list.
    pub async fn delete<F>(&mut self, id: Uuid, confirm: F) -> Result<DeleteOutcome>
    where
        F: FnOnce(Option<&Confession>) -> bool,
    {
        if !confirm(self.list.get(id)) {
            return Ok(DeleteOutcome::Declined);
        }

        if let Err(e) = self.gateway.delete(id).await {
            error!(id = %id, error = %e, "Error deleting confession");
            return Err(e);
        }

        self.list.remove(id);
        info!(id = %id, "Confession deleted by admin");
        Ok(DeleteOutcome::Deleted)
    }
}
