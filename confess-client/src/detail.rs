//! Permalink detail view
//!
//! A slug resolves to a record or to a first-class not-found outcome.
//! Opening a found record bumps its view counter without waiting for it.

use std::sync::Arc;

use confess_common::{Confession, Result};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::gateway::ConfessionGateway;

#[derive(Debug, Clone, PartialEq)]
pub enum DetailOutcome {
    Found(Confession),
    /// Missing, unapproved, or deleted
    NotFound,
}

impl DetailOutcome {
    pub fn confession(&self) -> Option<&Confession> {
        match self {
            DetailOutcome::Found(confession) => Some(confession),
            DetailOutcome::NotFound => None,
        }
    }
}

/// Resolve `slug` to an approved confession
///
/// Remote failures are returned; the view-count increment is
/// fire-and-forget and only logged if it fails.
pub async fn load_detail<G: ConfessionGateway>(
    gateway: &Arc<G>,
    slug: &str,
) -> Result<DetailOutcome> {
    let outcome = lookup(gateway.as_ref(), slug).await?;
    if let DetailOutcome::Found(confession) = &outcome {
        // Detached; completion is not awaited
        drop(spawn_view_increment(gateway, confession.id));
    }
    Ok(outcome)
}

/// Resolve `slug` without touching the view counter
pub async fn lookup<G: ConfessionGateway>(gateway: &G, slug: &str) -> Result<DetailOutcome> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Ok(DetailOutcome::NotFound);
    }

    match gateway.get_by_slug(slug).await? {
        Some(confession) => Ok(DetailOutcome::Found(confession)),
        None => {
            debug!(slug, "Confession not found");
            Ok(DetailOutcome::NotFound)
        }
    }
}

/// Bump the view counter in the background; failures are logged
///
/// Short-lived callers may await the handle so the increment lands
/// before the runtime shuts down.
pub fn spawn_view_increment<G: ConfessionGateway>(gateway: &Arc<G>, id: Uuid) -> JoinHandle<()> {
    let gateway = Arc::clone(gateway);
    tokio::spawn(async move {
        if let Err(e) = gateway.increment_view(id).await {
            warn!(id = %id, error = %e, "View count increment failed");
        }
    })
}
