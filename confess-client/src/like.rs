//! Optimistic like toggling
//!
//! Each record moves through `Idle -> Pending -> Idle`. Entering
//! `Pending` applies the flipped state locally before the gateway call;
//! on failure the exact pre-toggle state is restored. A toggle requested
//! while the record is `Pending` is ignored, so at most one like mutation
//! per record is in flight and the displayed count is never more than
//! one guess away from the confirmed one.
//!
//! Different records are independent and may have concurrent mutations.
//!
//! Only a `Pending` entry overrides the record it belongs to. An `Idle`
//! entry is refreshed from whatever copy of the record the caller holds,
//! so a reloaded list shows the service's count. `liked` is kept from
//! the entry when the record does not carry `user_has_liked`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use confess_common::{Confession, Result};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::gateway::ConfessionGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikePhase {
    Idle,
    /// Optimistic state applied, gateway call outstanding
    Pending,
}

/// Displayed like state of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub count: i64,
    pub phase: LikePhase,
}

impl LikeState {
    /// Initial state from the record's counters
    pub fn seed(record: &Confession) -> Self {
        Self {
            liked: record.user_has_liked.unwrap_or(false),
            count: record.like_count.unwrap_or(0).max(0),
            phase: LikePhase::Idle,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.phase == LikePhase::Pending
    }

    /// Idle state taken from a newer copy of the record
    fn refreshed(self, record: &Confession) -> Self {
        Self {
            liked: record.user_has_liked.unwrap_or(self.liked),
            count: record.like_count.unwrap_or(self.count).max(0),
            phase: LikePhase::Idle,
        }
    }

    fn flipped(self) -> Self {
        let liked = !self.liked;
        let count = if liked {
            self.count + 1
        } else {
            (self.count - 1).max(0)
        };
        Self {
            liked,
            count,
            phase: LikePhase::Pending,
        }
    }
}

/// Result of a toggle request that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Gateway accepted the change; state is back to `Idle`
    Confirmed(LikeState),
    /// A mutation for this record was already pending; nothing happened
    Ignored,
    /// The controller was closed while the call was in flight; result dropped
    Discarded,
}

pub struct LikeController<G> {
    gateway: Arc<G>,
    states: Mutex<HashMap<Uuid, LikeState>>,
    closed: AtomicBool,
}

impl<G: ConfessionGateway> LikeController<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            states: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Current displayed state for a record
    pub fn state(&self, record: &Confession) -> LikeState {
        let mut states = self.lock_states();
        match states.get_mut(&record.id) {
            Some(state) => {
                if !state.is_pending() {
                    *state = state.refreshed(record);
                }
                *state
            }
            None => LikeState::seed(record),
        }
    }

    /// Toggle the like on `record`
    ///
    /// Returns `Err` after rolling back when the gateway call fails; the
    /// failure is terminal for this request (no retry).
    pub async fn toggle_like(&self, record: &Confession) -> Result<ToggleOutcome> {
        if self.is_closed() {
            return Ok(ToggleOutcome::Discarded);
        }

        let (previous, desired) = {
            let mut states = self.lock_states();
            let state = states
                .entry(record.id)
                .or_insert_with(|| LikeState::seed(record));

            if state.is_pending() {
                debug!(id = %record.id, "Like toggle ignored; mutation already pending");
                return Ok(ToggleOutcome::Ignored);
            }
            *state = state.refreshed(record);

            let previous = *state;
            *state = previous.flipped();
            (previous, state.liked)
        };

        let result = self.gateway.set_like(record.id, desired).await;

        if self.is_closed() {
            debug!(id = %record.id, "Like result arrived after close; dropped");
            return Ok(ToggleOutcome::Discarded);
        }

        let mut states = self.lock_states();
        let state = states.entry(record.id).or_insert(previous);
        match result {
            Ok(()) => {
                state.phase = LikePhase::Idle;
                Ok(ToggleOutcome::Confirmed(*state))
            }
            Err(e) => {
                *state = previous;
                warn!(id = %record.id, error = %e, "Like failed; optimistic state rolled back");
                Err(e)
            }
        }
    }

    /// Stop accepting results; in-flight completions are dropped silently
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn lock_states(&self) -> MutexGuard<'_, HashMap<Uuid, LikeState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
