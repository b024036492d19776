//! Session-scoped flags
//!
//! A `SessionFlag` replaces "already shown this session" globals. It is
//! created once per session, cloned into whoever needs it, and starts
//! unset.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct SessionFlag {
    set: Arc<AtomicBool>,
}

impl SessionFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.set.load(Ordering::Acquire)
    }

    /// Set the flag; returns true only for the call that set it
    pub fn mark(&self) -> bool {
        !self.set.swap(true, Ordering::AcqRel)
    }

    pub fn clear(&self) {
        self.set.store(false, Ordering::Release);
    }
}
