//! # ConfessWorld Common Library
//!
//! Shared code for the ConfessWorld client and its local backend:
//! - Confession record model (wire contracts)
//! - Change events and the in-process EventBus
//! - Verification-code parsing and Spotify link helpers
//! - Slug generation for permalinks
//! - TOML configuration loading
//! - Session-scoped flags
//! - SQLite schema and queries for the self-hosted table

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod events;
pub mod model;
pub mod session;
pub mod slug;
pub mod spotify;
pub mod verify;

pub use error::{Error, Result};
pub use events::{ChangeEvent, EventBus};
pub use model::{Confession, NewConfession};
pub use verify::{Verification, VerificationCodes};
