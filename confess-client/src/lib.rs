//! ConfessWorld client
//!
//! Gateway implementations for the hosted service and a local SQLite
//! store, plus the client-side state that sits on top of them: the live
//! list, optimistic likes, the submission form, the detail view, and the
//! admin console.

pub mod admin;
pub mod detail;
pub mod gateway;
pub mod http;
pub mod like;
pub mod render;
pub mod share;
pub mod sqlite;
pub mod submit;
pub mod sync;

pub use admin::{AdminConsole, AdminStats, DeleteOutcome};
pub use detail::{load_detail, DetailOutcome};
pub use gateway::{ConfessionGateway, Subscription};
pub use http::HttpGateway;
pub use like::{LikeController, LikePhase, LikeState, ToggleOutcome};
pub use share::{permalink, SharePayload};
pub use sqlite::SqliteGateway;
pub use submit::ConfessionForm;
pub use sync::{ListSynchronizer, MergeOutcome};
