//! SQLite storage for the self-hosted confession table

pub mod confessions;
pub mod init;

pub use confessions::*;
pub use init::*;
