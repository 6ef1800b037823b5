//! Music chart harvesting service.
//!
//! Collects chart entries from several streaming and chart platforms,
//! normalizes them into platform snapshots, stores the snapshots in SQLite
//! and serves them over a small HTTP API.

pub mod collectors;
pub mod config;
pub mod embedded_json;
pub mod harvest;
pub mod rate_limiter;
pub mod server;
pub mod snapshot_store;
pub mod sqlite_persistence;
