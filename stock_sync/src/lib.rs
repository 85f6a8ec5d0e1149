//! Loads J-Quants listed-issue and daily-quote data into PostgreSQL.
//!
//! - [`db`]: connection parameters, async connections and embedded migrations.
//! - [`store`]: chunked, idempotent upserts keyed by natural key.
//! - [`ingest`]: the `update-stock-info` run, one transaction per phase.
//! - [`snapshot`]: JSON files for the fetch/load commands.

#![deny(missing_docs)]

pub mod config;
pub mod db;
pub mod errors;
pub mod ingest;
pub mod logging;
pub mod models;
/// Diesel table definitions for `brands` and `prices`.
#[allow(missing_docs)]
pub mod schema;
pub mod snapshot;
pub mod store;

pub use errors::SyncError;
pub use ingest::{UpdateReport, update_stock_info};
