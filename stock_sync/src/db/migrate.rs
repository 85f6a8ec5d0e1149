//! Embedded schema migrations.

use anyhow::anyhow;
use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use secrecy::ExposeSecret;
use tracing::info;

use crate::db::connection::DbConfig;

/// Embedded Diesel migrations bundled with this crate (`brands` and `prices`).
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Applies pending migrations, returning the versions that ran.
///
/// Blocking: uses a synchronous libpq connection. From async code call it via
/// `tokio::task::spawn_blocking`.
pub fn run_postgres(config: &DbConfig) -> anyhow::Result<Vec<String>> {
    let mut conn = PgConnection::establish(config.conninfo().expose_secret())?;

    let applied: Vec<String> = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!(e))?
        .into_iter()
        .map(|v| v.to_string())
        .collect();

    info!(count = applied.len(), "migrations applied");
    Ok(applied)
}
