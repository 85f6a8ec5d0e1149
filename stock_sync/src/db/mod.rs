//! Database connection and schema migrations.
//!
//! - [`connection::connect_postgres`] opens an async diesel connection from
//!   discrete parameters, with TLS according to [`connection::SslMode`].
//! - [`migrate::run_postgres`] applies the embedded migrations over libpq.
//!
//! Example:
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use stock_sync::db::{connection::{self, DbConfig}, migrate};
//!
//! let config = DbConfig::from_env()?;
//! migrate::run_postgres(&config)?;
//! let _conn = connection::connect_postgres(&config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Note: the migration runner links the system libpq (e.g. libpq-dev on Debian/Ubuntu).

pub mod connection;
pub mod migrate;
