//! Errors surfaced by the ingestion pipeline.

use std::path::PathBuf;

use jquants_client::{ClientError, models::DateFormatError};
use shared_utils::env::EnvError;
use thiserror::Error;

use crate::db::connection::ConnectError;

/// Anything that aborts a sync phase.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Login failed, a request failed, or a call was made before login.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A statement or the transaction itself failed; the phase was rolled back.
    #[error("Storage error: {0}")]
    Storage(#[from] diesel::result::Error),

    /// The database could not be reached.
    #[error(transparent)]
    Connection(#[from] ConnectError),

    /// A target date was not `YYYY-MM-DD`.
    #[error(transparent)]
    Date(#[from] DateFormatError),

    /// Configuration missing or malformed.
    #[error(transparent)]
    Config(#[from] EnvError),

    /// Reading or writing a JSON snapshot failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A JSON snapshot could not be encoded or decoded.
    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
}
