//! JSON snapshots of API responses on disk.
//!
//! `fetch` commands write what the API returned without touching the database;
//! `load` commands read such a file back and upsert it.

use std::{fs, path::Path};

use serde::{Serialize, de::DeserializeOwned};
use tracing::info;

use crate::errors::SyncError;

/// Writes `value` as pretty-printed JSON, replacing `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), SyncError> {
    let body = serde_json::to_vec_pretty(value).map_err(|source| SyncError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, body).map_err(|source| SyncError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "snapshot written");
    Ok(())
}

/// Reads a JSON snapshot written by [`write_json`] (or saved from the API by hand).
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SyncError> {
    let body = fs::read(path).map_err(|source| SyncError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&body).map_err(|source| SyncError::Json {
        path: path.to_path_buf(),
        source,
    })
}
