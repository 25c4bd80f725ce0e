//! Data loading from an HTTP endpoint or a local file
//!
//! The endpoint answers `GET` with
//! `{ "last_updated": <unix seconds>, "results": [ <transition>, .. ] }`
//! and, on failure, a non-success status with `{ "error": "<message>" }`.
//!
//! Loading never touches dashboard state; callers decide what to do with
//! the [`Dataset`] or the [`LoadError`].

use crate::transition::Dataset;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use thiserror::Error;

/// Message used when a failed response carries no `error` field
pub const GENERIC_FETCH_ERROR: &str = "Failed to fetch data";

/// A failed load. `Display` is the message shown to the viewer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{0}")]
    Network(#[from] reqwest::Error),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("invalid data payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LoadError {
    /// True when a file source does not exist yet
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;

#[derive(Deserialize)]
struct RawPayload {
    #[serde(default)]
    last_updated: Option<f64>,
    results: Vec<Value>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Fetch and validate the dataset served at `url`
pub fn load(url: &str) -> Result<Dataset> {
    tracing::debug!(url, "fetching transitions");

    let response = reqwest::blocking::get(url)?;
    let status = response.status();
    let body = response.text()?;

    if !status.is_success() {
        let message = error_message(&body);
        tracing::warn!(url, status = status.as_u16(), %message, "data endpoint returned an error");
        return Err(LoadError::Status { status: status.as_u16(), message });
    }

    let dataset = parse_payload(&body)?;
    tracing::info!(
        url,
        transitions = dataset.len(),
        rejected = dataset.rejected,
        "loaded transitions"
    );
    Ok(dataset)
}

/// Read a dataset from disk.
///
/// Accepts either the endpoint payload or a bare array of transitions, in
/// which case `last_updated` is the file's modification time.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    let io_err = |source| LoadError::Io { path: path.to_path_buf(), source };

    let body = std::fs::read_to_string(path).map_err(io_err)?;
    let value: Value = serde_json::from_str(&body)?;

    let dataset = match value {
        Value::Array(records) => {
            let modified = std::fs::metadata(path).and_then(|m| m.modified()).map_err(io_err)?;
            let last_updated = modified
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);
            Dataset::from_records(last_updated, records)
        }
        other => payload_to_dataset(serde_json::from_value(other)?),
    };

    tracing::info!(
        path = %path.display(),
        transitions = dataset.len(),
        rejected = dataset.rejected,
        "loaded transitions"
    );
    Ok(dataset)
}

/// Parse an endpoint payload
pub fn parse_payload(body: &str) -> Result<Dataset> {
    let raw: RawPayload = serde_json::from_str(body)?;
    Ok(payload_to_dataset(raw))
}

/// A `last_updated` that is missing or outside the calendar range becomes 0
fn payload_to_dataset(raw: RawPayload) -> Dataset {
    let last_updated = raw
        .last_updated
        .filter(|t| t.is_finite())
        .map(|t| t.floor() as i64)
        .filter(|&secs| DateTime::<Utc>::from_timestamp(secs, 0).is_some())
        .unwrap_or(0);
    Dataset::from_records(last_updated, raw.results)
}

/// The `error` field of a failure body, or [`GENERIC_FETCH_ERROR`]
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| GENERIC_FETCH_ERROR.to_string())
}
