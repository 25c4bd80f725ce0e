//! Transition derivation from workflow status histories
//!
//! Input is the list of relval documents, each with a batch name and the
//! workflows it spawned:
//!
//! ```json
//! [{ "batch_name": "b1",
//!    "workflows": [{ "name": "wf_1",
//!                    "status_history": [{ "status": "new", "time": 1700000000 },
//!                                       { "status": "assigned", "time": 1700000900 }] }] }]
//! ```
//!
//! Events are collected per workflow name (workflows ordered by name, events
//! in document order). Each pair of consecutive events becomes one
//! transition whose duration is the whole number of seconds between them.
//!
//! A pair is skipped when either event lacks a status or a time. That
//! includes a missing *leaving* status, so every derived transition has both a
//! `from` and a `to`.

use crate::transition::Transition;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeriveError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid relval document list: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeriveError>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelvalDocument {
    #[serde(default)]
    pub batch_name: Option<String>,
    #[serde(default)]
    pub workflows: Vec<Workflow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Workflow {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status_history: Vec<StatusEvent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusEvent {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub time: Option<f64>,
}

struct Event<'a> {
    status: Option<&'a str>,
    time: Option<f64>,
    batch_name: Option<&'a str>,
}

/// Pair consecutive status events of every workflow into transitions
pub fn derive_transitions(documents: &[RelvalDocument]) -> Vec<Transition> {
    let mut by_workflow: BTreeMap<&str, Vec<Event<'_>>> = BTreeMap::new();

    for doc in documents {
        for workflow in &doc.workflows {
            let Some(name) = workflow.name.as_deref() else {
                continue;
            };
            let events = by_workflow.entry(name).or_default();
            events.extend(workflow.status_history.iter().map(|e| Event {
                status: e.status.as_deref(),
                time: e.time,
                batch_name: doc.batch_name.as_deref(),
            }));
        }
    }

    let mut transitions = Vec::new();
    for events in by_workflow.values() {
        for pair in events.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            let (Some(from), Some(to), Some(start), Some(end)) =
                (current.status, next.status, current.time, next.time)
            else {
                continue;
            };
            if !start.is_finite() || !end.is_finite() {
                continue;
            }

            transitions.push(Transition {
                from: from.to_string(),
                to: to.to_string(),
                start: start.floor() as i64,
                duration_seconds: (end - start).trunc(),
                batch_name: current.batch_name.filter(|b| !b.is_empty()).map(str::to_string),
            });
        }
    }

    tracing::debug!(
        workflows = by_workflow.len(),
        transitions = transitions.len(),
        "derived transitions"
    );
    transitions
}

pub fn read_documents<P: AsRef<Path>>(path: P) -> Result<Vec<RelvalDocument>> {
    let path = path.as_ref();
    let body = std::fs::read_to_string(path)
        .map_err(|source| DeriveError::Io { path: path.to_path_buf(), source })?;
    Ok(serde_json::from_str(&body)?)
}

/// Write transitions as a JSON array, the format the data endpoint serves
pub fn write_transitions<P: AsRef<Path>>(path: P, transitions: &[Transition]) -> Result<()> {
    let path = path.as_ref();
    let body = serde_json::to_vec(transitions)?;
    std::fs::write(path, body).map_err(|source| DeriveError::Io { path: path.to_path_buf(), source })
}
