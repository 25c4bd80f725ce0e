//! Transition records and load-boundary validation
//!
//! Data arrives as loosely-typed JSON. Every record is checked here once, so
//! the rest of the pipeline works with a [`Transition`] whose numeric fields
//! are known to be present and sane.
//!
//! Rules applied to each record:
//! - `from`, `to` and `start` are required
//! - `duration_seconds` is required, finite, non-negative and no larger
//!   than [`MAX_DURATION_SECONDS`]
//! - a missing, `null` or empty `batch_name` becomes `None`
//!
//! Records that break a rule are skipped and counted in
//! [`Dataset::rejected`]; they never abort a load.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Largest accepted duration. Its bin start in minutes still fits an
/// `i64` with room for the bin width.
pub const MAX_DURATION_SECONDS: f64 = 60.0 * (1u64 << 62) as f64;

/// One recorded change from one workflow state to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: String,
    pub to: String,
    /// Unix timestamp (seconds) at which the originating state was entered
    pub start: i64,
    /// Time spent in the originating state
    pub duration_seconds: f64,
    #[serde(default)]
    pub batch_name: Option<String>,
}

impl Transition {
    /// Grouping key, e.g. `"new -> submitted"`
    pub fn transition_type(&self) -> String {
        format!("{} -> {}", self.from, self.to)
    }
}

/// Why a record was refused at the load boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidTransition {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` is not a finite number")]
    NonFinite(&'static str),

    #[error("negative duration: {0}")]
    NegativeDuration(f64),

    #[error("duration out of range: {0}")]
    DurationOutOfRange(f64),

    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Record exactly as it arrives over the wire
#[derive(Debug, Clone, Default, Deserialize)]
struct RawTransition {
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    start: Option<f64>,
    #[serde(default)]
    duration_seconds: Option<f64>,
    #[serde(default)]
    batch_name: Option<String>,
}

impl TryFrom<RawTransition> for Transition {
    type Error = InvalidTransition;

    fn try_from(raw: RawTransition) -> Result<Self, Self::Error> {
        let from = raw.from.ok_or(InvalidTransition::MissingField("from"))?;
        let to = raw.to.ok_or(InvalidTransition::MissingField("to"))?;

        let start = raw.start.ok_or(InvalidTransition::MissingField("start"))?;
        if !start.is_finite() {
            return Err(InvalidTransition::NonFinite("start"));
        }

        let duration_seconds = raw
            .duration_seconds
            .ok_or(InvalidTransition::MissingField("duration_seconds"))?;
        if !duration_seconds.is_finite() {
            return Err(InvalidTransition::NonFinite("duration_seconds"));
        }
        if duration_seconds < 0.0 {
            return Err(InvalidTransition::NegativeDuration(duration_seconds));
        }
        if duration_seconds > MAX_DURATION_SECONDS {
            return Err(InvalidTransition::DurationOutOfRange(duration_seconds));
        }

        let batch_name = raw.batch_name.filter(|name| !name.is_empty());

        Ok(Transition {
            from,
            to,
            start: start.floor() as i64,
            duration_seconds,
            batch_name,
        })
    }
}

impl TryFrom<Value> for Transition {
    type Error = InvalidTransition;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let raw: RawTransition = serde_json::from_value(value)
            .map_err(|e| InvalidTransition::Malformed(e.to_string()))?;
        Transition::try_from(raw)
    }
}

/// A validated set of transitions plus the time the data was produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Unix timestamp (seconds) of the last data refresh
    pub last_updated: i64,
    pub transitions: Vec<Transition>,
    /// Number of records skipped during validation
    pub rejected: usize,
}

impl Dataset {
    pub fn new(last_updated: i64, transitions: Vec<Transition>) -> Self {
        Self { last_updated, transitions, rejected: 0 }
    }

    /// Validate raw JSON records, keeping the good ones in input order
    pub fn from_records(last_updated: i64, records: Vec<Value>) -> Self {
        let mut transitions = Vec::with_capacity(records.len());
        let mut rejected = 0;

        for (index, record) in records.into_iter().enumerate() {
            match Transition::try_from(record) {
                Ok(t) => transitions.push(t),
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping invalid transition record");
                    rejected += 1;
                }
            }
        }

        Self { last_updated, transitions, rejected }
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Wire form: `{ "last_updated": .., "results": [..] }`
    pub fn to_payload(&self) -> Payload<'_> {
        Payload {
            last_updated: self.last_updated,
            results: &self.transitions,
        }
    }
}

/// Serialized shape of the data endpoint
#[derive(Debug, Serialize)]
pub struct Payload<'a> {
    pub last_updated: i64,
    pub results: &'a [Transition],
}
