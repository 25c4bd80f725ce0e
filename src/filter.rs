//! Filter state and the filter/group stage of the pipeline
//!
//! The three dashboard selectors (time window, time unit, batch) map onto
//! [`TimeWindow`], [`TimeUnit`] and [`BatchFilter`]. Together they form a
//! [`FilterState`], which parametrizes [`filter_and_group`].

use crate::transition::Transition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SECONDS_PER_DAY: i64 = 86_400;

/// Selector value meaning "no restriction"
pub const ALL: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("invalid time window '{0}' (expected 'all' or a number of days)")]
    InvalidWindow(String),

    #[error("invalid time unit '{0}' (expected minutes, hours or days)")]
    InvalidUnit(String),
}

pub type Result<T> = std::result::Result<T, FilterError>;

// ============================================================================
// Selectors
// ============================================================================

/// Unit used to express durations on the histogram x axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 3] = [TimeUnit::Minutes, TimeUnit::Hours, TimeUnit::Days];

    /// Seconds per unit
    pub fn divisor(self) -> f64 {
        match self {
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3_600.0,
            TimeUnit::Days => 86_400.0,
        }
    }

    /// Bin width, in units
    pub fn step(self) -> i64 {
        match self {
            TimeUnit::Minutes => 15,
            TimeUnit::Hours | TimeUnit::Days => 1,
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            TimeUnit::Minutes => "min",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "d",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minutes" => Ok(TimeUnit::Minutes),
            "hours" => Ok(TimeUnit::Hours),
            "days" => Ok(TimeUnit::Days),
            _ => Err(FilterError::InvalidUnit(s.to_string())),
        }
    }
}

/// How far back transitions are kept, by start time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    #[default]
    All,
    Days(u32),
}

impl TimeWindow {
    /// Earliest start timestamp kept, or `None` when unrestricted
    pub fn cutoff(self, now: DateTime<Utc>) -> Option<i64> {
        match self {
            TimeWindow::All => None,
            TimeWindow::Days(days) => Some(now.timestamp() - i64::from(days) * SECONDS_PER_DAY),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeWindow::All => f.write_str(ALL),
            TimeWindow::Days(days) => write!(f, "{}", days),
        }
    }
}

impl FromStr for TimeWindow {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(ALL) {
            return Ok(TimeWindow::All);
        }
        trimmed
            .parse::<u32>()
            .map(TimeWindow::Days)
            .map_err(|_| FilterError::InvalidWindow(s.to_string()))
    }
}

/// Restriction on `batch_name`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BatchFilter {
    #[default]
    All,
    Named(String),
}

impl BatchFilter {
    pub fn matches(&self, transition: &Transition) -> bool {
        match self {
            BatchFilter::All => true,
            BatchFilter::Named(name) => transition.batch_name.as_deref() == Some(name.as_str()),
        }
    }
}

impl From<&str> for BatchFilter {
    fn from(s: &str) -> Self {
        if s.is_empty() || s == ALL {
            BatchFilter::All
        } else {
            BatchFilter::Named(s.to_string())
        }
    }
}

impl fmt::Display for BatchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchFilter::All => f.write_str(ALL),
            BatchFilter::Named(name) => f.write_str(name),
        }
    }
}

/// Current value of every selector
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub time_window: TimeWindow,
    pub unit: TimeUnit,
    pub batch: BatchFilter,
}

impl FilterState {
    /// Build from raw selector values, e.g. `("7", "hours", "all")`
    pub fn from_selectors(days: &str, unit: &str, batch: &str) -> Result<Self> {
        Ok(Self {
            time_window: days.parse()?,
            unit: unit.parse()?,
            batch: BatchFilter::from(batch),
        })
    }

    pub fn selection(&self) -> Selection {
        Selection {
            days: Some(self.time_window.to_string()),
            unit: Some(self.unit.to_string()),
            batch: Some(self.batch.to_string()),
        }
    }
}

/// Selector values as strings, as they travel in query strings and views
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub days: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub batch: Option<String>,
}

impl Selection {
    /// Fill unset selectors from `defaults`
    pub fn resolve(&self, defaults: &FilterState) -> Result<FilterState> {
        let time_window = match self.days.as_deref() {
            Some(days) => days.parse()?,
            None => defaults.time_window,
        };
        let unit = match self.unit.as_deref() {
            Some(unit) => unit.parse()?,
            None => defaults.unit,
        };
        let batch = match self.batch.as_deref() {
            Some(batch) => BatchFilter::from(batch),
            None => defaults.batch.clone(),
        };
        Ok(FilterState { time_window, unit, batch })
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Transitions sharing one `from -> to` pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub transition_type: String,
    pub transitions: Vec<Transition>,
}

/// Apply the time window and batch filter, preserving input order
pub fn apply_filters<'a>(
    transitions: &'a [Transition],
    state: &FilterState,
    now: DateTime<Utc>,
) -> Vec<&'a Transition> {
    let cutoff = state.time_window.cutoff(now);

    transitions
        .iter()
        .filter(|t| cutoff.map_or(true, |c| t.start >= c))
        .filter(|t| state.batch.matches(t))
        .collect()
}

/// Filter, then partition by transition type in first-seen order
pub fn filter_and_group(
    transitions: &[Transition],
    state: &FilterState,
    now: DateTime<Utc>,
) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for t in apply_filters(transitions, state, now) {
        let key = t.transition_type();
        match index.get(&key) {
            Some(&i) => groups[i].transitions.push(t.clone()),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(Group {
                    transition_type: key,
                    transitions: vec![t.clone()],
                });
            }
        }
    }

    groups
}

/// Sorted, deduplicated, non-empty batch names
pub fn distinct_batch_names(transitions: &[Transition]) -> Vec<String> {
    transitions
        .iter()
        .filter_map(|t| t.batch_name.as_deref())
        .filter(|name| !name.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
