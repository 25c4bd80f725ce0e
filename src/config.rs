//! Where the dashboard data comes from
//!
//! Every CLI option has an environment twin so deployments can configure
//! the binary without flags:
//!
//! | Variable               | Meaning                               |
//! |------------------------|---------------------------------------|
//! | `TRANSBOARD_DATA_URL`  | data endpoint to fetch                |
//! | `TRANSBOARD_DATA_FILE` | local transitions file                |
//! | `TRANSBOARD_PORT`      | port for `serve`                      |
//! | `TRANSBOARD_DAYS`      | default time window (`all` or days)   |
//! | `TRANSBOARD_UNIT`      | default time unit                     |
//! | `TRANSBOARD_LOG`       | log level when `RUST_LOG` is unset    |

use crate::loader::{self, LoadError};
use crate::transition::Dataset;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub const ENV_DATA_URL: &str = "TRANSBOARD_DATA_URL";
pub const ENV_DATA_FILE: &str = "TRANSBOARD_DATA_FILE";
pub const ENV_PORT: &str = "TRANSBOARD_PORT";
pub const ENV_DAYS: &str = "TRANSBOARD_DAYS";
pub const ENV_UNIT: &str = "TRANSBOARD_UNIT";
pub const ENV_LOG: &str = "TRANSBOARD_LOG";

pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no data source: pass --url or --file (or set TRANSBOARD_DATA_URL / TRANSBOARD_DATA_FILE)")]
    MissingSource,

    #[error("--url and --file are mutually exclusive")]
    ConflictingSources,
}

/// A data endpoint or a file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

impl Source {
    pub fn from_options(url: Option<String>, file: Option<PathBuf>) -> Result<Self, ConfigError> {
        match (url, file) {
            (Some(url), None) => Ok(Source::Url(url)),
            (None, Some(file)) => Ok(Source::File(file)),
            (Some(_), Some(_)) => Err(ConfigError::ConflictingSources),
            (None, None) => Err(ConfigError::MissingSource),
        }
    }

    pub fn load(&self) -> Result<Dataset, LoadError> {
        match self {
            Source::Url(url) => loader::load(url),
            Source::File(path) => loader::load_file(path),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => f.write_str(url),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_selection() {
        assert_eq!(
            Source::from_options(Some("http://x/data".into()), None),
            Ok(Source::Url("http://x/data".into()))
        );
        assert_eq!(
            Source::from_options(None, Some("t.json".into())),
            Ok(Source::File("t.json".into()))
        );
        assert_eq!(
            Source::from_options(Some("u".into()), Some("f".into())),
            Err(ConfigError::ConflictingSources)
        );
        assert_eq!(Source::from_options(None, None), Err(ConfigError::MissingSource));
    }

    #[test]
    fn test_missing_source_mentions_env() {
        let message = ConfigError::MissingSource.to_string();
        assert!(message.contains(ENV_DATA_URL));
        assert!(message.contains(ENV_DATA_FILE));
    }

    #[test]
    fn test_file_source_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(&path, r#"{"last_updated": 1, "results": []}"#).unwrap();

        let dataset = Source::File(path.clone()).load().unwrap();
        assert!(dataset.is_empty());
        assert_eq!(Source::File(path.clone()).to_string(), path.display().to_string());
    }
}
