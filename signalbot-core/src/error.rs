//! Error taxonomy for the engine.
//!
//! A denied signal request is not an error; see [`crate::policy::Denial`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::UserId;

/// Bad administrative input. Always raised before any record is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid user id '{0}': expected an integer")]
    InvalidUserId(String),
    #[error("invalid days value '{0}': expected an integer")]
    InvalidDays(String),
    #[error("subscription length must be a positive number of days, got {0}")]
    NonPositiveDays(i64),
    #[error("subscription length of {0} days is out of range")]
    DaysOutOfRange(i64),
}

/// Failure to write the user table. The engine logs these and carries on.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode user table: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Configuration could not be read or is inconsistent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Parse an administrative user id argument.
pub fn parse_user_id(raw: &str) -> Result<UserId, ValidationError> {
    raw.parse()
}

/// Parse an administrative days argument. Positivity is checked by the engine.
pub fn parse_days(raw: &str) -> Result<i64, ValidationError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidDays(raw.to_string()))
}
