//! Column conversions shared by the SQLite repositories.
//!
//! Ids are stored as hyphenated UUID text and timestamps as RFC 3339 text.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use flexflow_types::error::RepositoryError;

pub(crate) fn parse_id<T>(s: &str) -> Result<T, RepositoryError>
where
    T: FromStr<Err = uuid::Error>,
{
    s.parse::<T>()
        .map_err(|e| RepositoryError::Query(format!("invalid UUID: {e}")))
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE"))
}
