//! Column encoding shared by the repositories.

use std::str::FromStr;

use chrono::SecondsFormat;
use serde::de::DeserializeOwned;

use careops_domain::time::Timestamp;

/// Fixed-width RFC 3339 so stored timestamps compare correctly as text.
pub(crate) fn ts(value: Timestamp) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn opt_ts(value: Option<Timestamp>) -> Option<String> {
    value.map(ts)
}

fn decode_error(err: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}

pub(crate) fn parse<T>(value: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse().map_err(decode_error)
}

pub(crate) fn parse_ts(value: &str) -> Result<Timestamp, sqlx::Error> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.to_utc())
        .map_err(decode_error)
}

pub(crate) fn parse_opt_ts(value: Option<String>) -> Result<Option<Timestamp>, sqlx::Error> {
    value.as_deref().map(parse_ts).transpose()
}

pub(crate) fn parse_json<T: DeserializeOwned>(value: &str) -> Result<T, sqlx::Error> {
    serde_json::from_str(value).map_err(decode_error)
}

/// `COUNT(*)` as an unsigned counter.
pub(crate) fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}
