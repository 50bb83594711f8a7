//! Column codecs between domain values and SQLite storage types.
//!
//! Decimals are stored as TEXT to stay exact; timestamps as epoch
//! milliseconds of the naive wall-clock value.

use crate::repo::error::{RepoError, RepoResult};
use chrono::{DateTime, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

pub(crate) fn decimal_to_db(value: Decimal) -> String {
    value.to_string()
}

pub(crate) fn parse_decimal(column: &str, text: &str) -> RepoResult<Decimal> {
    Decimal::from_str(text)
        .map_err(|_| RepoError::InvalidData(format!("invalid decimal `{text}` in {column}")))
}

pub(crate) fn parse_optional_decimal(column: &str, text: Option<String>) -> RepoResult<Option<Decimal>> {
    text.map(|value| parse_decimal(column, &value)).transpose()
}

pub(crate) fn datetime_to_db(value: NaiveDateTime) -> i64 {
    value.and_utc().timestamp_millis()
}

pub(crate) fn parse_datetime(column: &str, millis: i64) -> RepoResult<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis)
        .map(|value| value.naive_utc())
        .ok_or_else(|| RepoError::InvalidData(format!("invalid timestamp `{millis}` in {column}")))
}

pub(crate) fn parse_optional_datetime(
    column: &str,
    millis: Option<i64>,
) -> RepoResult<Option<NaiveDateTime>> {
    millis.map(|value| parse_datetime(column, value)).transpose()
}

pub(crate) fn parse_uuid(column: &str, text: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {column}")))
}

pub(crate) fn parse_bool(column: &str, value: i64) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn parse_rating(column: &str, value: Option<i64>) -> RepoResult<Option<u8>> {
    value
        .map(|raw| {
            u8::try_from(raw)
                .map_err(|_| RepoError::InvalidData(format!("invalid rating `{raw}` in {column}")))
        })
        .transpose()
}
