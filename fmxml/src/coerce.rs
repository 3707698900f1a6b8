//! Conversion of raw `<data>` text into typed field values.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use url::Url;

use crate::{
    errors::{CoercionError, CoercionTarget},
    format::FormatSet,
    meta::{FieldMeta, ResultType},
};

/// Year of the placeholder date that anchors time-of-day values (1 Jan 4713 BC).
pub const TIME_SENTINEL_YEAR: i32 = -4712;

/// The placeholder date time-of-day values are anchored to.
pub fn time_sentinel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(TIME_SENTINEL_YEAR, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// A single coerced datum.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    /// Arbitrary precision; serialized as a decimal string.
    Number(BigDecimal),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    /// Location of the binary content; never fetched by the parser.
    Container(Url),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&BigDecimal> {
        match self {
            FieldValue::Number(number) => Some(number),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(date) => Some(*date),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            FieldValue::Time(time) => Some(*time),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            FieldValue::Timestamp(timestamp) => Some(*timestamp),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&Url> {
        match self {
            FieldValue::Container(url) => Some(url),
            _ => None,
        }
    }

    /// Date-and-time view of the value; times are anchored on [`time_sentinel_date`].
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            FieldValue::Timestamp(timestamp) => Some(*timestamp),
            FieldValue::Time(time) => Some(time_sentinel_date().and_time(*time)),
            FieldValue::Date(date) => date.and_hms_opt(0, 0, 0),
            _ => None,
        }
    }
}

impl PartialEq<&str> for FieldValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_text() == Some(*other)
    }
}

/// Scheme, host and port of the owning connection, used to turn container
/// paths into absolute URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerBase {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl ContainerBase {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        }
    }

    /// Resolves a container datum. Server-relative paths are joined to this
    /// base; externally stored containers already carry a full URL.
    pub fn url_for(&self, path: &str) -> Option<Url> {
        if !path.starts_with('/') {
            return Url::parse(path).ok();
        }
        Url::parse(&format!("{}://{}:{}{}", self.scheme, self.host, self.port, path)).ok()
    }
}

impl Default for ContainerBase {
    fn default() -> Self {
        Self::new("https", "localhost", 443)
    }
}

/// Converts one raw datum according to its field's declared result type.
///
/// Empty text on a non-text field is "no value" and yields `Ok(None)`, as
/// does any result type this crate does not recognise.
pub fn coerce(
    raw: &str,
    meta: &FieldMeta,
    formats: &FormatSet,
    container: &ContainerBase,
) -> Result<Option<FieldValue>, CoercionError> {
    if raw.is_empty() && meta.result != ResultType::Text {
        return Ok(None);
    }

    let value = match &meta.result {
        ResultType::Text => FieldValue::Text(raw.to_string()),
        ResultType::Number => FieldValue::Number(parse_number(raw, meta)?),
        ResultType::Date => NaiveDate::parse_from_str(raw, &formats.date)
            .map(FieldValue::Date)
            .map_err(|_| failure(raw, meta, CoercionTarget::Date, &formats.date))?,
        ResultType::Time => NaiveTime::parse_from_str(raw, &formats.time)
            .map(FieldValue::Time)
            .map_err(|_| failure(raw, meta, CoercionTarget::Time, &formats.time))?,
        ResultType::Timestamp => NaiveDateTime::parse_from_str(raw, &formats.timestamp)
            .map(FieldValue::Timestamp)
            .map_err(|_| failure(raw, meta, CoercionTarget::Timestamp, &formats.timestamp))?,
        ResultType::Container => container
            .url_for(raw)
            .map(FieldValue::Container)
            .ok_or_else(|| CoercionError::new(&meta.name, raw, CoercionTarget::Container))?,
        ResultType::Other(_) => return Ok(None),
    };

    Ok(Some(value))
}

fn parse_number(raw: &str, meta: &FieldMeta) -> Result<BigDecimal, CoercionError> {
    BigDecimal::from_str(raw.trim())
        .map_err(|_| CoercionError::new(&meta.name, raw, CoercionTarget::Number))
}

fn failure(raw: &str, meta: &FieldMeta, target: CoercionTarget, pattern: &str) -> CoercionError {
    CoercionError::new(&meta.name, raw, target).with_pattern(pattern)
}
