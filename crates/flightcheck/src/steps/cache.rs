//! Validation of the flight list the app caches in `localStorage`.

use super::{ScenarioStep, StepContext, StepId};
use crate::error::Result;
use crate::findings::FindingKind;
use crate::probe::PageProbe;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Allowed clock skew before a cache timestamp counts as "in the future".
const FUTURE_TOLERANCE: TimeDelta = TimeDelta::minutes(1);

/// One cached flight as written by the app.
///
/// Only `date` is required; the rest mirror the columns of the sheet the
/// app reads from and may be missing on partially filled rows. Sheet cells
/// that hold numbers or booleans are kept as their text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightRecord {
    pub date: String,
    #[serde(default, deserialize_with = "scalar_text")]
    pub airline: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub departure: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub arrival: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub dept_time: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub arr_time: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub flight_no: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub airline_en: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub departure_short: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub arrival_short: Option<String>,
}

fn scalar_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;
    use serde_json::Value;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a text or number column, found {other}"
        ))),
    }
}

/// Why cached data was rejected.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache is not a flight list: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("cache timestamp '{0}' is not an integer")]
    TimestampNotInteger(String),

    #[error("cache timestamp {0} is not a valid epoch millisecond value")]
    TimestampOutOfRange(i64),

    #[error("cache timestamp {millis} is {ahead_ms} ms in the future")]
    TimestampInFuture { millis: i64, ahead_ms: i64 },
}

/// Parses the cached list.
///
/// # Errors
///
/// Returns `Malformed` for anything that is not a JSON array of records.
pub fn parse_flight_cache(raw: &str) -> std::result::Result<Vec<FlightRecord>, CacheError> {
    Ok(serde_json::from_str(raw)?)
}

/// Age of a cache written at the epoch-millisecond timestamp `raw`.
///
/// # Errors
///
/// Returns an error when `raw` is not an integer, is not positive or does
/// not fit a date, or lies more than a minute after `now`.
pub fn cache_age(raw: &str, now: DateTime<Utc>) -> std::result::Result<TimeDelta, CacheError> {
    let millis: i64 = raw
        .trim()
        .parse()
        .map_err(|_| CacheError::TimestampNotInteger(raw.to_string()))?;
    if millis <= 0 {
        return Err(CacheError::TimestampOutOfRange(millis));
    }
    let written =
        DateTime::from_timestamp_millis(millis).ok_or(CacheError::TimestampOutOfRange(millis))?;

    let age = now - written;
    if age < -FUTURE_TOLERANCE {
        return Err(CacheError::TimestampInFuture {
            millis,
            ahead_ms: -age.num_milliseconds(),
        });
    }
    Ok(age.max(TimeDelta::zero()))
}

pub struct CacheValidation;

#[async_trait]
impl ScenarioStep for CacheValidation {
    fn id(&self) -> StepId {
        StepId::CacheValidation
    }

    fn description(&self) -> &'static str {
        "cached flight list and its timestamp are well formed"
    }

    async fn run(&self, probe: &dyn PageProbe, cx: &mut StepContext<'_>) -> Result<()> {
        let keys = cx.config().storage.clone();

        match probe.storage_item(&keys.cache_key).await? {
            None => cx.observe(format!("`{}` not written yet", keys.cache_key)),
            Some(raw) => match parse_flight_cache(&raw) {
                Ok(records) => cx.observe(format!("{} cached flights", records.len())),
                Err(e) => cx.finding(FindingKind::Data, e.to_string()),
            },
        }

        if let Some(raw) = probe.storage_item(&keys.timestamp_key).await? {
            match cache_age(&raw, Utc::now()) {
                Ok(age) => cx.observe(format!("cache age {} min", age.num_minutes())),
                Err(e) => cx.finding(FindingKind::Data, e.to_string()),
            }
        }
        Ok(())
    }
}
