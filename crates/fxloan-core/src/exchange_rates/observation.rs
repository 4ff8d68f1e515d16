use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::FxLoanError;
use crate::types::Rate;
use crate::FxLoanResult;

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

/// Remittance platform quoting the rate.
///
/// Unknown names are kept verbatim (upper-cased) rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Platform {
    Cimb,
    Wise,
    PandaRemit,
    Other(String),
}

impl Platform {
    pub fn as_str(&self) -> &str {
        match self {
            Platform::Cimb => "CIMB",
            Platform::Wise => "WISE",
            Platform::PandaRemit => "PANDAREMIT",
            Platform::Other(name) => name.as_str(),
        }
    }

    /// Column key used in bucketed rows, e.g. `CIMBRate`.
    pub fn column_name(&self) -> String {
        format!("{}Rate", self.as_str())
    }
}

impl From<&str> for Platform {
    fn from(value: &str) -> Self {
        let name = value.trim().to_uppercase();
        match name.as_str() {
            "CIMB" => Platform::Cimb,
            "WISE" => Platform::Wise,
            "PANDAREMIT" => Platform::PandaRemit,
            _ => Platform::Other(name),
        }
    }
}

impl From<String> for Platform {
    fn from(value: String) -> Self {
        Platform::from(value.as_str())
    }
}

impl From<Platform> for String {
    fn from(value: Platform) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Observations
// ---------------------------------------------------------------------------

/// A single quoted rate. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateObservation {
    pub timestamp: DateTime<Utc>,
    pub rate: Rate,
    pub platform: Platform,
}

/// A record as it arrives from the JSON feed, before validation.
///
/// `exchange_rate` may be a string or a number; every field is optional so a
/// single bad record never fails the whole feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRateRecord {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub exchange_rate: Option<Value>,
    #[serde(default)]
    pub platform: Option<String>,
}

/// Result of validating a feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedParseOutcome {
    /// Valid observations in ascending timestamp order (input order kept for ties).
    pub observations: Vec<RateObservation>,
    /// Number of records rejected as malformed.
    pub dropped: usize,
}

/// Validate raw feed records into observations.
///
/// Records with a missing or unparseable timestamp, a missing platform, or a
/// rate that is not a positive number are dropped and counted.
pub fn parse_feed(records: &[RawRateRecord]) -> FeedParseOutcome {
    let mut observations = Vec::with_capacity(records.len());
    let mut dropped = 0usize;

    for (idx, record) in records.iter().enumerate() {
        match parse_record(record) {
            Ok(obs) => observations.push(obs),
            Err(e) => {
                warn!(record = idx, error = %e, "dropping malformed rate record");
                dropped += 1;
            }
        }
    }

    // Stable: equal timestamps keep feed order, which "last wins" relies on.
    observations.sort_by_key(|o| o.timestamp);

    FeedParseOutcome {
        observations,
        dropped,
    }
}

/// Parse a JSON array of feed records.
pub fn parse_feed_json(json: &str) -> FxLoanResult<FeedParseOutcome> {
    let records: Vec<RawRateRecord> = serde_json::from_str(json)?;
    Ok(parse_feed(&records))
}

fn parse_record(record: &RawRateRecord) -> FxLoanResult<RateObservation> {
    let raw_ts = record
        .timestamp
        .as_deref()
        .ok_or_else(|| FxLoanError::ParseError("missing timestamp".into()))?;
    let timestamp = parse_timestamp(raw_ts)?;

    let raw_rate = record
        .exchange_rate
        .as_ref()
        .ok_or_else(|| FxLoanError::ParseError("missing exchange_rate".into()))?;
    let rate = parse_rate(raw_rate)?;

    let platform = record
        .platform
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| FxLoanError::ParseError("missing platform".into()))?;

    Ok(RateObservation {
        timestamp,
        rate,
        platform: Platform::from(platform),
    })
}

/// Parse an ISO-8601 timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> FxLoanResult<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(naive.and_utc());
        }
    }
    Err(FxLoanError::DateError(format!("unrecognised timestamp '{trimmed}'")))
}

/// Parse a rate given as a JSON string or number. Must be strictly positive.
pub fn parse_rate(raw: &Value) -> FxLoanResult<Rate> {
    let text = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(FxLoanError::ParseError(format!(
                "exchange_rate must be a string or number, got {other}"
            )))
        }
    };

    let rate = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| FxLoanError::ParseError(format!("non-numeric exchange_rate '{text}'")))?;

    if rate <= Decimal::ZERO {
        return Err(FxLoanError::InvalidInput {
            field: "exchange_rate".into(),
            reason: format!("Rate must be positive, got {rate}"),
        });
    }
    Ok(rate)
}
