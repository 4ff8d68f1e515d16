use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, TimeZone,
    Timelike, Utc,
};
use serde::{Deserialize, Serialize};

use crate::error::FxLoanError;
use crate::FxLoanResult;

/// Width of the window observations are grouped into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFrame {
    #[serde(rename = "5min")]
    FiveMinutes,
    #[default]
    Hour,
    Day,
    Month,
    Year,
}

impl TimeFrame {
    pub const ALL: [TimeFrame; 5] = [
        TimeFrame::FiveMinutes,
        TimeFrame::Hour,
        TimeFrame::Day,
        TimeFrame::Month,
        TimeFrame::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFrame::FiveMinutes => "5min",
            TimeFrame::Hour => "hour",
            TimeFrame::Day => "day",
            TimeFrame::Month => "month",
            TimeFrame::Year => "year",
        }
    }

    /// Number of points a trend forecast extends by default.
    pub fn default_forecast_horizon(&self) -> usize {
        match self {
            TimeFrame::FiveMinutes => 12,
            TimeFrame::Hour => 24,
            TimeFrame::Day => 7,
            TimeFrame::Month => 3,
            TimeFrame::Year => 1,
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeFrame {
    type Err = FxLoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "5min" | "5m" | "five_minutes" | "fiveminutes" => Ok(TimeFrame::FiveMinutes),
            "hour" | "hourly" | "1h" => Ok(TimeFrame::Hour),
            "day" | "daily" | "1d" => Ok(TimeFrame::Day),
            "month" | "monthly" => Ok(TimeFrame::Month),
            "year" | "yearly" | "annual" => Ok(TimeFrame::Year),
            other => Err(FxLoanError::InvalidInput {
                field: "timeframe".into(),
                reason: format!("Unknown timeframe '{other}'. Use: 5min, hour, day, month, year"),
            }),
        }
    }
}

/// Build a fixed offset from minutes east of UTC.
pub fn offset_from_minutes(minutes: i32) -> FxLoanResult<FixedOffset> {
    FixedOffset::east_opt(minutes.saturating_mul(60)).ok_or_else(|| FxLoanError::InvalidInput {
        field: "utc_offset_minutes".into(),
        reason: format!("Offset of {minutes} minutes is out of range (±1439)"),
    })
}

/// Start of the window containing `timestamp`, on the calendar of `offset`.
///
/// Two timestamps share a bucket iff their keys are equal.
pub fn bucket_key(
    timestamp: DateTime<Utc>,
    timeframe: TimeFrame,
    offset: FixedOffset,
) -> FxLoanResult<DateTime<FixedOffset>> {
    let local = timestamp.with_timezone(&offset).naive_local();
    let date = local.date();

    let truncated: Option<NaiveDateTime> = match timeframe {
        TimeFrame::FiveMinutes => {
            date.and_hms_opt(local.hour(), local.minute() - local.minute() % 5, 0)
        }
        TimeFrame::Hour => date.and_hms_opt(local.hour(), 0, 0),
        TimeFrame::Day => date.and_hms_opt(0, 0, 0),
        TimeFrame::Month => NaiveDate::from_ymd_opt(local.year(), local.month(), 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
        TimeFrame::Year => {
            NaiveDate::from_ymd_opt(local.year(), 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        }
    };

    let naive = truncated.ok_or_else(|| {
        FxLoanError::DateError(format!("cannot truncate {timestamp} to {timeframe}"))
    })?;

    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| FxLoanError::DateError(format!("ambiguous bucket start {naive}")))
}

/// Human-readable label for a bucket start.
pub fn format_bucket(key: &DateTime<FixedOffset>, timeframe: TimeFrame) -> String {
    let pattern = match timeframe {
        TimeFrame::FiveMinutes | TimeFrame::Hour => "%Y-%m-%d %H:%M",
        TimeFrame::Day => "%Y-%m-%d",
        TimeFrame::Month => "%B %Y",
        TimeFrame::Year => "%Y",
    };
    key.format(pattern).to_string()
}

/// Move `from` forward by `steps` windows of `timeframe`.
///
/// Month and year steps follow the calendar (clamped to month end).
pub fn advance(
    from: DateTime<FixedOffset>,
    timeframe: TimeFrame,
    steps: u32,
) -> FxLoanResult<DateTime<FixedOffset>> {
    let steps_i = i64::from(steps);
    let next = match timeframe {
        TimeFrame::FiveMinutes => from.checked_add_signed(Duration::minutes(5 * steps_i)),
        TimeFrame::Hour => from.checked_add_signed(Duration::hours(steps_i)),
        TimeFrame::Day => from.checked_add_signed(Duration::days(steps_i)),
        TimeFrame::Month => from.checked_add_months(Months::new(steps)),
        TimeFrame::Year => steps
            .checked_mul(12)
            .and_then(|m| from.checked_add_months(Months::new(m))),
    };
    next.ok_or_else(|| {
        FxLoanError::DateError(format!("{from} + {steps} x {timeframe} is out of range"))
    })
}
