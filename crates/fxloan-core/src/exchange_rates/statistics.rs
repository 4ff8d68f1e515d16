use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::aggregation::BucketedRow;
use super::observation::{Platform, RateObservation};
use crate::types::Rate;

/// Fraction of the mean-to-extreme distance the axis band extends.
const AXIS_BAND: Decimal = dec!(0.05);

// ---------------------------------------------------------------------------
// Latest and historical rates
// ---------------------------------------------------------------------------

/// Most recent observation per platform, independent of bucketing.
///
/// Equal timestamps resolve to the later input record. Non-positive rates are
/// never a valid quote and are skipped.
pub fn latest_rates(observations: &[RateObservation]) -> BTreeMap<Platform, RateObservation> {
    let mut latest: BTreeMap<Platform, RateObservation> = BTreeMap::new();
    for obs in observations.iter().filter(|o| o.rate > Decimal::ZERO) {
        match latest.get(&obs.platform) {
            Some(current) if obs.timestamp < current.timestamp => {}
            _ => {
                latest.insert(obs.platform.clone(), obs.clone());
            }
        }
    }
    latest
}

/// First observation for `platform` at or after `since`, in time order.
pub fn rate_at_or_after<'a>(
    observations: &'a [RateObservation],
    platform: &Platform,
    since: DateTime<Utc>,
) -> Option<&'a RateObservation> {
    observations
        .iter()
        .filter(|o| &o.platform == platform && o.timestamp >= since && o.rate > Decimal::ZERO)
        .fold(None, |best: Option<&RateObservation>, o| match best {
            Some(b) if b.timestamp <= o.timestamp => Some(b),
            _ => Some(o),
        })
}

/// `(current − historical) / historical × 100`, defined as 0 for a zero base.
pub fn percent_change(current: Rate, historical: Rate) -> Decimal {
    if historical.is_zero() {
        return Decimal::ZERO;
    }
    (current - historical) / historical * dec!(100)
}

/// Look-back windows used for change displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeWindow {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

impl ChangeWindow {
    pub const ALL: [ChangeWindow; 3] = [ChangeWindow::Day, ChangeWindow::Week, ChangeWindow::Month];

    pub fn duration(&self) -> Duration {
        match self {
            ChangeWindow::Day => Duration::hours(24),
            ChangeWindow::Week => Duration::days(7),
            ChangeWindow::Month => Duration::days(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateChange {
    pub window: ChangeWindow,
    /// Rate at the start of the window; `None` when no observation exists.
    pub historical: Option<Rate>,
    pub change_pct: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSnapshot {
    pub platform: Platform,
    pub latest_rate: Rate,
    pub updated_at: DateTime<Utc>,
    pub changes: Vec<RateChange>,
}

/// Latest rate per platform plus its change over each look-back window,
/// measured from `as_of`.
pub fn platform_snapshots(
    observations: &[RateObservation],
    as_of: DateTime<Utc>,
) -> Vec<PlatformSnapshot> {
    latest_rates(observations)
        .into_values()
        .map(|latest| {
            let changes = ChangeWindow::ALL
                .iter()
                .map(|window| {
                    let since = as_of - window.duration();
                    let historical =
                        rate_at_or_after(observations, &latest.platform, since).map(|o| o.rate);
                    RateChange {
                        window: *window,
                        historical,
                        change_pct: historical.map(|h| percent_change(latest.rate, h)),
                    }
                })
                .collect();
            PlatformSnapshot {
                platform: latest.platform,
                latest_rate: latest.rate,
                updated_at: latest.timestamp,
                changes,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Column statistics
// ---------------------------------------------------------------------------

/// Non-sentinel values of one platform column.
pub fn column_values(rows: &[BucketedRow], platform: &Platform) -> Vec<Rate> {
    rows.iter().filter_map(|r| r.rate(platform)).collect()
}

pub fn average(values: &[Rate]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let total: Decimal = values.iter().sum();
    Some(total / Decimal::from(values.len()))
}

/// Middle value; the mean of the two middle values for even counts.
pub fn median(values: &[Rate]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / dec!(2))
    } else {
        Some(sorted[mid])
    }
}

/// Chart y-axis band around the mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisDomain {
    pub lower: Decimal,
    pub upper: Decimal,
    pub min: Rate,
    pub max: Rate,
    pub average: Decimal,
}

/// `[max(avg − (avg−min)·0.05, min), min(avg + (max−avg)·0.05, max)]`.
///
/// Tighter than `[min, max]` so outliers do not flatten the line.
pub fn axis_domain(values: &[Rate]) -> Option<AxisDomain> {
    let avg = average(values)?;
    let min = values.iter().copied().min()?;
    let max = values.iter().copied().max()?;

    Some(AxisDomain {
        lower: (avg - (avg - min) * AXIS_BAND).max(min),
        upper: (avg + (max - avg) * AXIS_BAND).min(max),
        min,
        max,
        average: avg,
    })
}
