//! Ordinary least squares trend line over bucket index, extended forward.
//!
//! The fit regresses `rate` on `i = 0..n-1`:
//!
//! ```text
//! slope     = (nΣxy − ΣxΣy) / (nΣx² − (Σx)²)
//! intercept = (Σy − slope·Σx) / n
//! ```
//!
//! This is a plain trend extrapolation: no error bounds, no seasonality.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::aggregation::BucketedRow;
use super::observation::Platform;
use super::timeframe::{advance, TimeFrame};
use crate::error::FxLoanError;
use crate::types::Rate;
use crate::FxLoanResult;

/// Upper bound on forecast points per request.
pub const MAX_FORECAST_HORIZON: usize = 1000;

/// A point of an input series; `None` rates are skipped by the fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub rate: Option<Rate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearTrend {
    pub slope: Decimal,
    pub intercept: Decimal,
    /// Number of points the line was fitted on.
    pub points: usize,
}

impl LinearTrend {
    pub fn value_at(&self, index: usize) -> Decimal {
        self.intercept + self.slope * Decimal::from(index)
    }
}

/// Extrapolated value following the last real bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub rate: Rate,
}

/// Fit `y = intercept + slope·i`. Returns `None` for fewer than two values.
pub fn fit_linear_trend(values: &[Rate]) -> Option<LinearTrend> {
    if values.len() < 2 {
        return None;
    }

    let n = Decimal::from(values.len());
    let mut sum_x = Decimal::ZERO;
    let mut sum_y = Decimal::ZERO;
    let mut sum_xy = Decimal::ZERO;
    let mut sum_xx = Decimal::ZERO;

    for (i, y) in values.iter().enumerate() {
        let x = Decimal::from(i);
        sum_x += x;
        sum_y += *y;
        sum_xy += x * *y;
        sum_xx += x * x;
    }

    let denom = n * sum_xx - sum_x * sum_x;
    if denom.is_zero() {
        return None;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;

    Some(LinearTrend {
        slope,
        intercept,
        points: values.len(),
    })
}

/// Extract one platform's column from chart-ordered rows.
pub fn series_for(rows: &[BucketedRow], platform: &Platform) -> Vec<SeriesPoint> {
    rows.iter()
        .map(|row| SeriesPoint {
            timestamp: row.bucket_start,
            rate: row.rate(platform),
        })
        .collect()
}

/// Forecast `horizon` points after the last defined value of `series`.
///
/// Point `k` (1-based) sits at index `n - 1 + k` and at the last observed
/// timestamp advanced by `k` windows of `timeframe`. Fewer than two defined
/// values produce an empty forecast. Horizons above [`MAX_FORECAST_HORIZON`]
/// are rejected.
pub fn linear_regression_forecast(
    series: &[SeriesPoint],
    timeframe: TimeFrame,
    horizon: usize,
) -> FxLoanResult<Vec<PredictedPoint>> {
    if horizon > MAX_FORECAST_HORIZON {
        return Err(FxLoanError::InvalidInput {
            field: "forecast_horizon".into(),
            reason: format!("Horizon {horizon} exceeds the maximum of {MAX_FORECAST_HORIZON}"),
        });
    }

    let defined: Vec<(DateTime<FixedOffset>, Rate)> = series
        .iter()
        .filter_map(|p| p.rate.map(|r| (p.timestamp, r)))
        .collect();

    let values: Vec<Rate> = defined.iter().map(|(_, r)| *r).collect();
    let (Some(trend), Some(&(last_ts, _))) = (fit_linear_trend(&values), defined.last()) else {
        debug!(points = defined.len(), "not enough points for a trend forecast");
        return Ok(Vec::new());
    };

    let n = trend.points;
    let mut out = Vec::with_capacity(horizon);
    for k in 1..=horizon {
        let steps = u32::try_from(k).unwrap_or(u32::MAX);
        out.push(PredictedPoint {
            timestamp: advance(last_ts, timeframe, steps)?,
            rate: trend.value_at(n - 1 + k),
        });
    }

    debug!(
        points = n,
        horizon,
        slope = %trend.slope,
        "extended series with linear trend"
    );

    Ok(out)
}
