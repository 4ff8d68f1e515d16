use std::time::Instant;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::aggregation::{aggregate, AggregationConfig, BucketedRow};
use super::forecast::{
    fit_linear_trend, linear_regression_forecast, series_for, LinearTrend, PredictedPoint,
};
use super::observation::{Platform, RateObservation};
use super::statistics::{
    axis_domain, column_values, median, platform_snapshots, AxisDomain, PlatformSnapshot,
};
use super::timeframe::TimeFrame;
use crate::pagination::{paginate, Page};
use crate::types::{with_metadata, ComputationOutput};
use crate::FxLoanResult;

const DEFAULT_RECORDS_PER_PAGE: usize = 6;

/// Everything a rate dashboard view is computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateDashboardInput {
    pub observations: Vec<RateObservation>,
    #[serde(default)]
    pub timeframe: TimeFrame,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    /// Points to forecast; `Some(0)` disables, `None` uses the timeframe default.
    #[serde(default)]
    pub forecast_horizon: Option<usize>,
    /// Column the forecast and axis domain use; defaults to the primary column.
    #[serde(default)]
    pub forecast_platform: Option<Platform>,
    /// Reference instant for 24h/7d/30d changes; defaults to the newest observation.
    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
    /// Feed records rejected while building `observations`, reported as a warning.
    #[serde(default)]
    pub dropped_records: usize,
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    DEFAULT_RECORDS_PER_PAGE
}

impl RateDashboardInput {
    pub fn new(observations: Vec<RateObservation>, timeframe: TimeFrame) -> Self {
        Self {
            observations,
            timeframe,
            aggregation: AggregationConfig::default(),
            forecast_horizon: None,
            forecast_platform: None,
            as_of: None,
            page: default_page(),
            per_page: default_per_page(),
            dropped_records: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateDashboardOutput {
    pub timeframe: TimeFrame,
    /// Ascending rows for the chart.
    pub chart_rows: Vec<BucketedRow>,
    /// Descending rows, the order exported and paged through.
    pub table_rows: Vec<BucketedRow>,
    pub table_page: Page<BucketedRow>,
    pub total_buckets: usize,
    pub latest: Vec<PlatformSnapshot>,
    pub forecast_platform: Option<Platform>,
    pub axis_domain: Option<AxisDomain>,
    pub median: Option<Decimal>,
    pub trend: Option<LinearTrend>,
    /// Appended after the last chart row; never part of `chart_rows`.
    pub forecast: Vec<PredictedPoint>,
}

/// Compute every derived view of a rate dashboard in one pass.
pub fn analyze_rates(
    input: &RateDashboardInput,
) -> FxLoanResult<ComputationOutput<RateDashboardOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.dropped_records > 0 {
        warnings.push(format!(
            "Dropped {} malformed feed records",
            input.dropped_records
        ));
    }
    let non_positive = input
        .observations
        .iter()
        .filter(|o| o.rate <= Decimal::ZERO)
        .count();
    if non_positive > 0 {
        warnings.push(format!(
            "Ignored {non_positive} observations with a non-positive rate"
        ));
    }

    let series = aggregate(&input.observations, input.timeframe, &input.aggregation)?;
    if series.total_buckets > series.chart_rows.len() {
        warnings.push(format!(
            "Showing the most recent {} of {} {} buckets",
            series.chart_rows.len(),
            series.total_buckets,
            input.timeframe
        ));
    }

    let table_page = paginate(&series.table_rows, input.page, input.per_page)?;

    let focus = input
        .forecast_platform
        .clone()
        .or_else(|| input.aggregation.primary_platform().cloned());

    let (axis, mid, trend, forecast) = match &focus {
        Some(platform) => {
            let values = column_values(&series.chart_rows, platform);
            let horizon = input
                .forecast_horizon
                .unwrap_or_else(|| input.timeframe.default_forecast_horizon());
            let points = series_for(&series.chart_rows, platform);
            let forecast = linear_regression_forecast(&points, input.timeframe, horizon)?;
            if horizon > 0 && forecast.is_empty() {
                warnings.push(format!(
                    "Forecast skipped: {platform} has fewer than 2 bucketed values"
                ));
            }
            (
                axis_domain(&values),
                median(&values),
                fit_linear_trend(&values),
                forecast,
            )
        }
        None => (None, None, None, Vec::new()),
    };

    let as_of = input
        .as_of
        .or_else(|| input.observations.iter().map(|o| o.timestamp).max());
    let latest = match as_of {
        Some(ts) => platform_snapshots(&input.observations, ts),
        None => Vec::new(),
    };

    let output = RateDashboardOutput {
        timeframe: input.timeframe,
        chart_rows: series.chart_rows,
        table_rows: series.table_rows,
        table_page,
        total_buckets: series.total_buckets,
        latest,
        forecast_platform: focus,
        axis_domain: axis,
        median: mid,
        trend,
        forecast,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Time-bucketed rate aggregation with OLS trend extrapolation",
        &serde_json::json!({
            "timeframe": input.timeframe,
            "aggregation": input.aggregation,
            "observations": input.observations.len(),
            "as_of": as_of,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn hourly(n: u32) -> Vec<RateObservation> {
        (0..n)
            .flat_map(|h| {
                let ts = Utc.with_ymd_and_hms(2024, 8, 17, h, 15, 0).unwrap();
                [
                    RateObservation {
                        timestamp: ts,
                        rate: dec!(3.30) + Decimal::from(h) * dec!(0.01),
                        platform: Platform::Cimb,
                    },
                    RateObservation {
                        timestamp: ts,
                        rate: dec!(3.40),
                        platform: Platform::Wise,
                    },
                ]
            })
            .collect()
    }

    #[test]
    fn test_dashboard_end_to_end() {
        let input = RateDashboardInput::new(hourly(15), TimeFrame::Hour);
        let out = analyze_rates(&input).unwrap();
        let r = &out.result;

        assert_eq!(r.total_buckets, 15);
        assert_eq!(r.chart_rows.len(), 12);
        assert_eq!(r.table_page.items.len(), 6);
        assert_eq!(r.table_page.total_pages, 2);
        assert_eq!(r.table_page.items[0], r.chart_rows[11]);
        assert_eq!(r.forecast.len(), 24);
        assert_eq!(r.forecast_platform, Some(Platform::Cimb));
        assert_eq!(r.trend.unwrap().slope, dec!(0.01));
        assert_eq!(r.latest.len(), 2);
        assert!(out.warnings.iter().any(|w| w.contains("most recent 12 of 15")));
    }

    #[test]
    fn test_dashboard_empty_feed() {
        let input = RateDashboardInput::new(Vec::new(), TimeFrame::Day);
        let out = analyze_rates(&input).unwrap();
        assert!(out.result.chart_rows.is_empty());
        assert!(out.result.forecast.is_empty());
        assert!(out.result.latest.is_empty());
        assert!(out.result.axis_domain.is_none());
    }

    #[test]
    fn test_dashboard_forecast_disabled() {
        let mut input = RateDashboardInput::new(hourly(4), TimeFrame::Hour);
        input.forecast_horizon = Some(0);
        let out = analyze_rates(&input).unwrap();
        assert!(out.result.forecast.is_empty());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_dashboard_warns_on_dropped_and_non_positive_rates() {
        let mut observations = hourly(3);
        observations.push(RateObservation {
            timestamp: Utc.with_ymd_and_hms(2024, 8, 17, 5, 0, 0).unwrap(),
            rate: dec!(-3.3),
            platform: Platform::Cimb,
        });
        let mut input = RateDashboardInput::new(observations, TimeFrame::Hour);
        input.dropped_records = 2;
        let out = analyze_rates(&input).unwrap();

        assert_eq!(out.result.chart_rows.len(), 3);
        let cimb = out
            .result
            .latest
            .iter()
            .find(|s| s.platform == Platform::Cimb)
            .unwrap();
        assert_eq!(cimb.latest_rate, dec!(3.32));
        assert!(out.warnings.iter().any(|w| w == "Dropped 2 malformed feed records"));
        assert!(out.warnings.iter().any(|w| w.contains("Ignored 1 observations")));
    }

    #[test]
    fn test_dashboard_rejects_oversized_horizon() {
        let mut input = RateDashboardInput::new(hourly(4), TimeFrame::Hour);
        input.forecast_horizon = Some(usize::MAX);
        assert!(analyze_rates(&input).is_err());
    }
}
