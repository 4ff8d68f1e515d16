use chrono::{DateTime, Duration, TimeZone, Utc};
use fxloan_core::exchange_rates::aggregation::{self, AggregationConfig, AggregationMode};
use fxloan_core::exchange_rates::dashboard::{analyze_rates, RateDashboardInput};
use fxloan_core::exchange_rates::forecast::{self, SeriesPoint};
use fxloan_core::exchange_rates::observation::{self, Platform, RateObservation};
use fxloan_core::exchange_rates::statistics;
use fxloan_core::exchange_rates::timeframe::{self, TimeFrame};
use fxloan_core::FxLoanError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 8, 17, h, m, 0).unwrap()
}

fn obs(ts: DateTime<Utc>, rate: Decimal, platform: Platform) -> RateObservation {
    RateObservation {
        timestamp: ts,
        rate,
        platform,
    }
}

/// A week of observations every 20 minutes across the three known platforms.
fn week_of_feed() -> Vec<RateObservation> {
    let start = Utc.with_ymd_and_hms(2024, 8, 10, 0, 0, 0).unwrap();
    (0..(7 * 24 * 3))
        .flat_map(|i: i64| {
            let ts = start + Duration::minutes(20 * i);
            let drift = Decimal::from(i) * dec!(0.0001);
            [
                obs(ts, dec!(3.30) + drift, Platform::Cimb),
                obs(ts, dec!(3.35) + drift, Platform::Wise),
                obs(ts, dec!(3.33) + drift, Platform::PandaRemit),
            ]
        })
        .collect()
}

// ===========================================================================
// Bucketing
// ===========================================================================

#[test]
fn test_two_cimb_points_in_one_hour() {
    let feed = vec![
        obs(at(10, 2), dec!(4.30), Platform::Cimb),
        obs(at(10, 7), dec!(4.32), Platform::Cimb),
    ];

    let last = aggregation::aggregate(&feed, TimeFrame::Hour, &AggregationConfig::default())
        .unwrap();
    assert_eq!(last.chart_rows.len(), 1);
    assert_eq!(last.chart_rows[0].bucket_start.with_timezone(&Utc), at(10, 0));
    assert_eq!(last.chart_rows[0].rate(&Platform::Cimb), Some(dec!(4.32)));
    assert_eq!(last.chart_rows[0].rate(&Platform::Wise), None);

    let config = AggregationConfig {
        mode: AggregationMode::Mean,
        ..AggregationConfig::default()
    };
    let mean = aggregation::aggregate(&feed, TimeFrame::Hour, &config).unwrap();
    assert_eq!(mean.chart_rows[0].rate(&Platform::Cimb), Some(dec!(4.31)));
}

#[test]
fn test_aggregate_is_idempotent() {
    let feed = week_of_feed();
    let config = AggregationConfig::default();
    for tf in TimeFrame::ALL {
        let a = aggregation::aggregate(&feed, tf, &config).unwrap();
        let b = aggregation::aggregate(&feed, tf, &config).unwrap();
        assert_eq!(a, b, "timeframe {tf}");
    }
}

#[test]
fn test_table_is_reverse_of_chart_and_chart_is_ascending() {
    let feed = week_of_feed();
    for tf in TimeFrame::ALL {
        let series =
            aggregation::aggregate(&feed, tf, &AggregationConfig::default()).unwrap();
        let reversed: Vec<_> = series.chart_rows.iter().rev().cloned().collect();
        assert_eq!(series.table_rows, reversed);
        assert!(series
            .chart_rows
            .windows(2)
            .all(|w| w[0].bucket_start < w[1].bucket_start));
        assert!(series.chart_rows.len() <= 12);
    }
}

#[test]
fn test_bucket_keys_are_floored_to_window() {
    let feed = week_of_feed();
    let offset = timeframe::offset_from_minutes(0).unwrap();
    for tf in TimeFrame::ALL {
        for o in &feed {
            let key = timeframe::bucket_key(o.timestamp, tf, offset).unwrap();
            assert!(key.with_timezone(&Utc) <= o.timestamp);
            let next = timeframe::advance(key, tf, 1).unwrap();
            assert!(
                o.timestamp < next.with_timezone(&Utc),
                "{tf}: {} not before {next}",
                o.timestamp
            );
        }
    }
}

#[test]
fn test_unbounded_bucket_count_keeps_everything() {
    let config = AggregationConfig {
        bucket_count: None,
        ..AggregationConfig::default()
    };
    let series = aggregation::aggregate(&week_of_feed(), TimeFrame::Hour, &config).unwrap();
    assert_eq!(series.total_buckets, 7 * 24);
    assert_eq!(series.chart_rows.len(), 7 * 24);
}

#[test]
fn test_utc_offset_shifts_day_boundaries() {
    // 23:30 UTC is already the next day in UTC+8.
    let feed = vec![obs(at(23, 30), dec!(3.40), Platform::Cimb)];
    let config = AggregationConfig {
        utc_offset_minutes: 8 * 60,
        ..AggregationConfig::default()
    };
    let series = aggregation::aggregate(&feed, TimeFrame::Day, &config).unwrap();
    assert_eq!(series.chart_rows[0].date, "2024-08-18");
}

// ===========================================================================
// Forecast
// ===========================================================================

#[test]
fn test_regression_on_index_valued_series() {
    let offset = timeframe::offset_from_minutes(0).unwrap();
    let start = timeframe::bucket_key(at(0, 0), TimeFrame::Hour, offset).unwrap();
    let series: Vec<SeriesPoint> = (1..=5)
        .map(|i| SeriesPoint {
            timestamp: timeframe::advance(start, TimeFrame::Hour, i - 1).unwrap(),
            rate: Some(Decimal::from(i)),
        })
        .collect();

    let trend =
        forecast::fit_linear_trend(&[dec!(1), dec!(2), dec!(3), dec!(4), dec!(5)]).unwrap();
    assert_eq!(trend.slope, dec!(1));
    assert_eq!(trend.intercept, dec!(1));

    let predicted = forecast::linear_regression_forecast(&series, TimeFrame::Hour, 3).unwrap();
    assert_eq!(predicted.len(), 3);
    assert_eq!(predicted[0].rate, dec!(6));
    assert_eq!(predicted[2].rate, dec!(8));
    assert_eq!(predicted[0].timestamp.with_timezone(&Utc), at(5, 0));
}

// ===========================================================================
// Dashboard
// ===========================================================================

#[test]
fn test_dashboard_over_a_week_of_daily_buckets() {
    let mut input = RateDashboardInput::new(week_of_feed(), TimeFrame::Day);
    input.per_page = 3;
    let out = analyze_rates(&input).unwrap();
    let r = &out.result;

    assert_eq!(r.chart_rows.len(), 7);
    assert_eq!(r.table_page.items.len(), 3);
    assert_eq!(r.table_page.total_pages, 3);
    assert_eq!(r.table_page.items[0], r.table_rows[0]);
    assert_eq!(r.forecast.len(), TimeFrame::Day.default_forecast_horizon());
    assert_eq!(r.forecast_platform, Some(Platform::Cimb));

    let domain = r.axis_domain.unwrap();
    assert!(domain.min <= domain.lower && domain.lower <= domain.upper);
    assert!(domain.upper <= domain.max);

    let cimb = r
        .latest
        .iter()
        .find(|s| s.platform == Platform::Cimb)
        .unwrap();
    assert_eq!(cimb.changes.len(), 3);
    assert!(cimb.changes[0].change_pct.unwrap() > Decimal::ZERO);
}

#[test]
fn test_dashboard_from_raw_feed_json() {
    let json = r#"[
        {"timestamp": "2024-08-17T10:02:00Z", "exchange_rate": "4.30", "platform": "CIMB"},
        {"timestamp": "2024-08-17T11:05:00Z", "exchange_rate": 4.35, "platform": "CIMB"},
        {"timestamp": "2024-08-17T11:06:00Z", "exchange_rate": "n/a", "platform": "WISE"},
        {"timestamp": "bogus", "exchange_rate": "4.40", "platform": "WISE"}
    ]"#;
    let parsed = observation::parse_feed_json(json).unwrap();
    assert_eq!(parsed.observations.len(), 2);
    assert_eq!(parsed.dropped, 2);

    let out = analyze_rates(&RateDashboardInput::new(parsed.observations, TimeFrame::Hour))
        .unwrap();
    assert_eq!(out.result.chart_rows.len(), 2);
    assert_eq!(out.result.forecast.len(), 24);
    assert_eq!(out.result.forecast[0].rate, dec!(4.40));
}

#[test]
fn test_empty_feed_yields_empty_dashboard() {
    let out = analyze_rates(&RateDashboardInput::new(Vec::new(), TimeFrame::Month)).unwrap();
    assert!(out.result.chart_rows.is_empty());
    assert!(out.result.latest.is_empty());
    assert!(out.result.forecast.is_empty());
    assert_eq!(out.result.axis_domain, None);
}

#[test]
fn test_page_zero_rejected() {
    let mut input = RateDashboardInput::new(week_of_feed(), TimeFrame::Hour);
    input.page = 0;
    match analyze_rates(&input) {
        Err(FxLoanError::InvalidInput { field, .. }) => assert_eq!(field, "page"),
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}

#[test]
fn test_median_of_column_values() {
    let values = [dec!(3.1), dec!(3.4), dec!(3.2), dec!(3.3)];
    assert_eq!(statistics::median(&values), Some(dec!(3.25)));
}
