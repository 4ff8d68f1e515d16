use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::observation::{Platform, RateObservation};
use super::timeframe::{bucket_key, format_bucket, offset_from_minutes, TimeFrame};
use crate::error::FxLoanError;
use crate::types::{round_display, Rate};
use crate::FxLoanResult;

const DEFAULT_BUCKET_COUNT: usize = 12;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How several observations of one platform inside one bucket collapse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// Chronologically last observation wins (input order breaks ties).
    #[default]
    Last,
    /// Arithmetic mean, rounded to the column's `mean_precision`.
    Mean,
}

/// One output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub platform: Platform,
    /// Decimal places kept for `Mean` values in this column.
    pub mean_precision: u32,
}

impl ColumnSpec {
    pub fn new(platform: Platform, mean_precision: u32) -> Self {
        Self {
            platform,
            mean_precision,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    #[serde(default)]
    pub mode: AggregationMode,
    /// Keep only the most recent N buckets; `None` keeps all.
    #[serde(default = "default_bucket_count")]
    pub bucket_count: Option<usize>,
    /// Columns in display order. The first one is the primary column.
    #[serde(default = "default_columns")]
    pub columns: Vec<ColumnSpec>,
    /// Calendar used for bucket boundaries, in minutes east of UTC.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

fn default_bucket_count() -> Option<usize> {
    Some(DEFAULT_BUCKET_COUNT)
}

fn default_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new(Platform::Cimb, 4),
        ColumnSpec::new(Platform::Wise, 3),
        ColumnSpec::new(Platform::PandaRemit, 3),
    ]
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            mode: AggregationMode::default(),
            bucket_count: default_bucket_count(),
            columns: default_columns(),
            utc_offset_minutes: 0,
        }
    }
}

impl AggregationConfig {
    pub fn offset(&self) -> FxLoanResult<FixedOffset> {
        offset_from_minutes(self.utc_offset_minutes)
    }

    pub fn primary_platform(&self) -> Option<&Platform> {
        self.columns.first().map(|c| &c.platform)
    }

    fn validate(&self) -> FxLoanResult<()> {
        if self.columns.is_empty() {
            return Err(FxLoanError::InvalidInput {
                field: "columns".into(),
                reason: "At least one platform column is required".into(),
            });
        }
        if self.bucket_count == Some(0) {
            return Err(FxLoanError::InvalidInput {
                field: "bucket_count".into(),
                reason: "Bucket count must be at least 1 (omit it to keep all buckets)".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One bucket, one column per configured platform. `None` marks "no data".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketedRow {
    pub bucket_start: DateTime<FixedOffset>,
    pub date: String,
    /// Keyed by `Platform::column_name()`, e.g. `CIMBRate`.
    #[serde(flatten)]
    pub rates: BTreeMap<String, Option<Rate>>,
}

impl BucketedRow {
    pub fn rate(&self, platform: &Platform) -> Option<Rate> {
        self.rates.get(&platform.column_name()).copied().flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSeries {
    /// Ascending by bucket start.
    pub chart_rows: Vec<BucketedRow>,
    /// Same rows, most recent first.
    pub table_rows: Vec<BucketedRow>,
    /// Bucket count before truncation.
    pub total_buckets: usize,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct Accumulator {
    last: Option<(DateTime<Utc>, Rate)>,
    sum: Decimal,
    count: u32,
}

impl Accumulator {
    fn push(&mut self, obs: &RateObservation) {
        match self.last {
            Some((ts, _)) if obs.timestamp < ts => {}
            _ => self.last = Some((obs.timestamp, obs.rate)),
        }
        self.sum += obs.rate;
        self.count += 1;
    }

    fn value(&self, mode: AggregationMode, precision: u32) -> Option<Rate> {
        match mode {
            AggregationMode::Last => self.last.map(|(_, r)| r),
            AggregationMode::Mean if self.count > 0 => Some(round_display(
                self.sum / Decimal::from(self.count),
                precision,
            )),
            AggregationMode::Mean => None,
        }
    }
}

/// Group observations into time buckets with one value per platform column.
///
/// Observations for platforms without a column, and non-positive rates, are
/// ignored. Empty input yields an empty series.
pub fn aggregate(
    observations: &[RateObservation],
    timeframe: TimeFrame,
    config: &AggregationConfig,
) -> FxLoanResult<AggregatedSeries> {
    config.validate()?;
    let offset = config.offset()?;

    let mut buckets: BTreeMap<DateTime<FixedOffset>, HashMap<Platform, Accumulator>> =
        BTreeMap::new();
    let mut ignored = 0usize;

    for obs in observations {
        if obs.rate <= Decimal::ZERO
            || !config.columns.iter().any(|c| c.platform == obs.platform)
        {
            ignored += 1;
            continue;
        }
        let key = bucket_key(obs.timestamp, timeframe, offset)?;
        buckets
            .entry(key)
            .or_default()
            .entry(obs.platform.clone())
            .or_default()
            .push(obs);
    }

    let total_buckets = buckets.len();
    let keep = config.bucket_count.unwrap_or(total_buckets).min(total_buckets);

    let chart_rows: Vec<BucketedRow> = buckets
        .into_iter()
        .skip(total_buckets - keep)
        .map(|(key, per_platform)| {
            let rates = config
                .columns
                .iter()
                .map(|col| {
                    let value = per_platform
                        .get(&col.platform)
                        .and_then(|acc| acc.value(config.mode, col.mean_precision));
                    (col.platform.column_name(), value)
                })
                .collect();
            BucketedRow {
                date: format_bucket(&key, timeframe),
                bucket_start: key,
                rates,
            }
        })
        .collect();

    let table_rows: Vec<BucketedRow> = chart_rows.iter().rev().cloned().collect();

    debug!(
        observations = observations.len(),
        ignored,
        total_buckets,
        kept = chart_rows.len(),
        %timeframe,
        "aggregated rate observations"
    );

    Ok(AggregatedSeries {
        chart_rows,
        table_rows,
        total_buckets,
    })
}
