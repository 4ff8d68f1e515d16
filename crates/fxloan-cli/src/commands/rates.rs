use clap::{Args, ValueEnum};
use serde_json::{json, Value};

use fxloan_core::exchange_rates::aggregation::AggregationMode;
use fxloan_core::exchange_rates::dashboard::{self, RateDashboardInput};
use fxloan_core::exchange_rates::observation::{self, Platform, RawRateRecord};
use fxloan_core::exchange_rates::timeframe::TimeFrame;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Most recent observation in each bucket
    Last,
    /// Arithmetic mean of the bucket
    Mean,
}

impl From<ModeArg> for AggregationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Last => AggregationMode::Last,
            ModeArg::Mean => AggregationMode::Mean,
        }
    }
}

/// Arguments shared by `rates` and `forecast`
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct RatesArgs {
    /// JSON file: a raw feed array or a full dashboard input object
    #[arg(long)]
    pub input: Option<String>,

    /// Fetch the feed over HTTP (falls back to FXLOAN_FEED_URL, then the public feed)
    #[arg(long)]
    pub url: Option<String>,

    /// Bucket width: 5min, hour, day, month, year
    #[arg(long)]
    pub timeframe: Option<TimeFrame>,

    /// Per-bucket aggregation
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Most recent buckets to keep (0 keeps all)
    #[arg(long)]
    pub buckets: Option<usize>,

    /// Offset applied to calendar boundaries, e.g. 480 for UTC+8
    #[arg(long)]
    pub utc_offset_minutes: Option<i32>,

    /// Forecast points; defaults depend on the timeframe
    #[arg(long)]
    pub horizon: Option<usize>,

    /// Column to forecast (CIMB, WISE, PANDAREMIT)
    #[arg(long)]
    pub platform: Option<String>,

    /// Table page, 1-based
    #[arg(long)]
    pub page: Option<usize>,

    /// Rows per table page
    #[arg(long)]
    pub per_page: Option<usize>,
}

pub fn run_rates(args: RatesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let dashboard_input = build_input(&args)?;
    let result = dashboard::analyze_rates(&dashboard_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_forecast(args: RatesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let dashboard_input = build_input(&args)?;
    let result = dashboard::analyze_rates(&dashboard_input)?;
    Ok(json!({
        "timeframe": result.result.timeframe,
        "platform": result.result.forecast_platform,
        "trend": result.result.trend,
        "results": result.result.forecast,
        "warnings": result.warnings,
    }))
}

/// Resolve the rate source, then layer explicit flags over it.
fn build_input(args: &RatesArgs) -> Result<RateDashboardInput, Box<dyn std::error::Error>> {
    let raw = if let Some(ref path) = args.input {
        input::file::read_json_value(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        let url = input::feed::resolve_feed_url(args.url.as_deref());
        input::feed::fetch_feed(&url)?
    };

    let mut dashboard_input = match raw {
        Value::Array(_) => {
            let records: Vec<RawRateRecord> = serde_json::from_value(raw)?;
            let parsed = observation::parse_feed(&records);
            let mut built =
                RateDashboardInput::new(parsed.observations, args.timeframe.unwrap_or_default());
            built.dropped_records = parsed.dropped;
            built
        }
        Value::Object(_) => serde_json::from_value::<RateDashboardInput>(raw)?,
        _ => return Err("Rate input must be a feed array or a dashboard object".into()),
    };

    if let Some(tf) = args.timeframe {
        dashboard_input.timeframe = tf;
    }
    if let Some(mode) = args.mode {
        dashboard_input.aggregation.mode = mode.into();
    }
    if let Some(n) = args.buckets {
        dashboard_input.aggregation.bucket_count = if n == 0 { None } else { Some(n) };
    }
    if let Some(minutes) = args.utc_offset_minutes {
        dashboard_input.aggregation.utc_offset_minutes = minutes;
    }
    if let Some(h) = args.horizon {
        dashboard_input.forecast_horizon = Some(h);
    }
    if let Some(ref p) = args.platform {
        dashboard_input.forecast_platform = Some(Platform::from(p.as_str()));
    }
    if let Some(page) = args.page {
        dashboard_input.page = page;
    }
    if let Some(per_page) = args.per_page {
        dashboard_input.per_page = per_page;
    }

    Ok(dashboard_input)
}
