use std::str::FromStr;

use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use fxloan_core::exchange_rates::aggregation::{self, AggregationConfig};
use fxloan_core::exchange_rates::dashboard::{self, RateDashboardInput};
use fxloan_core::exchange_rates::forecast::{self, SeriesPoint};
use fxloan_core::exchange_rates::observation::{self, RateObservation};
use fxloan_core::exchange_rates::timeframe::TimeFrame;
use fxloan_core::loan::amortization::{self, LoanInput};
use fxloan_core::loan::{rollup, savings};
use fxloan_core::pagination::paginate;
use fxloan_core::Currency;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Exchange rates
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct AggregateRequest {
    observations: Vec<RateObservation>,
    #[serde(default)]
    timeframe: TimeFrame,
    #[serde(default)]
    aggregation: AggregationConfig,
}

#[derive(Deserialize)]
struct ForecastRequest {
    series: Vec<SeriesPoint>,
    #[serde(default)]
    timeframe: TimeFrame,
    horizon: Option<usize>,
}

/// Raw feed JSON array in, validated observations plus a drop count out.
#[napi]
pub fn parse_rate_feed(feed_json: String) -> NapiResult<String> {
    let outcome = observation::parse_feed_json(&feed_json).map_err(to_napi_error)?;
    serde_json::to_string(&outcome).map_err(to_napi_error)
}

#[napi]
pub fn analyze_rates(input_json: String) -> NapiResult<String> {
    let input: RateDashboardInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = dashboard::analyze_rates(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Raw feed JSON array straight to a dashboard; malformed records are
/// reported in the envelope warnings.
#[napi]
pub fn analyze_rate_feed(feed_json: String, timeframe: String) -> NapiResult<String> {
    let parsed = observation::parse_feed_json(&feed_json).map_err(to_napi_error)?;
    let timeframe = TimeFrame::from_str(&timeframe).map_err(to_napi_error)?;
    let mut input = RateDashboardInput::new(parsed.observations, timeframe);
    input.dropped_records = parsed.dropped;
    let output = dashboard::analyze_rates(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn aggregate_rates(input_json: String) -> NapiResult<String> {
    let req: AggregateRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = aggregation::aggregate(&req.observations, req.timeframe, &req.aggregation)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn forecast_rates(input_json: String) -> NapiResult<String> {
    let req: ForecastRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let horizon = req
        .horizon
        .unwrap_or_else(|| req.timeframe.default_forecast_horizon());
    let output = forecast::linear_regression_forecast(&req.series, req.timeframe, horizon)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Loan
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ScheduleRequest {
    #[serde(flatten)]
    loan: LoanInput,
    #[serde(default = "first_page")]
    page: usize,
    #[serde(default = "months_per_page")]
    per_page: usize,
}

fn first_page() -> usize {
    1
}

fn months_per_page() -> usize {
    12
}

#[napi]
pub fn analyze_loan(input_json: String) -> NapiResult<String> {
    let input: LoanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::analyze_loan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let req: ScheduleRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::analyze_loan(&req.loan).map_err(to_napi_error)?;
    let page =
        paginate(&output.result.schedule, req.page, req.per_page).map_err(to_napi_error)?;
    serde_json::to_string(&page).map_err(to_napi_error)
}

#[napi]
pub fn loan_savings(input_json: String) -> NapiResult<String> {
    let input: LoanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    amortization::validate_loan_input(&input).map_err(to_napi_error)?;
    let months = input.term_months().map_err(to_napi_error)?;
    let result = savings::compute_savings(
        input.principal,
        input.monthly_rate(),
        months,
        input.extra_monthly_payment,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&result.rounded()).map_err(to_napi_error)
}

#[napi]
pub fn yearly_rollup(input_json: String) -> NapiResult<String> {
    let input: LoanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    amortization::validate_loan_input(&input).map_err(to_napi_error)?;
    let months = input.term_months().map_err(to_napi_error)?;
    let schedule = amortization::simulate(
        input.principal,
        input.monthly_rate(),
        months,
        input.extra_monthly_payment,
    )
    .map_err(to_napi_error)?;
    let output = serde_json::json!({
        "yearly": rollup::yearly_rollup(&schedule)
            .iter()
            .map(rollup::YearlyRollup::rounded)
            .collect::<Vec<_>>(),
        "shares": rollup::yearly_shares(&schedule),
    });
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// `format_money("1060.66", "MYR")` -> `"RM1,060.66"`.
#[napi]
pub fn format_money(amount: String, currency: String) -> NapiResult<String> {
    let value = Decimal::from_str(amount.trim()).map_err(to_napi_error)?;
    let currency = Currency::from_str(&currency).map_err(to_napi_error)?;
    Ok(fxloan_core::format_money(value, currency))
}
