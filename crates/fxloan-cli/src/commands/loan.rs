use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use fxloan_core::loan::amortization::{self, LoanInput};
use fxloan_core::pagination::paginate;
use fxloan_core::Currency;

use crate::input;

const SCHEDULE_ROWS_PER_PAGE: usize = 12;

/// Loan terms, from flags or a JSON file
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct LoanArgs {
    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 5 for 5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub term: Option<Decimal>,

    /// Extra principal paid each month
    #[arg(long)]
    pub extra: Option<Decimal>,

    /// Display currency (USD, MYR, SGD, EUR, GBP, JPY)
    #[arg(long)]
    pub currency: Option<Currency>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Schedule page, 1-based
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Months per page
    #[arg(long, default_value_t = SCHEDULE_ROWS_PER_PAGE)]
    pub per_page: usize,
}

pub fn run_loan(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = resolve_loan(&args)?;
    let out = amortization::analyze_loan(&loan)?;
    Ok(json!({
        "result": {
            "summary": out.result.summary,
            "savings": out.result.savings,
            "formatted": out.result.formatted,
        },
        "methodology": out.methodology,
        "assumptions": out.assumptions,
        "warnings": out.warnings,
        "metadata": out.metadata,
    }))
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = resolve_loan(&args.loan)?;
    let out = amortization::analyze_loan(&loan)?;
    let page = paginate(&out.result.schedule, args.page, args.per_page)?;
    Ok(json!({
        "page": page.page,
        "total_pages": page.total_pages,
        "total_items": page.total_items,
        "results": page.items,
        "warnings": out.warnings,
    }))
}

pub fn run_yearly(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = resolve_loan(&args)?;
    let out = amortization::analyze_loan(&loan)?;

    let rows: Vec<Value> = out
        .result
        .yearly
        .iter()
        .zip(&out.result.yearly_shares)
        .map(|(year, share)| {
            json!({
                "year": year.year,
                "principal": year.principal_sum,
                "interest": year.interest_sum,
                "ending_balance": year.ending_balance,
                "principal_pct": share.principal_pct,
                "interest_pct": share.interest_pct,
            })
        })
        .collect();

    Ok(json!({
        "results": rows,
        "warnings": out.warnings,
    }))
}

fn resolve_loan(args: &LoanArgs) -> Result<LoanInput, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_json(path);
    }
    if let (Some(principal), Some(rate), Some(term)) = (args.principal, args.rate, args.term) {
        return Ok(LoanInput {
            principal,
            annual_rate_pct: rate,
            term_years: term,
            extra_monthly_payment: args.extra.unwrap_or(Decimal::ZERO),
            currency: args.currency.unwrap_or_default(),
        });
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }
    Err("--principal, --rate and --term (or --input <file.json> / stdin) are required".into())
}
