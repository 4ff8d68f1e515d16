use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::FxLoanError;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%) unless a field name says `_pct`.
pub type Rate = Decimal;

/// Display currency for loan figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    USD,
    #[default]
    MYR,
    SGD,
    EUR,
    GBP,
    JPY,
}

impl Currency {
    pub const ALL: [Currency; 6] = [
        Currency::USD,
        Currency::MYR,
        Currency::SGD,
        Currency::EUR,
        Currency::GBP,
        Currency::JPY,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::MYR => "RM",
            Currency::SGD => "S$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::JPY => "¥",
        }
    }
}

impl FromStr for Currency {
    type Err = FxLoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| format!("{c:?}") == code)
            .ok_or_else(|| FxLoanError::InvalidInput {
                field: "currency".into(),
                reason: format!("Unsupported currency '{code}'. Use: USD, MYR, SGD, EUR, GBP, JPY"),
            })
    }
}

/// Round a value half-away-from-zero, the way figures are shown to users.
pub fn round_display(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount as `<symbol><thousands-separated>.<2dp>`, e.g. `RM1,060.66`.
///
/// Negative amounts carry the sign ahead of the symbol.
pub fn format_money(amount: Money, currency: Currency) -> String {
    let rounded = round_display(amount, 2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let fixed = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    format!(
        "{sign}{}{}.{frac_part}",
        currency.symbol(),
        group_thousands(int_part)
    )
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
