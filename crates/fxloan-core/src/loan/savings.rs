use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::amortization::simulate;
use crate::types::{round_display, Money, Rate};
use crate::FxLoanResult;

/// What an extra monthly payment buys compared with paying the instalment only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsResult {
    pub interest_saved: Money,
    /// Fractional years.
    pub time_saved_years: Decimal,
    pub baseline_months: usize,
    pub accelerated_months: usize,
    pub baseline_interest: Money,
    pub accelerated_interest: Money,
}

impl SavingsResult {
    pub fn rounded(&self) -> SavingsResult {
        SavingsResult {
            interest_saved: round_display(self.interest_saved, 2),
            time_saved_years: round_display(self.time_saved_years, 1),
            baseline_months: self.baseline_months,
            accelerated_months: self.accelerated_months,
            baseline_interest: round_display(self.baseline_interest, 2),
            accelerated_interest: round_display(self.accelerated_interest, 2),
        }
    }
}

/// Simulate once without and once with `extra_monthly`, and diff the totals.
///
/// Both differences are non-negative for any `extra_monthly >= 0`.
pub fn compute_savings(
    principal: Money,
    monthly_rate: Rate,
    term_months: u32,
    extra_monthly: Money,
) -> FxLoanResult<SavingsResult> {
    let baseline = simulate(principal, monthly_rate, term_months, Decimal::ZERO)?;
    let accelerated = simulate(principal, monthly_rate, term_months, extra_monthly)?;

    let baseline_interest: Money = baseline.iter().map(|r| r.interest).sum();
    let accelerated_interest: Money = accelerated.iter().map(|r| r.interest).sum();

    let months_per_year = dec!(12);
    let time_saved_years = Decimal::from(baseline.len()) / months_per_year
        - Decimal::from(accelerated.len()) / months_per_year;

    Ok(SavingsResult {
        interest_saved: baseline_interest - accelerated_interest,
        time_saved_years,
        baseline_months: baseline.len(),
        accelerated_months: accelerated.len(),
        baseline_interest,
        accelerated_interest,
    })
}
