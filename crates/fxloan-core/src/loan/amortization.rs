use std::time::Instant;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rollup::{yearly_rollup, yearly_shares, YearlyRollup, YearlyShare};
use super::savings::{compute_savings, SavingsResult};
use crate::error::FxLoanError;
use crate::types::{
    format_money, round_display, with_metadata, ComputationOutput, Currency, Money, Rate,
};
use crate::FxLoanResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Longest term accepted: 100 years.
pub const MAX_TERM_MONTHS: u32 = 1200;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Loan terms as a borrower enters them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    /// Amount borrowed.
    pub principal: Money,
    /// Nominal annual interest rate in percent (5 = 5%).
    pub annual_rate_pct: Rate,
    /// Loan term in years; fractional terms round up to whole months.
    pub term_years: Decimal,
    /// Additional principal paid every month on top of the instalment.
    #[serde(default)]
    pub extra_monthly_payment: Money,
    /// Currency used for the formatted figures.
    #[serde(default)]
    pub currency: Currency,
}

impl LoanInput {
    pub fn monthly_rate(&self) -> Rate {
        self.annual_rate_pct / dec!(100) / MONTHS_PER_YEAR
    }

    /// `ceil(term_years × 12)`, at most [`MAX_TERM_MONTHS`].
    pub fn term_months(&self) -> FxLoanResult<u32> {
        self.term_years
            .checked_mul(MONTHS_PER_YEAR)
            .and_then(|m| m.ceil().to_u32())
            .filter(|m| *m <= MAX_TERM_MONTHS)
            .ok_or_else(|| FxLoanError::InvalidInput {
                field: "term_years".into(),
                reason: format!(
                    "Term of {} years is out of range (at most {} months)",
                    self.term_years, MAX_TERM_MONTHS
                ),
            })
    }
}

/// One month of the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// 1-based month number.
    pub month: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub balance: Money,
}

impl AmortizationRow {
    /// Copy with every amount rounded to cents, for display.
    pub fn rounded(&self) -> AmortizationRow {
        AmortizationRow {
            month: self.month,
            payment: round_display(self.payment, 2),
            interest: round_display(self.interest, 2),
            principal: round_display(self.principal, 2),
            balance: round_display(self.balance, 2),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSummary {
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    pub annual_payment: Money,
    /// Annual payment / principal × 100.
    pub mortgage_constant_pct: Decimal,
    /// Schedule length in years, one decimal place.
    pub payoff_years: Decimal,
    pub number_of_payments: usize,
}

/// Summary figures rendered in the loan's currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattedSummary {
    pub monthly_payment: String,
    pub total_payment: String,
    pub total_interest: String,
    pub annual_payment: String,
    pub mortgage_constant: String,
    pub payoff_time: String,
    pub interest_saved: String,
    pub time_saved: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAnalysisOutput {
    pub summary: LoanSummary,
    pub savings: SavingsResult,
    /// Rounded to cents; the simulation itself runs at full precision.
    pub schedule: Vec<AmortizationRow>,
    pub yearly: Vec<YearlyRollup>,
    pub yearly_shares: Vec<YearlyShare>,
    pub formatted: FormattedSummary,
}

// ---------------------------------------------------------------------------
// Core operations
// ---------------------------------------------------------------------------

/// Level instalment `P·r·(1+r)^n / ((1+r)^n − 1)`.
///
/// A zero rate amortizes linearly (`P / n`).
pub fn compute_monthly_payment(
    principal: Money,
    monthly_rate: Rate,
    term_months: u32,
) -> FxLoanResult<Money> {
    if term_months == 0 || term_months > MAX_TERM_MONTHS {
        return Err(FxLoanError::InvalidInput {
            field: "term_months".into(),
            reason: format!("Loan term must be between 1 and {MAX_TERM_MONTHS} months"),
        });
    }
    if monthly_rate < Decimal::ZERO {
        return Err(FxLoanError::InvalidInput {
            field: "monthly_rate".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }

    if monthly_rate.is_zero() {
        return Ok(principal / Decimal::from(term_months));
    }

    let growth = (Decimal::ONE + monthly_rate)
        .checked_powu(u64::from(term_months))
        .ok_or_else(|| FxLoanError::InvalidInput {
            field: "term_months".into(),
            reason: format!("(1 + r)^{term_months} overflows decimal range"),
        })?;
    let denom = growth - Decimal::ONE;
    if denom.is_zero() {
        return Err(FxLoanError::DivisionByZero {
            context: "annuity factor (1 + r)^n - 1".into(),
        });
    }

    principal
        .checked_mul(monthly_rate)
        .zip(growth.checked_div(denom))
        .and_then(|(base, factor)| base.checked_mul(factor))
        .ok_or_else(|| FxLoanError::InvalidInput {
            field: "principal".into(),
            reason: "Monthly instalment exceeds decimal range".into(),
        })
}

/// Month-by-month balance reduction.
///
/// Runs while `balance > 0` and fewer than `term_months` rows exist. Each
/// month's principal portion is `min(payment − interest + extra, balance)`, so
/// the balance never goes negative. The running total of payments is kept in
/// range, so any sum over the returned rows is safe.
pub fn simulate(
    principal: Money,
    monthly_rate: Rate,
    term_months: u32,
    extra_monthly: Money,
) -> FxLoanResult<Vec<AmortizationRow>> {
    if extra_monthly < Decimal::ZERO {
        return Err(FxLoanError::InvalidInput {
            field: "extra_monthly_payment".into(),
            reason: "Extra payment cannot be negative".into(),
        });
    }
    let payment = compute_monthly_payment(principal, monthly_rate, term_months)?;

    let mut schedule = Vec::with_capacity(term_months as usize);
    let mut balance = principal;
    let mut month: u32 = 0;
    let mut total_paid = Decimal::ZERO;

    while balance > Decimal::ZERO && month < term_months {
        let interest = balance * monthly_rate;
        let principal_portion = (payment - interest)
            .checked_add(extra_monthly)
            .ok_or_else(|| FxLoanError::InvalidInput {
                field: "extra_monthly_payment".into(),
                reason: "Extra payment exceeds decimal range".into(),
            })?
            .min(balance);
        let (paid, running) = principal_portion
            .checked_add(interest)
            .and_then(|paid| total_paid.checked_add(paid).map(|t| (paid, t)))
            .ok_or_else(|| FxLoanError::InvalidInput {
                field: "principal".into(),
                reason: "Total repayments exceed decimal range".into(),
            })?;
        total_paid = running;

        balance -= principal_portion;
        month += 1;

        schedule.push(AmortizationRow {
            month,
            payment: paid,
            interest,
            principal: principal_portion,
            balance,
        });
    }

    debug!(
        months = schedule.len(),
        term_months,
        extra = %extra_monthly,
        "simulated amortization schedule"
    );

    Ok(schedule)
}

/// Totals over a schedule, with the level instalment it was built from.
pub fn summarize(
    principal: Money,
    monthly_payment: Money,
    schedule: &[AmortizationRow],
) -> FxLoanResult<LoanSummary> {
    let total_interest: Money = schedule.iter().map(|r| r.interest).sum();
    let total_payment: Money = schedule.iter().map(|r| r.payment).sum();
    let out_of_range = |what: &str| FxLoanError::InvalidInput {
        field: "principal".into(),
        reason: format!("{what} exceeds decimal range"),
    };
    let annual_payment = monthly_payment
        .checked_mul(MONTHS_PER_YEAR)
        .ok_or_else(|| out_of_range("Annual payment"))?;
    let mortgage_constant_pct = if principal.is_zero() {
        Decimal::ZERO
    } else {
        annual_payment
            .checked_div(principal)
            .and_then(|ratio| ratio.checked_mul(dec!(100)))
            .ok_or_else(|| out_of_range("Mortgage constant"))?
    };

    Ok(LoanSummary {
        monthly_payment,
        total_payment,
        total_interest,
        annual_payment,
        mortgage_constant_pct,
        payoff_years: round_display(Decimal::from(schedule.len()) / MONTHS_PER_YEAR, 1),
        number_of_payments: schedule.len(),
    })
}

/// Full loan analysis: summary, savings, schedule and yearly views.
pub fn analyze_loan(input: &LoanInput) -> FxLoanResult<ComputationOutput<LoanAnalysisOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_loan_input(input)?;

    let term_months = input.term_months()?;
    if Decimal::from(term_months) != input.term_years * MONTHS_PER_YEAR {
        warnings.push(format!(
            "Term of {} years is not a whole number of months; using {term_months} months",
            input.term_years
        ));
    }

    let monthly_rate = input.monthly_rate();
    if monthly_rate.is_zero() {
        warnings.push("Zero interest rate: principal amortizes linearly".into());
    }

    let monthly_payment = compute_monthly_payment(input.principal, monthly_rate, term_months)?;
    let schedule = simulate(
        input.principal,
        monthly_rate,
        term_months,
        input.extra_monthly_payment,
    )?;
    let savings = compute_savings(
        input.principal,
        monthly_rate,
        term_months,
        input.extra_monthly_payment,
    )?;

    let summary = summarize(input.principal, monthly_payment, &schedule)?;
    let yearly = yearly_rollup(&schedule);
    let shares = yearly_shares(&schedule);

    let currency = input.currency;
    let formatted = FormattedSummary {
        monthly_payment: format_money(summary.monthly_payment, currency),
        total_payment: format_money(summary.total_payment, currency),
        total_interest: format_money(summary.total_interest, currency),
        annual_payment: format_money(summary.annual_payment, currency),
        mortgage_constant: format!("{:.2}%", round_display(summary.mortgage_constant_pct, 2)),
        payoff_time: format!("{:.1} years", summary.payoff_years),
        interest_saved: format_money(savings.interest_saved, currency),
        time_saved: format!("{:.1} years", round_display(savings.time_saved_years, 1)),
    };

    let output = LoanAnalysisOutput {
        summary: summary.rounded(),
        savings: savings.rounded(),
        schedule: schedule.iter().map(AmortizationRow::rounded).collect(),
        yearly: yearly.iter().map(YearlyRollup::rounded).collect(),
        yearly_shares: shares,
        formatted,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Level-payment annuity amortization with extra-payment comparison",
        input,
        warnings,
        elapsed,
        output,
    ))
}

impl LoanSummary {
    /// Copy with money rounded to cents and the mortgage constant to 2 dp.
    pub fn rounded(&self) -> LoanSummary {
        LoanSummary {
            monthly_payment: round_display(self.monthly_payment, 2),
            total_payment: round_display(self.total_payment, 2),
            total_interest: round_display(self.total_interest, 2),
            annual_payment: round_display(self.annual_payment, 2),
            mortgage_constant_pct: round_display(self.mortgage_constant_pct, 2),
            payoff_years: self.payoff_years,
            number_of_payments: self.number_of_payments,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_loan_input(input: &LoanInput) -> FxLoanResult<()> {
    if input.principal <= Decimal::ZERO {
        return Err(FxLoanError::InvalidInput {
            field: "principal".into(),
            reason: "Loan amount must be positive".into(),
        });
    }
    if input.annual_rate_pct < Decimal::ZERO {
        return Err(FxLoanError::InvalidInput {
            field: "annual_rate_pct".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    if input.term_years <= Decimal::ZERO {
        return Err(FxLoanError::InvalidInput {
            field: "term_years".into(),
            reason: "Loan term must be positive".into(),
        });
    }
    input.term_months()?;
    if input.extra_monthly_payment < Decimal::ZERO {
        return Err(FxLoanError::InvalidInput {
            field: "extra_monthly_payment".into(),
            reason: "Extra payment cannot be negative".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_loan() -> LoanInput {
        LoanInput {
            principal: dec!(100_000),
            annual_rate_pct: dec!(5),
            term_years: dec!(10),
            extra_monthly_payment: Decimal::ZERO,
            currency: Currency::USD,
        }
    }

    #[test]
    fn test_monthly_payment_reference_value() {
        let loan = sample_loan();
        let pmt = compute_monthly_payment(loan.principal, loan.monthly_rate(), 120).unwrap();
        // 100k @ 5% over 10 years -> 1060.66
        assert_eq!(round_display(pmt, 2), dec!(1060.66));
    }

    #[test]
    fn test_zero_rate_is_linear() {
        let pmt = compute_monthly_payment(dec!(12_000), Decimal::ZERO, 12).unwrap();
        assert_eq!(pmt, dec!(1000));

        let schedule = simulate(dec!(12_000), Decimal::ZERO, 12, Decimal::ZERO).unwrap();
        assert_eq!(schedule.len(), 12);
        assert!(schedule.iter().all(|r| r.interest.is_zero()));
        assert_eq!(schedule.last().unwrap().balance, Decimal::ZERO);
    }

    #[test]
    fn test_simulate_runs_full_term_without_extra() {
        let loan = sample_loan();
        let schedule = simulate(loan.principal, loan.monthly_rate(), 120, Decimal::ZERO).unwrap();
        assert_eq!(schedule.len(), 120);
        assert_eq!(schedule[0].month, 1);
        assert!(schedule.last().unwrap().balance.abs() < dec!(0.01));

        // First month: interest = 100000 * 0.05 / 12 = 416.67
        assert_eq!(round_display(schedule[0].interest, 2), dec!(416.67));
        assert_eq!(round_display(schedule[0].principal, 2), dec!(643.99));
    }

    #[test]
    fn test_extra_payment_never_overpays() {
        let loan = sample_loan();
        let schedule = simulate(loan.principal, loan.monthly_rate(), 120, dec!(50_000)).unwrap();
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[1].balance, Decimal::ZERO);
        assert!(schedule.iter().all(|r| r.balance >= Decimal::ZERO));
        let repaid: Decimal = schedule.iter().map(|r| r.principal).sum();
        assert!((repaid - loan.principal).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_summary_metrics() {
        let out = analyze_loan(&sample_loan()).unwrap();
        let s = &out.result.summary;
        assert_eq!(s.monthly_payment, dec!(1060.66));
        assert_eq!(s.annual_payment, dec!(12727.86));
        assert_eq!(s.mortgage_constant_pct, dec!(12.73));
        assert_eq!(s.number_of_payments, 120);
        assert_eq!(s.payoff_years, dec!(10.0));
        // Total interest ~ 27,278.62
        assert!((s.total_interest - dec!(27278.62)).abs() < dec!(0.05));
        assert_eq!(out.result.formatted.monthly_payment, "$1,060.66");
        assert_eq!(out.result.formatted.payoff_time, "10.0 years");
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_fractional_term_rounds_up_with_warning() {
        let mut loan = sample_loan();
        loan.term_years = dec!(2.55); // 30.6 months
        assert_eq!(loan.term_months().unwrap(), 31);
        let out = analyze_loan(&loan).unwrap();
        assert_eq!(out.result.summary.number_of_payments, 31);
        assert!(out.warnings.iter().any(|w| w.contains("31 months")));
    }

    #[test]
    fn test_validation_rejects_bad_inputs() {
        let mut loan = sample_loan();
        loan.principal = Decimal::ZERO;
        assert!(matches!(
            analyze_loan(&loan),
            Err(FxLoanError::InvalidInput { ref field, .. }) if field == "principal"
        ));

        let mut loan = sample_loan();
        loan.term_years = dec!(-1);
        assert!(analyze_loan(&loan).is_err());

        let mut loan = sample_loan();
        loan.extra_monthly_payment = dec!(-10);
        assert!(analyze_loan(&loan).is_err());
    }

    #[test]
    fn test_huge_term_rejected_instead_of_overflowing() {
        let mut loan = sample_loan();
        loan.term_years = Decimal::from_i128_with_scale(10_i128.pow(28), 0);
        assert!(matches!(
            analyze_loan(&loan),
            Err(FxLoanError::InvalidInput { ref field, .. }) if field == "term_years"
        ));

        loan.term_years = dec!(300_000_000);
        loan.annual_rate_pct = Decimal::ZERO;
        assert!(analyze_loan(&loan).is_err());
        assert!(simulate(dec!(1000), Decimal::ZERO, MAX_TERM_MONTHS + 1, Decimal::ZERO).is_err());
    }

    #[test]
    fn test_large_principal_at_high_rate_stays_in_range() {
        let loan = LoanInput {
            principal: dec!(1_000_000_000_000_000_000),
            annual_rate_pct: dec!(100),
            term_years: dec!(30),
            extra_monthly_payment: Decimal::ZERO,
            currency: Currency::USD,
        };
        let out = analyze_loan(&loan).unwrap();
        // Interest dominates: the instalment is just above principal × r.
        let floor = loan.principal / dec!(12);
        assert!(out.result.summary.monthly_payment > floor);
        assert_eq!(out.result.summary.number_of_payments, 360);
    }

    #[test]
    fn test_out_of_range_amounts_are_errors() {
        let max = Decimal::MAX;
        assert!(compute_monthly_payment(max, dec!(2), 12).is_err());
        assert!(simulate(dec!(1000), dec!(0.01), 12, max).is_err());
    }
}
