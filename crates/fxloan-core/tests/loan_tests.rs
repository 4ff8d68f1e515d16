use fxloan_core::loan::{amortization, rollup, savings};
use fxloan_core::{Currency, FxLoanError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn monthly_rate(annual_pct: Decimal) -> Decimal {
    annual_pct / dec!(100) / dec!(12)
}

fn mortgage(extra: Decimal) -> amortization::LoanInput {
    amortization::LoanInput {
        principal: dec!(100_000),
        annual_rate_pct: dec!(5),
        term_years: dec!(10),
        extra_monthly_payment: extra,
        currency: Currency::MYR,
    }
}

// ===========================================================================
// Schedule simulation
// ===========================================================================

#[test]
fn test_reference_mortgage_without_extra() {
    let out = amortization::analyze_loan(&mortgage(Decimal::ZERO)).unwrap();
    let r = &out.result;

    assert_eq!(r.summary.monthly_payment, dec!(1060.66));
    assert_eq!(r.schedule.len(), 120);
    assert_eq!(r.schedule.last().unwrap().balance, Decimal::ZERO);
    assert_eq!(r.savings.interest_saved, Decimal::ZERO);
    assert_eq!(r.formatted.monthly_payment, "RM1,060.66");
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
}

#[test]
fn test_simulation_terminates_within_term_for_many_loans() {
    let cases = [
        (dec!(250_000), dec!(3.5), 360u32),
        (dec!(15_000), dec!(12), 36),
        (dec!(1_000), dec!(0.5), 6),
        (dec!(480_000), dec!(7.25), 300),
    ];
    for (principal, annual, months) in cases {
        let schedule =
            amortization::simulate(principal, monthly_rate(annual), months, Decimal::ZERO).unwrap();
        assert!(schedule.len() <= months as usize);
        let last = schedule.last().unwrap();
        assert!(
            last.balance.abs() < dec!(0.01),
            "final balance {} for {principal} @ {annual}%",
            last.balance
        );
    }
}

#[test]
fn test_extra_payment_is_monotone() {
    let rate = monthly_rate(dec!(5));
    let extras = [dec!(0), dec!(50), dec!(200), dec!(1000), dec!(5000)];
    let runs: Vec<_> = extras
        .iter()
        .map(|e| amortization::simulate(dec!(100_000), rate, 120, *e).unwrap())
        .collect();

    for pair in runs.windows(2) {
        let lower: Decimal = pair[0].iter().map(|r| r.interest).sum();
        let higher: Decimal = pair[1].iter().map(|r| r.interest).sum();
        assert!(pair[1].len() <= pair[0].len());
        assert!(higher <= lower);
    }
}

// ===========================================================================
// Savings
// ===========================================================================

#[test]
fn test_extra_200_per_month_savings() {
    let out = amortization::analyze_loan(&mortgage(dec!(200))).unwrap();
    let r = &out.result;

    assert!(r.schedule.len() < 120);
    assert!(r.savings.interest_saved > Decimal::ZERO);
    assert!(r.savings.time_saved_years > Decimal::ZERO);
    assert_eq!(r.savings.baseline_months, 120);
    assert_eq!(r.savings.accelerated_months, r.schedule.len());
}

#[test]
fn test_savings_direct_call_matches_analysis() {
    let s = savings::compute_savings(dec!(100_000), monthly_rate(dec!(5)), 120, dec!(200)).unwrap();
    let out = amortization::analyze_loan(&mortgage(dec!(200))).unwrap();
    assert_eq!(s.rounded(), out.result.savings);
}

// ===========================================================================
// Yearly rollups
// ===========================================================================

#[test]
fn test_yearly_rollup_of_accelerated_schedule() {
    let schedule =
        amortization::simulate(dec!(100_000), monthly_rate(dec!(5)), 120, dec!(200)).unwrap();
    let yearly = rollup::yearly_rollup(&schedule);

    let expected_years = schedule.len().div_ceil(12);
    assert_eq!(yearly.len(), expected_years);
    assert_eq!(yearly.last().unwrap().ending_balance, Decimal::ZERO);
    for (i, y) in yearly.iter().enumerate() {
        assert_eq!(y.year as usize, i + 1);
    }
}

// ===========================================================================
// Validation and edge cases
// ===========================================================================

#[test]
fn test_zero_interest_loan_supported() {
    let mut input = mortgage(Decimal::ZERO);
    input.annual_rate_pct = Decimal::ZERO;
    let out = amortization::analyze_loan(&input).unwrap();

    assert_eq!(out.result.summary.total_interest, Decimal::ZERO);
    assert_eq!(out.result.summary.monthly_payment, dec!(833.33));
    assert!(out.warnings.iter().any(|w| w.contains("linearly")));
}

#[test]
fn test_invalid_principal_rejected() {
    let mut input = mortgage(Decimal::ZERO);
    input.principal = dec!(-5);
    match amortization::analyze_loan(&input) {
        Err(FxLoanError::InvalidInput { field, .. }) => assert_eq!(field, "principal"),
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}

#[test]
fn test_loan_input_from_json_defaults() {
    let input: amortization::LoanInput = serde_json::from_str(
        r#"{"principal": "350000", "annual_rate_pct": "4.2", "term_years": "30"}"#,
    )
    .unwrap();
    assert_eq!(input.extra_monthly_payment, Decimal::ZERO);
    assert_eq!(input.currency, Currency::MYR);
    assert_eq!(input.term_months().unwrap(), 360);
}
