use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::amortization::AmortizationRow;
use crate::types::{round_display, Money};

const MONTHS_PER_YEAR: usize = 12;

/// Twelve consecutive schedule rows (the last year may be shorter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyRollup {
    /// 1-based loan year.
    pub year: u32,
    pub principal_sum: Money,
    pub interest_sum: Money,
    pub ending_balance: Money,
}

impl YearlyRollup {
    pub fn rounded(&self) -> YearlyRollup {
        YearlyRollup {
            year: self.year,
            principal_sum: round_display(self.principal_sum, 2),
            interest_sum: round_display(self.interest_sum, 2),
            ending_balance: round_display(self.ending_balance, 2),
        }
    }
}

/// Split of a year's payments between interest and principal, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyShare {
    pub year: u32,
    pub interest_pct: Decimal,
    pub principal_pct: Decimal,
}

pub fn yearly_rollup(schedule: &[AmortizationRow]) -> Vec<YearlyRollup> {
    schedule
        .chunks(MONTHS_PER_YEAR)
        .zip(1u32..)
        .map(|(chunk, year)| YearlyRollup {
            year,
            principal_sum: chunk.iter().map(|r| r.principal).sum(),
            interest_sum: chunk.iter().map(|r| r.interest).sum(),
            ending_balance: chunk.last().map(|r| r.balance).unwrap_or_default(),
        })
        .collect()
}

/// Interest and principal as a share of each year's total payment (2 dp).
pub fn yearly_shares(schedule: &[AmortizationRow]) -> Vec<YearlyShare> {
    yearly_rollup(schedule)
        .into_iter()
        .map(|y| {
            let total = y.interest_sum + y.principal_sum;
            let (interest_pct, principal_pct) = if total.is_zero() {
                (Decimal::ZERO, Decimal::ZERO)
            } else {
                (
                    round_display(y.interest_sum / total * dec!(100), 2),
                    round_display(y.principal_sum / total * dec!(100), 2),
                )
            };
            YearlyShare {
                year: y.year,
                interest_pct,
                principal_pct,
            }
        })
        .collect()
}
