//! Fixed-rate loan amortization with extra-payment what-if analysis.

pub mod amortization;
pub mod rollup;
pub mod savings;
