pub mod loan;
pub mod rates;
