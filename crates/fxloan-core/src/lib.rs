pub mod error;
pub mod pagination;
pub mod types;

#[cfg(feature = "exchange_rates")]
pub mod exchange_rates;

#[cfg(feature = "loan")]
pub mod loan;

pub use error::FxLoanError;
pub use types::*;

/// Standard result type for all fxloan operations
pub type FxLoanResult<T> = Result<T, FxLoanError>;
