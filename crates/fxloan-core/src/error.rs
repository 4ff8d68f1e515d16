use thiserror::Error;

#[derive(Debug, Error)]
pub enum FxLoanError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for FxLoanError {
    fn from(e: serde_json::Error) -> Self {
        FxLoanError::SerializationError(e.to_string())
    }
}

impl From<rust_decimal::Error> for FxLoanError {
    fn from(e: rust_decimal::Error) -> Self {
        FxLoanError::ParseError(e.to_string())
    }
}
