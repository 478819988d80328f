use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

/// Rejections from the order placement path. All of them are recoverable
/// and leave the market state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("price and quantity are both required")]
    MissingFields,

    #[error("price must have at most {max_decimals} decimal places")]
    InvalidPrecision { max_decimals: u32 },

    #[error("no wallet connected")]
    NotConnected,

    #[error("insufficient token balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: Decimal },

    #[error("order amount does not fit the contract's units")]
    AmountOverflow,

    #[error("contract submission failed: {0}")]
    SubmissionFailed(String),

    #[error("contract did not confirm within {0:?}")]
    Timeout(Duration),
}

impl OrderError {
    /// Stable machine-readable kind, used for API bodies and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::MissingFields => "missing_fields",
            OrderError::InvalidPrecision { .. } => "invalid_precision",
            OrderError::NotConnected => "not_connected",
            OrderError::InsufficientBalance { .. } => "insufficient_balance",
            OrderError::AmountOverflow => "amount_overflow",
            OrderError::SubmissionFailed(_) => "submission_failed",
            OrderError::Timeout(_) => "timeout",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}
