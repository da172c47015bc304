//! Statistics errors.

use chrono::NaiveDate;
use thiserror::Error;

use affdesk_shared::AppError;

/// Errors raised while validating or aggregating statistics.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatsError {
    /// Month outside 1..=12.
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    /// Year outside the supported window.
    #[error("year must be between 2000 and 2100, got {0}")]
    InvalidYear(i32),

    /// Statistics reported for a day that has not happened yet.
    #[error("stat date {0} is in the future")]
    FutureDate(NaiveDate),

    /// A counter or amount below zero.
    #[error("{0} must not be negative")]
    NegativeCounter(&'static str),

    /// A reported figure above the storable maximum.
    #[error("{0} is too large")]
    TooLarge(&'static str),

    /// A total or ratio that does not fit a decimal.
    #[error("{0} is too large to aggregate")]
    Overflow(&'static str),
}

impl From<StatsError> for AppError {
    fn from(err: StatsError) -> Self {
        let field = match &err {
            StatsError::InvalidMonth(_) => "month",
            StatsError::InvalidYear(_) => "year",
            StatsError::FutureDate(_) => "date",
            StatsError::NegativeCounter(name)
            | StatsError::TooLarge(name)
            | StatsError::Overflow(name) => *name,
        };
        Self::field(field, err.to_string())
    }
}
