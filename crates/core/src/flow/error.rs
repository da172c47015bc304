//! Flow rule errors.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use affdesk_shared::AppError;

/// Violations of flow configuration rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowRuleError {
    /// A `cpa` flow without a positive rate.
    #[error("cpa flows require a positive cpa_rate")]
    CpaRateRequired,

    /// A negative cpa rate.
    #[error("cpa_rate must not be negative")]
    NegativeCpaRate,

    /// A cpa rate beyond the money column range.
    #[error("cpa_rate is too large")]
    CpaRateTooLarge,

    /// A KPI target beyond the target column range.
    #[error("kpi_target is too large")]
    TargetTooLarge,

    /// A negative KPI target.
    #[error("kpi_target must not be negative")]
    NegativeTarget,

    /// The flow ends before it starts.
    #[error("end_date {end} is before start_date {start}")]
    EndBeforeStart {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// A range bound or percent is out of bounds.
    #[error("percentage range {index}: {reason}")]
    InvalidRange {
        /// Position in the submitted list.
        index: usize,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A range starts before the previous one ends.
    #[error("percentage range {index} starting at {from} overlaps the previous range")]
    OverlappingRanges {
        /// Position of the offending range.
        index: usize,
        /// Its lower bound.
        from: Decimal,
    },

    /// An open-ended range that is not the last one.
    #[error("percentage range {index} is open-ended but not last")]
    OpenRangeNotLast {
        /// Position of the offending range.
        index: usize,
    },
}

impl From<FlowRuleError> for AppError {
    fn from(err: FlowRuleError) -> Self {
        let field = match err {
            FlowRuleError::CpaRateRequired
            | FlowRuleError::NegativeCpaRate
            | FlowRuleError::CpaRateTooLarge => "cpa_rate",
            FlowRuleError::NegativeTarget | FlowRuleError::TargetTooLarge => "kpi_target",
            FlowRuleError::EndBeforeStart { .. } => "end_date",
            FlowRuleError::InvalidRange { .. }
            | FlowRuleError::OverlappingRanges { .. }
            | FlowRuleError::OpenRangeNotLast { .. } => "percentage_ranges",
        };
        Self::field(field, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_to_field_error() {
        let err: AppError = FlowRuleError::CpaRateRequired.into();
        assert_eq!(err.status_code(), 400);
        match err {
            AppError::InvalidInput(fields) => assert_eq!(fields[0].field, "cpa_rate"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
