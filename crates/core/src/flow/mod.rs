//! Flow (traffic campaign) rules.
//!
//! - `types` - flow type, status and KPI metric enums
//! - `ranges` - payout percentage ranges and their validation
//! - `error` - `FlowRuleError`

pub mod error;
pub mod ranges;
pub mod types;

pub use error::FlowRuleError;
pub use ranges::{PercentageRange, validate_ranges};
pub use types::{FlowStatus, FlowType, KpiMetric};

use affdesk_shared::types::{MAX_TARGET, fits_amount};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::stats::StatsError;

/// Stateless checks applied when a flow is created or edited.
pub struct FlowRules;

impl FlowRules {
    /// Validates the pricing fields of a flow.
    ///
    /// A `cpa` flow must carry a positive `cpa_rate`. A `spend` flow may omit it,
    /// but a supplied rate must not be negative.
    pub fn validate_pricing(
        flow_type: FlowType,
        cpa_rate: Option<Decimal>,
    ) -> Result<(), FlowRuleError> {
        if cpa_rate.is_some_and(|rate| !fits_amount(rate)) {
            return Err(FlowRuleError::CpaRateTooLarge);
        }
        match (flow_type, cpa_rate) {
            (FlowType::Cpa, Some(rate)) if rate > Decimal::ZERO => Ok(()),
            (FlowType::Cpa, _) => Err(FlowRuleError::CpaRateRequired),
            (FlowType::Spend, Some(rate)) if rate < Decimal::ZERO => {
                Err(FlowRuleError::NegativeCpaRate)
            }
            (FlowType::Spend, _) => Ok(()),
        }
    }

    /// Validates the optional run dates of a flow.
    pub fn validate_dates(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<(), FlowRuleError> {
        match (start, end) {
            (Some(start), Some(end)) if end < start => {
                Err(FlowRuleError::EndBeforeStart { start, end })
            }
            _ => Ok(()),
        }
    }

    /// Validates a KPI target; targets are non-negative.
    pub fn validate_target(target: Decimal) -> Result<(), FlowRuleError> {
        if target < Decimal::ZERO {
            return Err(FlowRuleError::NegativeTarget);
        }
        if target > MAX_TARGET {
            return Err(FlowRuleError::TargetTooLarge);
        }
        Ok(())
    }

    /// Revenue to store for a reported day.
    ///
    /// `cpa` flows earn `deposits × cpa_rate`; `spend` flows keep what the buyer
    /// reported. A product that would not fit the revenue column is rejected.
    pub fn effective_revenue(
        flow_type: FlowType,
        cpa_rate: Option<Decimal>,
        deposits: i64,
        reported: Decimal,
    ) -> Result<Decimal, StatsError> {
        let revenue = match flow_type {
            FlowType::Cpa => Decimal::from(deposits)
                .checked_mul(cpa_rate.unwrap_or(Decimal::ZERO))
                .ok_or(StatsError::TooLarge("revenue"))?
                .round_dp(2),
            FlowType::Spend => reported,
        };
        if fits_amount(revenue) {
            Ok(revenue)
        } else {
            Err(StatsError::TooLarge("revenue"))
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_cpa_requires_positive_rate() {
        assert!(FlowRules::validate_pricing(FlowType::Cpa, Some(dec!(25))).is_ok());
        assert!(matches!(
            FlowRules::validate_pricing(FlowType::Cpa, None),
            Err(FlowRuleError::CpaRateRequired)
        ));
        assert!(matches!(
            FlowRules::validate_pricing(FlowType::Cpa, Some(Decimal::ZERO)),
            Err(FlowRuleError::CpaRateRequired)
        ));
    }

    #[test]
    fn test_spend_rate_optional() {
        assert!(FlowRules::validate_pricing(FlowType::Spend, None).is_ok());
        assert!(FlowRules::validate_pricing(FlowType::Spend, Some(dec!(0))).is_ok());
        assert!(FlowRules::validate_pricing(FlowType::Spend, Some(dec!(-1))).is_err());
    }

    #[test]
    fn test_pricing_and_target_fit_columns() {
        assert_eq!(
            FlowRules::validate_pricing(FlowType::Cpa, Some(dec!(10000000000000000))),
            Err(FlowRuleError::CpaRateTooLarge)
        );
        assert!(FlowRules::validate_target(dec!(99999999999999.9999)).is_ok());
        assert_eq!(
            FlowRules::validate_target(dec!(100000000000000)),
            Err(FlowRuleError::TargetTooLarge)
        );
    }

    #[test]
    fn test_dates() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
        assert!(FlowRules::validate_dates(Some(d(1)), Some(d(31))).is_ok());
        assert!(FlowRules::validate_dates(Some(d(1)), Some(d(1))).is_ok());
        assert!(FlowRules::validate_dates(None, Some(d(1))).is_ok());
        assert!(FlowRules::validate_dates(Some(d(2)), Some(d(1))).is_err());
    }

    #[test]
    fn test_effective_revenue() {
        assert_eq!(
            FlowRules::effective_revenue(FlowType::Cpa, Some(dec!(42.50)), 4, dec!(999)),
            Ok(dec!(170.00))
        );
        assert_eq!(
            FlowRules::effective_revenue(FlowType::Spend, Some(dec!(42.50)), 4, dec!(999)),
            Ok(dec!(999))
        );
    }

    #[test]
    fn test_effective_revenue_rejects_oversized_product() {
        let rate = Some(dec!(9999999999999999.99));
        assert_eq!(
            FlowRules::effective_revenue(FlowType::Cpa, rate, 1_000_000_000, Decimal::ZERO),
            Err(StatsError::TooLarge("revenue"))
        );
        assert_eq!(
            FlowRules::effective_revenue(FlowType::Cpa, rate, i64::MAX, Decimal::ZERO),
            Err(StatsError::TooLarge("revenue"))
        );
        assert_eq!(
            FlowRules::effective_revenue(FlowType::Cpa, Some(dec!(0.01)), 1_000_000_000, dec!(0)),
            Ok(dec!(10000000.00))
        );
    }
}
