//! Payout percentage ranges.
//!
//! A flow's ranges map KPI achievement (percent of target) to the payout
//! percent the buyer earns. Ranges are half-open, `[from, to)`, sorted and
//! disjoint; only the last may omit `to`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::FlowRuleError;

/// One achievement band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentageRange {
    /// Inclusive lower bound of achievement, percent.
    pub from: Decimal,
    /// Exclusive upper bound; `None` means unbounded.
    #[serde(default)]
    pub to: Option<Decimal>,
    /// Payout percent for this band.
    pub percent: Decimal,
}

impl PercentageRange {
    /// Returns true if `achievement` falls inside the band.
    #[must_use]
    pub fn contains(&self, achievement: Decimal) -> bool {
        achievement >= self.from && self.to.is_none_or(|to| achievement < to)
    }

    /// Finds the payout percent for `achievement` in a validated list.
    #[must_use]
    pub fn payout_for(ranges: &[Self], achievement: Decimal) -> Option<Decimal> {
        ranges
            .iter()
            .find(|range| range.contains(achievement))
            .map(|range| range.percent)
    }
}

/// Checks bounds, ordering and overlap of a range list.
///
/// An empty list is valid: the flow simply has no payout bands.
pub fn validate_ranges(ranges: &[PercentageRange]) -> Result<(), FlowRuleError> {
    let hundred = Decimal::ONE_HUNDRED;
    let last = ranges.len().saturating_sub(1);
    let mut previous_end: Option<Decimal> = None;

    for (index, range) in ranges.iter().enumerate() {
        if range.from < Decimal::ZERO {
            return Err(FlowRuleError::InvalidRange {
                index,
                reason: "from must not be negative",
            });
        }
        if range.percent < Decimal::ZERO || range.percent > hundred {
            return Err(FlowRuleError::InvalidRange {
                index,
                reason: "percent must be between 0 and 100",
            });
        }
        match range.to {
            Some(to) if to <= range.from => {
                return Err(FlowRuleError::InvalidRange {
                    index,
                    reason: "to must be greater than from",
                });
            }
            None if index != last => return Err(FlowRuleError::OpenRangeNotLast { index }),
            _ => {}
        }
        if let Some(end) = previous_end
            && range.from < end
        {
            return Err(FlowRuleError::OverlappingRanges {
                index,
                from: range.from,
            });
        }
        previous_end = range.to;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn range(from: Decimal, to: Option<Decimal>, percent: Decimal) -> PercentageRange {
        PercentageRange { from, to, percent }
    }

    fn ladder() -> Vec<PercentageRange> {
        vec![
            range(dec!(0), Some(dec!(80)), dec!(0)),
            range(dec!(80), Some(dec!(100)), dec!(5)),
            range(dec!(100), None, dec!(10)),
        ]
    }

    #[test]
    fn test_valid_ladder() {
        assert!(validate_ranges(&ladder()).is_ok());
        assert!(validate_ranges(&[]).is_ok());
    }

    #[test]
    fn test_payout_lookup() {
        let ranges = ladder();
        assert_eq!(PercentageRange::payout_for(&ranges, dec!(79.99)), Some(dec!(0)));
        assert_eq!(PercentageRange::payout_for(&ranges, dec!(80)), Some(dec!(5)));
        assert_eq!(PercentageRange::payout_for(&ranges, dec!(250)), Some(dec!(10)));
    }

    #[test]
    fn test_gap_has_no_payout() {
        let ranges = vec![
            range(dec!(50), Some(dec!(60)), dec!(1)),
            range(dec!(70), None, dec!(2)),
        ];
        assert!(validate_ranges(&ranges).is_ok());
        assert_eq!(PercentageRange::payout_for(&ranges, dec!(65)), None);
        assert_eq!(PercentageRange::payout_for(&ranges, dec!(10)), None);
    }

    #[test]
    fn test_overlap_rejected() {
        let ranges = vec![
            range(dec!(0), Some(dec!(90)), dec!(1)),
            range(dec!(80), None, dec!(2)),
        ];
        assert_eq!(
            validate_ranges(&ranges),
            Err(FlowRuleError::OverlappingRanges {
                index: 1,
                from: dec!(80)
            })
        );
    }

    #[test]
    fn test_unsorted_rejected() {
        let ranges = vec![
            range(dec!(50), Some(dec!(60)), dec!(1)),
            range(dec!(0), Some(dec!(10)), dec!(2)),
        ];
        assert!(matches!(
            validate_ranges(&ranges),
            Err(FlowRuleError::OverlappingRanges { index: 1, .. })
        ));
    }

    #[test]
    fn test_open_range_must_be_last() {
        let ranges = vec![
            range(dec!(0), None, dec!(1)),
            range(dec!(100), Some(dec!(200)), dec!(2)),
        ];
        assert_eq!(
            validate_ranges(&ranges),
            Err(FlowRuleError::OpenRangeNotLast { index: 0 })
        );
    }

    #[test]
    fn test_bounds_rejected() {
        assert!(validate_ranges(&[range(dec!(-1), None, dec!(1))]).is_err());
        assert!(validate_ranges(&[range(dec!(10), Some(dec!(10)), dec!(1))]).is_err());
        assert!(validate_ranges(&[range(dec!(0), None, dec!(101))]).is_err());
    }

    #[test]
    fn test_deserializes_without_to() {
        let parsed: PercentageRange =
            serde_json::from_str(r#"{"from": "100", "percent": "10"}"#).unwrap();
        assert_eq!(parsed, range(dec!(100), None, dec!(10)));
    }
}
