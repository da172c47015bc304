//! Additive daily counters.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use affdesk_shared::types::fits_amount;

use super::StatsError;

/// Largest count accepted for a single day.
pub const MAX_COUNTER: i64 = 1_000_000_000;

/// Figures a buyer reports for one flow and day.
///
/// Every field is additive, so totals over any set of days or users are sums.
/// Sums are checked: [`StatCounters::checked_add`] fails instead of wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCounters {
    /// Advertising spend.
    pub spend: Decimal,
    /// Revenue earned.
    pub revenue: Decimal,
    /// App installs.
    pub installs: i64,
    /// Registrations.
    pub registrations: i64,
    /// First deposits.
    pub deposits: i64,
    /// Repeat deposits.
    pub redeposits: i64,
    /// Distinct players who deposited again.
    pub unique_redeposits: i64,
}

impl StatCounters {
    /// Rejects negative or oversized figures, naming the first offending field.
    pub fn validate(&self) -> Result<(), StatsError> {
        let amounts = [("spend", self.spend), ("revenue", self.revenue)];
        let counts = [
            ("installs", self.installs),
            ("registrations", self.registrations),
            ("deposits", self.deposits),
            ("redeposits", self.redeposits),
            ("unique_redeposits", self.unique_redeposits),
        ];

        for (field, amount) in amounts {
            if amount < Decimal::ZERO {
                return Err(StatsError::NegativeCounter(field));
            }
            if !fits_amount(amount) {
                return Err(StatsError::TooLarge(field));
            }
        }
        for (field, count) in counts {
            if count < 0 {
                return Err(StatsError::NegativeCounter(field));
            }
            if count > MAX_COUNTER {
                return Err(StatsError::TooLarge(field));
            }
        }
        Ok(())
    }

    /// Returns true if nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Field-wise sum; fails with the name of the first field that overflows.
    pub fn checked_add(&self, rhs: &Self) -> Result<Self, StatsError> {
        fn amount(a: Decimal, b: Decimal, field: &'static str) -> Result<Decimal, StatsError> {
            a.checked_add(b).ok_or(StatsError::Overflow(field))
        }
        fn count(a: i64, b: i64, field: &'static str) -> Result<i64, StatsError> {
            a.checked_add(b).ok_or(StatsError::Overflow(field))
        }

        Ok(Self {
            spend: amount(self.spend, rhs.spend, "spend")?,
            revenue: amount(self.revenue, rhs.revenue, "revenue")?,
            installs: count(self.installs, rhs.installs, "installs")?,
            registrations: count(self.registrations, rhs.registrations, "registrations")?,
            deposits: count(self.deposits, rhs.deposits, "deposits")?,
            redeposits: count(self.redeposits, rhs.redeposits, "redeposits")?,
            unique_redeposits: count(
                self.unique_redeposits,
                rhs.unique_redeposits,
                "unique_redeposits",
            )?,
        })
    }

    /// Adds `rhs` in place.
    pub fn accumulate(&mut self, rhs: &Self) -> Result<(), StatsError> {
        *self = self.checked_add(rhs)?;
        Ok(())
    }

    /// Sums every item.
    pub fn try_sum<'a, I>(items: I) -> Result<Self, StatsError>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        items
            .into_iter()
            .try_fold(Self::default(), |total, item| total.checked_add(item))
    }
}

/// One stored statistics row, as loaded for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatRecord {
    /// Flow the row belongs to.
    pub flow_id: Uuid,
    /// Reporting user.
    pub user_id: Uuid,
    /// Team of the reporting user at query time.
    pub team_id: Option<Uuid>,
    /// Day of the figures.
    pub stat_date: NaiveDate,
    /// The figures.
    pub counters: StatCounters,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_sum() {
        let a = StatCounters {
            spend: dec!(10.50),
            revenue: dec!(20),
            installs: 3,
            deposits: 1,
            ..StatCounters::default()
        };
        let b = StatCounters {
            spend: dec!(4.50),
            registrations: 2,
            deposits: 2,
            ..StatCounters::default()
        };

        let total = StatCounters::try_sum(&[a, b]).unwrap();
        assert_eq!(total.spend, dec!(15.00));
        assert_eq!(total.revenue, dec!(20));
        assert_eq!(total.installs, 3);
        assert_eq!(total.registrations, 2);
        assert_eq!(total.deposits, 3);
    }

    #[test]
    fn test_validate_names_field() {
        let counters = StatCounters {
            redeposits: -1,
            ..StatCounters::default()
        };
        assert_eq!(
            counters.validate(),
            Err(StatsError::NegativeCounter("redeposits"))
        );
        assert!(StatCounters::default().validate().is_ok());
    }

    #[test]
    fn test_validate_caps() {
        let counters = StatCounters {
            installs: MAX_COUNTER + 1,
            ..StatCounters::default()
        };
        assert_eq!(counters.validate(), Err(StatsError::TooLarge("installs")));

        let counters = StatCounters {
            spend: dec!(10000000000000000),
            ..StatCounters::default()
        };
        assert_eq!(counters.validate(), Err(StatsError::TooLarge("spend")));

        let at_limit = StatCounters {
            deposits: MAX_COUNTER,
            revenue: dec!(9999999999999999.99),
            ..StatCounters::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_checked_add_reports_overflow() {
        let huge = StatCounters {
            installs: i64::MAX,
            ..StatCounters::default()
        };
        assert_eq!(
            huge.checked_add(&huge),
            Err(StatsError::Overflow("installs"))
        );

        let rich = StatCounters {
            revenue: Decimal::MAX,
            ..StatCounters::default()
        };
        assert_eq!(
            StatCounters::try_sum(&[rich, rich]),
            Err(StatsError::Overflow("revenue"))
        );
    }
}
