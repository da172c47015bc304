//! Month and date validation.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::StatsError;

/// Earliest accepted year.
pub const MIN_YEAR: i32 = 2000;
/// Latest accepted year.
pub const MAX_YEAR: i32 = 2100;

/// Validates a reporting year.
pub fn validate_year(year: i32) -> Result<i32, StatsError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(year)
    } else {
        Err(StatsError::InvalidYear(year))
    }
}

/// Rejects statistics dated after `today`.
pub fn validate_stat_date(date: NaiveDate, today: NaiveDate) -> Result<(), StatsError> {
    if date > today {
        return Err(StatsError::FutureDate(date));
    }
    validate_year(date.year()).map(|_| ())
}

/// A validated calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MonthPeriod {
    /// Year, 2000..=2100.
    pub year: i32,
    /// Month, 1..=12.
    pub month: u32,
}

impl MonthPeriod {
    /// Validates and builds a month.
    pub fn new(year: i32, month: u32) -> Result<Self, StatsError> {
        let year = validate_year(year)?;
        if !(1..=12).contains(&month) {
            return Err(StatsError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    /// Month containing `date`.
    pub fn containing(date: NaiveDate) -> Result<Self, StatsError> {
        Self::new(date.year(), date.month())
    }

    /// First day of the month.
    #[must_use]
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the month.
    #[must_use]
    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day().pred_opt().unwrap_or(NaiveDate::MAX)
    }

    /// Number of days in the month.
    #[must_use]
    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    /// Every day of the month, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let first = self.first_day();
        first.iter_days().take(self.days_in_month() as usize)
    }

    /// Returns true if `date` falls in this month.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// The following month. December 2100 rolls to January 2101, which is only
    /// used as an exclusive bound.
    #[must_use]
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}
