//! Month calendar and single-day view.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::{KpiAssessment, Kpis, MonthPeriod, StatCounters, StatRecord, StatsError};
use crate::flow::{KpiMetric, PercentageRange};

/// One user's figures for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDayRow {
    /// Reporting user.
    pub user_id: Uuid,
    /// Reported figures.
    pub counters: StatCounters,
    /// Ratios for this row.
    pub kpis: Kpis,
}

/// Every user's figures for one day plus the day totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    /// The day.
    pub date: NaiveDate,
    /// Rows ordered by user id.
    pub users: Vec<UserDayRow>,
    /// Sum over `users`.
    pub totals: StatCounters,
    /// Ratios of `totals`.
    pub kpis: Kpis,
}

impl CalendarDay {
    /// Builds the view of `date`; records for other days are ignored.
    pub fn from_records(date: NaiveDate, records: &[StatRecord]) -> Result<Self, StatsError> {
        let mut per_user: BTreeMap<Uuid, StatCounters> = BTreeMap::new();
        for record in records.iter().filter(|r| r.stat_date == date) {
            per_user
                .entry(record.user_id)
                .or_default()
                .accumulate(&record.counters)?;
        }

        let users = per_user
            .into_iter()
            .map(|(user_id, counters)| {
                Ok(UserDayRow {
                    user_id,
                    counters,
                    kpis: Kpis::from_counters(&counters)?,
                })
            })
            .collect::<Result<Vec<_>, StatsError>>()?;
        let totals = StatCounters::try_sum(users.iter().map(|row| &row.counters))?;

        Ok(Self {
            date,
            users,
            totals,
            kpis: Kpis::from_counters(&totals)?,
        })
    }
}

/// One user's totals for the month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserMonthTotal {
    /// Reporting user.
    pub user_id: Uuid,
    /// Days with any row from this user.
    pub active_days: u32,
    /// Summed figures.
    pub totals: StatCounters,
    /// Ratios of `totals`.
    pub kpis: Kpis,
}

/// A month of one flow's statistics, day by day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCalendar {
    /// Year.
    pub year: i32,
    /// Month, 1..=12.
    pub month: u32,
    /// One entry per day of the month, empty days included.
    pub days: Vec<CalendarDay>,
    /// Per-user month totals, ordered by user id.
    pub users: Vec<UserMonthTotal>,
    /// Month totals.
    pub totals: StatCounters,
    /// Ratios of `totals`.
    pub kpis: Kpis,
    /// Month result against the flow target.
    pub assessment: Option<KpiAssessment>,
}

impl MonthCalendar {
    /// Builds the calendar for `period`. Records outside the month are ignored.
    pub fn build(period: MonthPeriod, records: &[StatRecord]) -> Result<Self, StatsError> {
        let in_month: Vec<StatRecord> = records
            .iter()
            .filter(|record| period.contains(record.stat_date))
            .copied()
            .collect();

        let days = period
            .days()
            .map(|date| CalendarDay::from_records(date, &in_month))
            .collect::<Result<Vec<_>, StatsError>>()?;

        let mut per_user: BTreeMap<Uuid, (u32, StatCounters)> = BTreeMap::new();
        for day in &days {
            for row in &day.users {
                let entry = per_user.entry(row.user_id).or_default();
                entry.0 += 1;
                entry.1.accumulate(&row.counters)?;
            }
        }
        let users = per_user
            .into_iter()
            .map(|(user_id, (active_days, totals))| {
                Ok(UserMonthTotal {
                    user_id,
                    active_days,
                    totals,
                    kpis: Kpis::from_counters(&totals)?,
                })
            })
            .collect::<Result<Vec<_>, StatsError>>()?;

        let totals = StatCounters::try_sum(days.iter().map(|day| &day.totals))?;

        Ok(Self {
            year: period.year,
            month: period.month,
            days,
            users,
            totals,
            kpis: Kpis::from_counters(&totals)?,
            assessment: None,
        })
    }

    /// Attaches the assessment of the month totals against a flow target.
    pub fn with_assessment(
        mut self,
        metric: KpiMetric,
        target: Decimal,
        ranges: &[PercentageRange],
    ) -> Result<Self, StatsError> {
        self.assessment = Some(KpiAssessment::assess(metric, target, &self.kpis, ranges)?);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn record(user_id: Uuid, day: u32, spend: Decimal, deposits: i64) -> StatRecord {
        StatRecord {
            flow_id: Uuid::nil(),
            user_id,
            team_id: None,
            stat_date: NaiveDate::from_ymd_opt(2025, 2, day).unwrap(),
            counters: StatCounters {
                spend,
                deposits,
                ..StatCounters::default()
            },
        }
    }

    #[test]
    fn test_every_day_present() {
        let period = MonthPeriod::new(2025, 2).unwrap();
        let calendar = MonthCalendar::build(period, &[]).unwrap();

        assert_eq!(calendar.days.len(), 28);
        assert!(calendar.days.iter().all(|day| day.users.is_empty()));
        assert!(calendar.totals.is_empty());
        assert!(calendar.users.is_empty());
    }

    #[test]
    fn test_merges_users_per_day_and_month() {
        let alice = Uuid::from_u128(1);
        let bob = Uuid::from_u128(2);
        let records = [
            record(alice, 1, dec!(100), 4),
            record(bob, 1, dec!(50), 1),
            record(alice, 3, dec!(30), 1),
        ];

        let period = MonthPeriod::new(2025, 2).unwrap();
        let calendar = MonthCalendar::build(period, &records).unwrap();

        let first = &calendar.days[0];
        assert_eq!(first.users.len(), 2);
        assert_eq!(first.users[0].user_id, alice);
        assert_eq!(first.totals.spend, dec!(150));
        assert_eq!(first.kpis.cpd, dec!(30.00));

        assert!(calendar.days[1].users.is_empty());
        assert_eq!(calendar.days[2].totals.deposits, 1);

        assert_eq!(calendar.users.len(), 2);
        assert_eq!(calendar.users[0].active_days, 2);
        assert_eq!(calendar.users[0].totals.spend, dec!(130));
        assert_eq!(calendar.totals.spend, dec!(180));
        assert_eq!(calendar.totals.deposits, 6);
        assert_eq!(calendar.kpis.cpd, dec!(30.00));
    }

    #[test]
    fn test_month_kpis_recomputed_not_averaged() {
        let user = Uuid::from_u128(7);
        // Day 1 cpd 100, day 2 cpd 1; the average of ratios would be 50.5.
        let records = [record(user, 1, dec!(100), 1), record(user, 2, dec!(99), 99)];

        let period = MonthPeriod::new(2025, 2).unwrap();
        let calendar = MonthCalendar::build(period, &records).unwrap();
        assert_eq!(calendar.kpis.cpd, dec!(1.99));
    }

    #[test]
    fn test_records_outside_month_ignored() {
        let user = Uuid::from_u128(7);
        let mut stray = record(user, 1, dec!(10), 1);
        stray.stat_date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        let calendar =
            MonthCalendar::build(MonthPeriod::new(2025, 2).unwrap(), &[stray]).unwrap();
        assert!(calendar.totals.is_empty());
    }

    #[test]
    fn test_with_assessment() {
        let user = Uuid::from_u128(7);
        let calendar = MonthCalendar::build(
            MonthPeriod::new(2025, 2).unwrap(),
            &[record(user, 1, dec!(100), 4)],
        )
        .unwrap()
        .with_assessment(KpiMetric::Cpd, dec!(50), &[])
        .unwrap();

        let assessment = calendar.assessment.unwrap();
        assert_eq!(assessment.actual, dec!(25.00));
        assert_eq!(assessment.achievement, dec!(200.00));
    }

    #[test]
    fn test_day_view() {
        let user = Uuid::from_u128(3);
        let records = [record(user, 5, dec!(12), 2), record(user, 6, dec!(1), 1)];
        let date = NaiveDate::from_ymd_opt(2025, 2, 5).unwrap();

        let day = CalendarDay::from_records(date, &records).unwrap();
        assert_eq!(day.users.len(), 1);
        assert_eq!(day.totals.spend, dec!(12));
        assert_eq!(day.kpis.cpd, dec!(6.00));
    }

    #[test]
    fn test_overflowing_rows_fail_instead_of_wrapping() {
        let user = Uuid::from_u128(9);
        let mut first = record(user, 1, dec!(1), 1);
        first.counters.installs = i64::MAX;
        let mut second = record(user, 2, dec!(1), 1);
        second.counters.installs = i64::MAX;

        let result = MonthCalendar::build(MonthPeriod::new(2025, 2).unwrap(), &[first, second]);
        assert_eq!(result, Err(StatsError::Overflow("installs")));
    }
}
