//! Property-based tests for statistics aggregation.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{Kpis, MonthCalendar, MonthPeriod, RollupReport, StatCounters, StatRecord};

fn arb_counters() -> impl Strategy<Value = StatCounters> {
    (
        0i64..1_000_000,
        0i64..1_000_000,
        0i64..10_000,
        0i64..10_000,
        0i64..1_000,
        0i64..1_000,
        0i64..1_000,
    )
        .prop_map(
            |(spend, revenue, installs, registrations, deposits, redeposits, unique)| {
                StatCounters {
                    spend: Decimal::new(spend, 2),
                    revenue: Decimal::new(revenue, 2),
                    installs,
                    registrations,
                    deposits,
                    redeposits,
                    unique_redeposits: unique,
                }
            },
        )
}

fn arb_record() -> impl Strategy<Value = StatRecord> {
    (1u32..=28, 0u128..4, prop::option::of(0u128..3), arb_counters()).prop_map(
        |(day, user, team, counters)| StatRecord {
            flow_id: Uuid::nil(),
            user_id: Uuid::from_u128(user),
            team_id: team.map(Uuid::from_u128),
            stat_date: NaiveDate::from_ymd_opt(2025, 2, day).unwrap_or_default(),
            counters,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Month totals equal the sum of day totals and of user totals.
    #[test]
    fn prop_calendar_totals_consistent(records in prop::collection::vec(arb_record(), 0..40)) {
        let calendar = MonthCalendar::build(MonthPeriod::new(2025, 2).unwrap(), &records).unwrap();

        let by_day = StatCounters::try_sum(calendar.days.iter().map(|d| &d.totals)).unwrap();
        let by_user = StatCounters::try_sum(calendar.users.iter().map(|u| &u.totals)).unwrap();
        let raw = StatCounters::try_sum(records.iter().map(|r| &r.counters)).unwrap();

        prop_assert_eq!(calendar.days.len(), 28);
        prop_assert_eq!(by_day, calendar.totals);
        prop_assert_eq!(by_user, calendar.totals);
        prop_assert_eq!(raw, calendar.totals);
        prop_assert_eq!(calendar.kpis, Kpis::from_counters(&calendar.totals).unwrap());
    }

    /// Any grouping key yields the same grand totals.
    #[test]
    fn prop_rollup_totals_independent_of_key(records in prop::collection::vec(arb_record(), 0..40)) {
        let period = MonthPeriod::new(2025, 2).unwrap();
        let by_user = RollupReport::build(period, &records, |r| r.user_id).unwrap();
        let by_team = RollupReport::build(period, &records, |r| r.team_id).unwrap();

        prop_assert_eq!(by_user.totals, by_team.totals);
        prop_assert_eq!(by_user.kpis, by_team.kpis);
    }

    /// Ratios never divide by zero and percent ratios of sub-counts stay within 0..=100.
    #[test]
    fn prop_kpis_bounded(counters in arb_counters()) {
        let bounded = StatCounters {
            registrations: counters.registrations.min(counters.installs),
            ..counters
        };
        let kpis = Kpis::from_counters(&bounded).unwrap();

        prop_assert!(kpis.inst2reg >= Decimal::ZERO);
        prop_assert!(kpis.inst2reg <= Decimal::ONE_HUNDRED);
        prop_assert!(kpis.cpd >= Decimal::ZERO);
        if bounded.spend.is_zero() {
            prop_assert_eq!(kpis.roi, Decimal::ZERO);
            prop_assert_eq!(kpis.oas, Decimal::ZERO);
        }
    }
}
