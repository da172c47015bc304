//! Integration tests for day-level statistics and the month calendar.

mod common;

use chrono::{Datelike, Duration, Utc};
use rust_decimal_macros::dec;

use affdesk_core::stats::{MonthCalendar, MonthPeriod, StatCounters};
use affdesk_db::entities::sea_orm_active_enums::{FlowStatus, FlowType, UserRole};
use affdesk_db::repositories::{
    FlowRepository, FlowStatsError, FlowStatsRepository, StatsScope, UpdateFlowInput,
    UpsertDayInput,
};

fn counters(spend: rust_decimal::Decimal, deposits: i64) -> StatCounters {
    StatCounters {
        spend,
        revenue: dec!(0),
        installs: 100,
        registrations: 20,
        deposits,
        redeposits: 1,
        unique_redeposits: 1,
    }
}

#[tokio::test]
#[ignore = "requires a migrated Postgres at DATABASE_URL"]
async fn test_upsert_same_day_keeps_one_row() {
    let db = common::connect().await;
    let (flow, owner) = common::spend_flow(&db).await;
    let repo = FlowStatsRepository::new(db.clone());
    let today = Utc::now().date_naive();

    let mut input = UpsertDayInput {
        flow_id: flow.id,
        user_id: owner.id,
        stat_date: today,
        counters: counters(dec!(100), 4),
        notes: None,
    };
    input.counters.revenue = dec!(150);
    let first = repo.upsert_day(input.clone()).await.expect("first upsert");

    input.counters.spend = dec!(120);
    let second = repo.upsert_day(input).await.expect("second upsert");

    assert_eq!(first.id, second.id);
    assert_eq!(second.spend, dec!(120));
    assert_eq!(second.revenue, dec!(150));

    let rows = repo.day_rows(flow.id, today).await.expect("day rows");
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
#[ignore = "requires a migrated Postgres at DATABASE_URL"]
async fn test_cpa_revenue_is_computed() {
    let db = common::connect().await;
    let owner = common::user(&db, UserRole::Buyer, None).await;
    let brand = common::brand(&db).await;
    let geo = common::geo(&db).await;
    let flow = FlowRepository::new(db.clone())
        .create(common::flow_input(
            brand.id,
            geo.id,
            owner.id,
            FlowType::Cpa,
            Some(dec!(45.50)),
        ))
        .await
        .expect("create cpa flow");

    let mut reported = counters(dec!(300), 10);
    reported.revenue = dec!(99999);
    let saved = FlowStatsRepository::new(db.clone())
        .upsert_day(UpsertDayInput {
            flow_id: flow.id,
            user_id: owner.id,
            stat_date: Utc::now().date_naive(),
            counters: reported,
            notes: None,
        })
        .await
        .expect("upsert");

    assert_eq!(saved.revenue, dec!(455.00));
}

#[tokio::test]
#[ignore = "requires a migrated Postgres at DATABASE_URL"]
async fn test_unassigned_user_rejected() {
    let db = common::connect().await;
    let (flow, _owner) = common::spend_flow(&db).await;
    let stranger = common::user(&db, UserRole::Buyer, None).await;

    let result = FlowStatsRepository::new(db.clone())
        .upsert_day(UpsertDayInput {
            flow_id: flow.id,
            user_id: stranger.id,
            stat_date: Utc::now().date_naive(),
            counters: counters(dec!(10), 1),
            notes: None,
        })
        .await;

    assert!(matches!(result, Err(FlowStatsError::NotAssigned(id)) if id == stranger.id));

    FlowRepository::new(db.clone())
        .add_member(flow.id, stranger.id)
        .await
        .expect("add member");
    let retry = FlowStatsRepository::new(db.clone())
        .upsert_day(UpsertDayInput {
            flow_id: flow.id,
            user_id: stranger.id,
            stat_date: Utc::now().date_naive(),
            counters: counters(dec!(10), 1),
            notes: None,
        })
        .await;
    assert!(retry.is_ok());
}

#[tokio::test]
#[ignore = "requires a migrated Postgres at DATABASE_URL"]
async fn test_archived_flow_and_future_date_rejected() {
    let db = common::connect().await;
    let (flow, owner) = common::spend_flow(&db).await;
    let repo = FlowStatsRepository::new(db.clone());

    let future = repo
        .upsert_day(UpsertDayInput {
            flow_id: flow.id,
            user_id: owner.id,
            stat_date: Utc::now().date_naive() + Duration::days(2),
            counters: counters(dec!(10), 1),
            notes: None,
        })
        .await;
    assert!(matches!(future, Err(FlowStatsError::Stats(_))));

    FlowRepository::new(db.clone())
        .update(
            flow.id,
            UpdateFlowInput {
                status: Some(FlowStatus::Archived),
                ..UpdateFlowInput::default()
            },
        )
        .await
        .expect("archive flow");

    let archived = repo
        .upsert_day(UpsertDayInput {
            flow_id: flow.id,
            user_id: owner.id,
            stat_date: Utc::now().date_naive(),
            counters: counters(dec!(10), 1),
            notes: None,
        })
        .await;
    assert!(matches!(archived, Err(FlowStatsError::FlowArchived(_))));
}

#[tokio::test]
#[ignore = "requires a migrated Postgres at DATABASE_URL"]
async fn test_month_records_feed_calendar() {
    let db = common::connect().await;
    let (flow, owner) = common::spend_flow(&db).await;
    let repo = FlowStatsRepository::new(db.clone());

    let period = MonthPeriod::containing(Utc::now().date_naive()).expect("period");
    let first = period.first_day();
    let today = Utc::now().date_naive();
    for date in [first, today] {
        repo.upsert_day(UpsertDayInput {
            flow_id: flow.id,
            user_id: owner.id,
            stat_date: date,
            counters: counters(dec!(50), 2),
            notes: None,
        })
        .await
        .expect("upsert");
    }

    let records = repo
        .records(StatsScope::Flow(flow.id), period.first_day(), period.last_day())
        .await
        .expect("records");
    let calendar = MonthCalendar::build(period, &records).unwrap();

    let expected_days = if today.day() == 1 { 1 } else { 2 };
    assert_eq!(calendar.days.len(), period.days_in_month() as usize);
    assert_eq!(calendar.users.len(), 1);
    assert_eq!(calendar.users[0].active_days, expected_days);
    assert_eq!(calendar.totals.deposits, 2 * i64::from(expected_days));
}
