//! Flow statistics routes: day upserts, the month calendar and rollups.

use std::collections::HashMap;

use axum::{
    Router,
    extract::State,
    routing::{delete, get},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use affdesk_core::auth::{Permission, UserRole};
use affdesk_core::stats::{
    Kpis, MonthCalendar, MonthPeriod, RollupReport, StatCounters, validate_year, year_summary,
};
use affdesk_db::entities::flow_stats;
use affdesk_db::repositories::{FlowError, StatsScope, UpsertDayInput};
use affdesk_db::{FlowStatsRepository, UserRepository};

use super::visible_flow;
use crate::AppState;
use crate::extractors::{PathParams, ValidatedJson, non_negative_amount};
use crate::middleware::AuthUser;
use crate::response::{ApiResult, message, ok};

/// Creates the statistics routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/flow-stats/{flow_id}/days/{date}",
            get(get_day).put(upsert_day),
        )
        .route(
            "/flow-stats/{flow_id}/days/{date}/users/{user_id}",
            delete(delete_day),
        )
        .route(
            "/flow-stats/{flow_id}/calendar/{year}/{month}",
            get(flow_calendar),
        )
        .route("/flow-stats/{flow_id}/monthly/{year}", get(flow_monthly))
        .route("/flow-stats/users/{user_id}/{year}/{month}", get(user_month))
        .route("/flow-stats/teams/{team_id}/{year}/{month}", get(team_month))
        .route("/flow-stats/company/{year}/{month}", get(company_month))
}

/// Request body for a day upsert. Missing counters count as zero.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpsertDayRequest {
    /// Whose row; defaults to the caller.
    pub user_id: Option<Uuid>,
    /// Advertising spend.
    #[serde(default)]
    #[validate(custom(function = "non_negative_amount"))]
    pub spend: Decimal,
    /// Reported revenue; recomputed for `cpa` flows.
    #[serde(default)]
    #[validate(custom(function = "non_negative_amount"))]
    pub revenue: Decimal,
    /// App installs.
    #[serde(default)]
    #[validate(range(min = 0, max = 1_000_000_000, message = "must be 0 to 1000000000"))]
    pub installs: i64,
    /// Registrations.
    #[serde(default)]
    #[validate(range(min = 0, max = 1_000_000_000, message = "must be 0 to 1000000000"))]
    pub registrations: i64,
    /// First deposits.
    #[serde(default)]
    #[validate(range(min = 0, max = 1_000_000_000, message = "must be 0 to 1000000000"))]
    pub deposits: i64,
    /// Repeat deposits.
    #[serde(default)]
    #[validate(range(min = 0, max = 1_000_000_000, message = "must be 0 to 1000000000"))]
    pub redeposits: i64,
    /// Distinct re-depositing players.
    #[serde(default)]
    #[validate(range(min = 0, max = 1_000_000_000, message = "must be 0 to 1000000000"))]
    pub unique_redeposits: i64,
    /// Free-form notes.
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl UpsertDayRequest {
    const fn counters(&self) -> StatCounters {
        StatCounters {
            spend: self.spend,
            revenue: self.revenue,
            installs: self.installs,
            registrations: self.registrations,
            deposits: self.deposits,
            redeposits: self.redeposits,
            unique_redeposits: self.unique_redeposits,
        }
    }
}

/// One flow and day: the stored rows and their totals.
#[derive(Debug, Serialize)]
pub struct DayView {
    /// Flow.
    pub flow_id: Uuid,
    /// Day.
    pub date: NaiveDate,
    /// One row per user.
    pub rows: Vec<flow_stats::Model>,
    /// Sum of `rows`.
    pub totals: StatCounters,
    /// Ratios of `totals`.
    pub kpis: Kpis,
}

/// Twelve month summaries of one flow.
#[derive(Debug, Serialize)]
pub struct YearView<T> {
    /// Flow.
    pub flow_id: Uuid,
    /// Year.
    pub year: i32,
    /// January to December.
    pub months: Vec<T>,
}

/// Per-flow totals of a user.
#[derive(Debug, Serialize)]
pub struct FlowTotals {
    /// Flow.
    pub flow_id: Uuid,
    /// Summed figures.
    pub totals: StatCounters,
    /// Ratios of `totals`.
    pub kpis: Kpis,
}

/// Per-user totals within a team.
#[derive(Debug, Serialize)]
pub struct UserTotals {
    /// User.
    pub user_id: Uuid,
    /// Display name, when the user still exists.
    pub full_name: Option<String>,
    /// Summed figures.
    pub totals: StatCounters,
    /// Ratios of `totals`.
    pub kpis: Kpis,
}

/// Per-team totals company-wide; `team_id` is null for users without a team.
#[derive(Debug, Serialize)]
pub struct TeamTotals {
    /// Team.
    pub team_id: Option<Uuid>,
    /// Summed figures.
    pub totals: StatCounters,
    /// Ratios of `totals`.
    pub kpis: Kpis,
}

/// Buyers only ever see their own rows of a flow.
fn flow_scope(auth: &AuthUser, flow_id: Uuid) -> StatsScope {
    if auth.role() == UserRole::Buyer {
        StatsScope::FlowUser {
            flow_id,
            user_id: auth.user_id(),
        }
    } else {
        StatsScope::Flow(flow_id)
    }
}

/// PUT /flow-stats/{flow_id}/days/{date}
async fn upsert_day(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams((flow_id, date)): PathParams<(Uuid, NaiveDate)>,
    ValidatedJson(payload): ValidatedJson<UpsertDayRequest>,
) -> ApiResult {
    auth.require(Permission::WriteStats)?;
    let flow = visible_flow(&state, &auth, flow_id).await?;

    let user_id = payload.user_id.unwrap_or(auth.user_id());
    AuthUser::ensure(auth.actor().writes_stats_for(user_id, flow.team_id))?;

    let input = UpsertDayInput {
        flow_id: flow.id,
        user_id,
        stat_date: date,
        counters: payload.counters(),
        notes: payload.notes,
    };
    let saved = FlowStatsRepository::new(state.db()).upsert_day(input).await?;

    info!(
        flow_id = %saved.flow_id,
        user_id = %saved.user_id,
        stat_date = %saved.stat_date,
        written_by = %auth.user_id(),
        "Flow stats saved"
    );
    Ok(ok(saved))
}

/// GET /flow-stats/{flow_id}/days/{date}
async fn get_day(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams((flow_id, date)): PathParams<(Uuid, NaiveDate)>,
) -> ApiResult {
    let flow = visible_flow(&state, &auth, flow_id).await?;

    let mut rows = FlowStatsRepository::new(state.db())
        .day_rows(flow.id, date)
        .await?;
    if auth.role() == UserRole::Buyer {
        rows.retain(|row| row.user_id == auth.user_id());
    }

    let counters: Vec<StatCounters> = rows.iter().map(flow_stats::Model::counters).collect();
    let totals = StatCounters::try_sum(&counters)?;
    Ok(ok(DayView {
        flow_id: flow.id,
        date,
        rows,
        totals,
        kpis: Kpis::from_counters(&totals)?,
    }))
}

/// DELETE /flow-stats/{flow_id}/days/{date}/users/{user_id}
async fn delete_day(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams((flow_id, date, user_id)): PathParams<(Uuid, NaiveDate, Uuid)>,
) -> ApiResult {
    auth.require(Permission::WriteStats)?;
    let flow = visible_flow(&state, &auth, flow_id).await?;
    AuthUser::ensure(auth.actor().writes_stats_for(user_id, flow.team_id))?;

    FlowStatsRepository::new(state.db())
        .delete_day(flow.id, user_id, date)
        .await?;

    info!(flow_id = %flow.id, user_id = %user_id, stat_date = %date, "Flow stats deleted");
    Ok(message("Statistics deleted"))
}

/// GET /flow-stats/{flow_id}/calendar/{year}/{month}
async fn flow_calendar(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams((flow_id, year, month)): PathParams<(Uuid, i32, u32)>,
) -> ApiResult {
    let period = MonthPeriod::new(year, month)?;
    let flow = visible_flow(&state, &auth, flow_id).await?;
    let ranges = flow.ranges().map_err(FlowError::from)?;

    let records = FlowStatsRepository::new(state.db())
        .records(
            flow_scope(&auth, flow.id),
            period.first_day(),
            period.last_day(),
        )
        .await?;

    let calendar = MonthCalendar::build(period, &records)?.with_assessment(
        flow.kpi_metric.into(),
        flow.kpi_target,
        &ranges,
    )?;
    Ok(ok(calendar))
}

/// GET /flow-stats/{flow_id}/monthly/{year}
async fn flow_monthly(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams((flow_id, year)): PathParams<(Uuid, i32)>,
) -> ApiResult {
    let year = validate_year(year)?;
    let flow = visible_flow(&state, &auth, flow_id).await?;

    let first = MonthPeriod::new(year, 1)?.first_day();
    let last = MonthPeriod::new(year, 12)?.last_day();
    let records = FlowStatsRepository::new(state.db())
        .records(flow_scope(&auth, flow.id), first, last)
        .await?;

    Ok(ok(YearView {
        flow_id: flow.id,
        year,
        months: year_summary(year, &records)?,
    }))
}

/// GET /flow-stats/users/{user_id}/{year}/{month}
async fn user_month(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams((user_id, year, month)): PathParams<(Uuid, i32, u32)>,
) -> ApiResult {
    let period = MonthPeriod::new(year, month)?;
    if user_id != auth.user_id() {
        auth.require(Permission::ViewTeamStats)?;
        let user = UserRepository::new(state.db()).get(user_id).await?;
        AuthUser::ensure(auth.actor().reaches_user(user.id, user.team_id))?;
    }

    let records = FlowStatsRepository::new(state.db())
        .records(StatsScope::User(user_id), period.first_day(), period.last_day())
        .await?;

    let report = RollupReport::build(period, &records, |record| record.flow_id)?.map_rows(|row| {
        FlowTotals {
            flow_id: row.key,
            totals: row.totals,
            kpis: row.kpis,
        }
    });
    Ok(ok(report))
}

/// GET /flow-stats/teams/{team_id}/{year}/{month}
async fn team_month(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams((team_id, year, month)): PathParams<(Uuid, i32, u32)>,
) -> ApiResult {
    let period = MonthPeriod::new(year, month)?;
    auth.require(Permission::ViewTeamStats)?;
    AuthUser::ensure(auth.actor().reaches_team(Some(team_id)))?;

    let records = FlowStatsRepository::new(state.db())
        .records(StatsScope::Team(team_id), period.first_day(), period.last_day())
        .await?;
    let report = RollupReport::build(period, &records, |record| record.user_id)?;

    let ids: Vec<Uuid> = report.rows.iter().map(|row| row.key).collect();
    let names: HashMap<Uuid, String> = UserRepository::new(state.db())
        .names(&ids)
        .await?
        .into_iter()
        .collect();

    let report = report.map_rows(|row| UserTotals {
        user_id: row.key,
        full_name: names.get(&row.key).cloned(),
        totals: row.totals,
        kpis: row.kpis,
    });
    Ok(ok(report))
}

/// GET /flow-stats/company/{year}/{month}
async fn company_month(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams((year, month)): PathParams<(i32, u32)>,
) -> ApiResult {
    let period = MonthPeriod::new(year, month)?;
    auth.require(Permission::ViewCompanyStats)?;

    let records = FlowStatsRepository::new(state.db())
        .records(StatsScope::Company, period.first_day(), period.last_day())
        .await?;

    let report = RollupReport::build(period, &records, |record| record.team_id)?.map_rows(|row| {
        TeamTotals {
            team_id: row.key,
            totals: row.totals,
            kpis: row.kpis,
        }
    });
    Ok(ok(report))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_missing_counters_default_to_zero() {
        let body: UpsertDayRequest =
            serde_json::from_str(r#"{"spend": "120.50", "deposits": 3}"#).unwrap();
        let counters = body.counters();
        assert_eq!(counters.spend, dec!(120.50));
        assert_eq!(counters.deposits, 3);
        assert_eq!(counters.installs, 0);
        assert_eq!(body.user_id, None);
    }

    #[test]
    fn test_negative_counters_fail_validation() {
        let body = UpsertDayRequest {
            spend: dec!(-1),
            installs: -5,
            ..UpsertDayRequest::default()
        };
        let errors = body.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("spend"));
        assert!(fields.contains_key("installs"));
    }

    #[test]
    fn test_oversized_counters_fail_validation() {
        let body = UpsertDayRequest {
            revenue: dec!(10000000000000000),
            deposits: 1_000_000_001,
            redeposits: i64::MAX,
            ..UpsertDayRequest::default()
        };
        let errors = body.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("revenue"));
        assert!(fields.contains_key("deposits"));
        assert!(fields.contains_key("redeposits"));
        assert!(!fields.contains_key("installs"));
    }
}
