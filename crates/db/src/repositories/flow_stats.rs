//! Flow statistics repository.
//!
//! Day rows are written with `INSERT ... ON CONFLICT (flow_id, user_id,
//! stat_date) DO UPDATE`, so concurrent writers for the same key converge on
//! one row without application locks. Reads return [`StatRecord`]s carrying
//! the user's team, ready for the aggregation code in `affdesk_core::stats`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, sea_query::OnConflict,
};
use uuid::Uuid;

use affdesk_core::flow::FlowRules;
use affdesk_core::stats::{StatCounters, StatRecord, StatsError, validate_stat_date};
use affdesk_shared::AppError;

use super::db_error;
use crate::entities::{flow_stats, flow_users, flows, users};

/// Error types for statistics operations.
#[derive(Debug, thiserror::Error)]
pub enum FlowStatsError {
    /// Flow not found.
    #[error("Flow not found: {0}")]
    FlowNotFound(Uuid),

    /// Archived flows are read-only.
    #[error("Flow {0} is archived and no longer accepts statistics")]
    FlowArchived(Uuid),

    /// The user neither owns nor belongs to the flow.
    #[error("User {0} is not assigned to this flow")]
    NotAssigned(Uuid),

    /// No row for the given key.
    #[error("No statistics for user {user_id} on {date}")]
    DayNotFound {
        /// User.
        user_id: Uuid,
        /// Day.
        date: NaiveDate,
    },

    /// Counter or date validation failed.
    #[error(transparent)]
    Stats(#[from] StatsError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<FlowStatsError> for AppError {
    fn from(err: FlowStatsError) -> Self {
        match err {
            FlowStatsError::FlowNotFound(_) | FlowStatsError::DayNotFound { .. } => {
                Self::NotFound(err.to_string())
            }
            FlowStatsError::FlowArchived(_) => Self::BusinessRule(err.to_string()),
            FlowStatsError::NotAssigned(_) => Self::field("user_id", err.to_string()),
            FlowStatsError::Stats(e) => e.into(),
            FlowStatsError::Database(e) => db_error(e),
        }
    }
}

/// Input for a day-level upsert.
#[derive(Debug, Clone)]
pub struct UpsertDayInput {
    /// Flow.
    pub flow_id: Uuid,
    /// User the counters belong to.
    pub user_id: Uuid,
    /// Day.
    pub stat_date: NaiveDate,
    /// Reported counters. Revenue is recomputed for `cpa` flows.
    pub counters: StatCounters,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Which rows a record query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsScope {
    /// All users of one flow.
    Flow(Uuid),
    /// One user within one flow.
    FlowUser {
        /// Flow.
        flow_id: Uuid,
        /// User.
        user_id: Uuid,
    },
    /// One user across all flows.
    User(Uuid),
    /// Every user currently in a team.
    Team(Uuid),
    /// Everything.
    Company,
}

#[derive(Debug, FromQueryResult)]
struct StatRow {
    flow_id: Uuid,
    user_id: Uuid,
    team_id: Option<Uuid>,
    stat_date: NaiveDate,
    spend: Decimal,
    revenue: Decimal,
    installs: i64,
    registrations: i64,
    deposits: i64,
    redeposits: i64,
    unique_redeposits: i64,
}

impl From<StatRow> for StatRecord {
    fn from(row: StatRow) -> Self {
        Self {
            flow_id: row.flow_id,
            user_id: row.user_id,
            team_id: row.team_id,
            stat_date: row.stat_date,
            counters: StatCounters {
                spend: row.spend,
                revenue: row.revenue,
                installs: row.installs,
                registrations: row.registrations,
                deposits: row.deposits,
                redeposits: row.redeposits,
                unique_redeposits: row.unique_redeposits,
            },
        }
    }
}

/// Repository for day-level statistics.
#[derive(Debug, Clone)]
pub struct FlowStatsRepository {
    db: DatabaseConnection,
}

impl FlowStatsRepository {
    /// Creates a new statistics repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn flow(&self, flow_id: Uuid) -> Result<flows::Model, FlowStatsError> {
        flows::Entity::find_by_id(flow_id)
            .one(&self.db)
            .await?
            .ok_or(FlowStatsError::FlowNotFound(flow_id))
    }

    async fn is_assigned(&self, flow: &flows::Model, user_id: Uuid) -> Result<bool, DbErr> {
        if flow.owner_id == user_id {
            return Ok(true);
        }
        let member = flow_users::Entity::find_by_id((flow.id, user_id))
            .one(&self.db)
            .await?;
        Ok(member.is_some())
    }

    /// Inserts or replaces the counters for one flow, user and day.
    ///
    /// # Errors
    ///
    /// Fails when the flow is missing or archived, the date lies in the
    /// future, a counter is negative, or the user is not assigned to the flow.
    pub async fn upsert_day(
        &self,
        input: UpsertDayInput,
    ) -> Result<flow_stats::Model, FlowStatsError> {
        let flow = self.flow(input.flow_id).await?;
        let status: affdesk_core::flow::FlowStatus = flow.status.into();
        if !status.accepts_stats() {
            return Err(FlowStatsError::FlowArchived(flow.id));
        }

        validate_stat_date(input.stat_date, chrono::Utc::now().date_naive())?;
        input.counters.validate()?;

        if !self.is_assigned(&flow, input.user_id).await? {
            return Err(FlowStatsError::NotAssigned(input.user_id));
        }

        let counters = input.counters;
        let revenue = FlowRules::effective_revenue(
            flow.flow_type.into(),
            flow.cpa_rate,
            counters.deposits,
            counters.revenue,
        )?;

        let now = chrono::Utc::now().into();
        let row = flow_stats::ActiveModel {
            id: Set(Uuid::new_v4()),
            flow_id: Set(input.flow_id),
            user_id: Set(input.user_id),
            stat_date: Set(input.stat_date),
            spend: Set(counters.spend),
            revenue: Set(revenue),
            installs: Set(counters.installs),
            registrations: Set(counters.registrations),
            deposits: Set(counters.deposits),
            redeposits: Set(counters.redeposits),
            unique_redeposits: Set(counters.unique_redeposits),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let saved = flow_stats::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    flow_stats::Column::FlowId,
                    flow_stats::Column::UserId,
                    flow_stats::Column::StatDate,
                ])
                .update_columns([
                    flow_stats::Column::Spend,
                    flow_stats::Column::Revenue,
                    flow_stats::Column::Installs,
                    flow_stats::Column::Registrations,
                    flow_stats::Column::Deposits,
                    flow_stats::Column::Redeposits,
                    flow_stats::Column::UniqueRedeposits,
                    flow_stats::Column::Notes,
                    flow_stats::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_with_returning(&self.db)
            .await?;

        tracing::debug!(
            flow_id = %saved.flow_id,
            user_id = %saved.user_id,
            stat_date = %saved.stat_date,
            "Stat day upserted"
        );
        Ok(saved)
    }

    /// Rows of one flow and day, ordered by user.
    pub async fn day_rows(
        &self,
        flow_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<flow_stats::Model>, FlowStatsError> {
        self.flow(flow_id).await?;
        Ok(flow_stats::Entity::find()
            .filter(flow_stats::Column::FlowId.eq(flow_id))
            .filter(flow_stats::Column::StatDate.eq(date))
            .order_by_asc(flow_stats::Column::UserId)
            .all(&self.db)
            .await?)
    }

    /// Deletes one user's row for a day.
    pub async fn delete_day(
        &self,
        flow_id: Uuid,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<(), FlowStatsError> {
        let result = flow_stats::Entity::delete_many()
            .filter(flow_stats::Column::FlowId.eq(flow_id))
            .filter(flow_stats::Column::UserId.eq(user_id))
            .filter(flow_stats::Column::StatDate.eq(date))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(FlowStatsError::DayNotFound { user_id, date });
        }
        Ok(())
    }

    /// Loads records in `[from, to]` for the given scope.
    ///
    /// `team_id` on each record is the user's current team.
    pub async fn records(
        &self,
        scope: StatsScope,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<StatRecord>, FlowStatsError> {
        let mut query = flow_stats::Entity::find()
            .select_only()
            .columns([
                flow_stats::Column::FlowId,
                flow_stats::Column::UserId,
                flow_stats::Column::StatDate,
                flow_stats::Column::Spend,
                flow_stats::Column::Revenue,
                flow_stats::Column::Installs,
                flow_stats::Column::Registrations,
                flow_stats::Column::Deposits,
                flow_stats::Column::Redeposits,
                flow_stats::Column::UniqueRedeposits,
            ])
            .column_as(users::Column::TeamId, "team_id")
            .join(JoinType::InnerJoin, flow_stats::Relation::Users.def())
            .filter(flow_stats::Column::StatDate.between(from, to));

        query = match scope {
            StatsScope::Flow(flow_id) => query.filter(flow_stats::Column::FlowId.eq(flow_id)),
            StatsScope::FlowUser { flow_id, user_id } => query
                .filter(flow_stats::Column::FlowId.eq(flow_id))
                .filter(flow_stats::Column::UserId.eq(user_id)),
            StatsScope::User(user_id) => query.filter(flow_stats::Column::UserId.eq(user_id)),
            StatsScope::Team(team_id) => query.filter(users::Column::TeamId.eq(team_id)),
            StatsScope::Company => query,
        };

        let rows = query
            .order_by_asc(flow_stats::Column::StatDate)
            .order_by_asc(flow_stats::Column::UserId)
            .into_model::<StatRow>()
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(StatRecord::from).collect())
    }
}
