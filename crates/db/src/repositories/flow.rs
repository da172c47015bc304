//! Flow repository: flows and flow membership.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
    sea_query::Query,
};
use uuid::Uuid;

use affdesk_core::flow::{FlowRuleError, FlowRules, PercentageRange, validate_ranges};
use affdesk_shared::AppError;
use affdesk_shared::types::{PageRequest, PageResponse};

use super::{db_error, ensure_exists};
use crate::entities::{
    brands, communications, flow_stats, flow_users, flows, geos,
    sea_orm_active_enums::{ContextType, FlowStatus, FlowType, KpiMetric},
    teams, users,
};

/// Error types for flow operations.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// Flow name already exists.
    #[error("Flow '{0}' already exists")]
    DuplicateName(String),

    /// Flow not found.
    #[error("Flow not found: {0}")]
    NotFound(Uuid),

    /// A referenced record does not exist.
    #[error("{field} does not exist: {id}")]
    UnknownReference {
        /// Input field name.
        field: &'static str,
        /// Referenced id.
        id: Uuid,
    },

    /// Flow configuration rule violated.
    #[error(transparent)]
    Rule(#[from] FlowRuleError),

    /// Stored payout ranges could not be decoded.
    #[error("Stored percentage ranges are invalid: {0}")]
    CorruptRanges(#[from] serde_json::Error),

    /// Flow still has statistics.
    #[error("Flow has recorded statistics and cannot be deleted")]
    HasStats,

    /// User is already a member.
    #[error("User {0} is already a member of this flow")]
    AlreadyMember(Uuid),

    /// User is not a member.
    #[error("User {0} is not a member of this flow")]
    NotMember(Uuid),

    /// Inactive users cannot join flows.
    #[error("User {0} is inactive")]
    InactiveUser(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<FlowError> for AppError {
    fn from(err: FlowError) -> Self {
        match err {
            FlowError::DuplicateName(_) | FlowError::AlreadyMember(_) => {
                Self::Conflict(err.to_string())
            }
            FlowError::NotFound(_) | FlowError::NotMember(_) => Self::NotFound(err.to_string()),
            FlowError::UnknownReference { field, .. } => Self::field(field, err.to_string()),
            FlowError::Rule(rule) => rule.into(),
            FlowError::HasStats | FlowError::InactiveUser(_) => {
                Self::BusinessRule(err.to_string())
            }
            FlowError::CorruptRanges(_) => Self::Internal(err.to_string()),
            FlowError::Database(e) => db_error(e),
        }
    }
}

/// Input for creating a flow.
#[derive(Debug, Clone)]
pub struct CreateFlowInput {
    /// Unique name.
    pub name: String,
    /// Brand.
    pub brand_id: Uuid,
    /// Geo.
    pub geo_id: Uuid,
    /// Team.
    pub team_id: Option<Uuid>,
    /// Owner.
    pub owner_id: Uuid,
    /// Revenue model.
    pub flow_type: FlowType,
    /// Initial status.
    pub status: FlowStatus,
    /// KPI the flow is judged by.
    pub kpi_metric: KpiMetric,
    /// KPI target.
    pub kpi_target: Decimal,
    /// Payout ranges.
    pub percentage_ranges: Vec<PercentageRange>,
    /// Payout per deposit for `cpa` flows.
    pub cpa_rate: Option<Decimal>,
    /// Currency code.
    pub currency: String,
    /// First day.
    pub start_date: Option<NaiveDate>,
    /// Last day.
    pub end_date: Option<NaiveDate>,
    /// Description.
    pub description: Option<String>,
}

/// Input for updating a flow.
#[derive(Debug, Clone, Default)]
pub struct UpdateFlowInput {
    /// Unique name.
    pub name: Option<String>,
    /// Brand.
    pub brand_id: Option<Uuid>,
    /// Geo.
    pub geo_id: Option<Uuid>,
    /// Team.
    pub team_id: Option<Option<Uuid>>,
    /// Owner.
    pub owner_id: Option<Uuid>,
    /// Revenue model.
    pub flow_type: Option<FlowType>,
    /// Status.
    pub status: Option<FlowStatus>,
    /// KPI metric.
    pub kpi_metric: Option<KpiMetric>,
    /// KPI target.
    pub kpi_target: Option<Decimal>,
    /// Payout ranges.
    pub percentage_ranges: Option<Vec<PercentageRange>>,
    /// Payout per deposit.
    pub cpa_rate: Option<Option<Decimal>>,
    /// Currency code.
    pub currency: Option<String>,
    /// First day.
    pub start_date: Option<Option<NaiveDate>>,
    /// Last day.
    pub end_date: Option<Option<NaiveDate>>,
    /// Description.
    pub description: Option<Option<String>>,
}

/// Which flows a caller may list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlowScope {
    /// Every flow.
    #[default]
    All,
    /// Flows of a team plus flows the user owns or belongs to.
    Team {
        /// The lead's team.
        team_id: Option<Uuid>,
        /// The lead.
        user_id: Uuid,
    },
    /// Flows the user owns or belongs to.
    Member(Uuid),
}

/// Filter options for listing flows.
#[derive(Debug, Clone, Default)]
pub struct FlowFilter {
    /// Filter by status.
    pub status: Option<FlowStatus>,
    /// Filter by type.
    pub flow_type: Option<FlowType>,
    /// Filter by brand.
    pub brand_id: Option<Uuid>,
    /// Filter by geo.
    pub geo_id: Option<Uuid>,
    /// Filter by team.
    pub team_id: Option<Uuid>,
    /// Visibility restriction.
    pub scope: FlowScope,
}

fn owned_or_joined(user_id: Uuid) -> Condition {
    Condition::any()
        .add(flows::Column::OwnerId.eq(user_id))
        .add(
            flows::Column::Id.in_subquery(
                Query::select()
                    .column(flow_users::Column::FlowId)
                    .from(flow_users::Entity)
                    .and_where(flow_users::Column::UserId.eq(user_id))
                    .to_owned(),
            ),
        )
}

/// Flow repository for CRUD and membership operations.
#[derive(Debug, Clone)]
pub struct FlowRepository {
    db: DatabaseConnection,
}

impl FlowRepository {
    /// Creates a new flow repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists flows matching `filter`, ordered by name.
    pub async fn list(
        &self,
        filter: FlowFilter,
        page: PageRequest,
    ) -> Result<PageResponse<flows::Model>, FlowError> {
        let mut query = flows::Entity::find();

        if let Some(status) = filter.status {
            query = query.filter(flows::Column::Status.eq(status));
        }
        if let Some(flow_type) = filter.flow_type {
            query = query.filter(flows::Column::FlowType.eq(flow_type));
        }
        if let Some(brand_id) = filter.brand_id {
            query = query.filter(flows::Column::BrandId.eq(brand_id));
        }
        if let Some(geo_id) = filter.geo_id {
            query = query.filter(flows::Column::GeoId.eq(geo_id));
        }
        if let Some(team_id) = filter.team_id {
            query = query.filter(flows::Column::TeamId.eq(team_id));
        }
        match filter.scope {
            FlowScope::All => {}
            FlowScope::Team { team_id, user_id } => {
                let mut visible = owned_or_joined(user_id);
                if let Some(team_id) = team_id {
                    visible = visible.add(flows::Column::TeamId.eq(team_id));
                }
                query = query.filter(visible);
            }
            FlowScope::Member(user_id) => query = query.filter(owned_or_joined(user_id)),
        }

        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_asc(flows::Column::Name)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(items, page, total))
    }

    /// Finds a flow by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<flows::Model>, DbErr> {
        flows::Entity::find_by_id(id).one(&self.db).await
    }

    /// Loads a flow or fails with `FlowError::NotFound`.
    pub async fn get(&self, id: Uuid) -> Result<flows::Model, FlowError> {
        self.find_by_id(id).await?.ok_or(FlowError::NotFound(id))
    }

    async fn name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool, DbErr> {
        let mut query = flows::Entity::find().filter(flows::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(flows::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    async fn check_refs(
        &self,
        brand_id: Option<Uuid>,
        geo_id: Option<Uuid>,
        team_id: Option<Uuid>,
        owner_id: Option<Uuid>,
    ) -> Result<(), FlowError> {
        if let Some(id) = brand_id {
            ensure_exists!(&self.db, brands::Entity, id, FlowError::UnknownReference { field: "brand_id", id });
        }
        if let Some(id) = geo_id {
            ensure_exists!(&self.db, geos::Entity, id, FlowError::UnknownReference { field: "geo_id", id });
        }
        if let Some(id) = team_id {
            ensure_exists!(&self.db, teams::Entity, id, FlowError::UnknownReference { field: "team_id", id });
        }
        if let Some(id) = owner_id {
            ensure_exists!(&self.db, users::Entity, id, FlowError::UnknownReference { field: "owner_id", id });
        }
        Ok(())
    }

    fn check_rules(
        flow_type: FlowType,
        cpa_rate: Option<Decimal>,
        kpi_target: Decimal,
        ranges: &[PercentageRange],
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<(), FlowRuleError> {
        FlowRules::validate_pricing(flow_type.into(), cpa_rate)?;
        FlowRules::validate_target(kpi_target)?;
        FlowRules::validate_dates(start_date, end_date)?;
        validate_ranges(ranges)
    }

    /// Creates a flow.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken, a reference does not exist or a
    /// configuration rule is violated.
    pub async fn create(&self, input: CreateFlowInput) -> Result<flows::Model, FlowError> {
        Self::check_rules(
            input.flow_type,
            input.cpa_rate,
            input.kpi_target,
            &input.percentage_ranges,
            input.start_date,
            input.end_date,
        )?;
        if self.name_taken(&input.name, None).await? {
            return Err(FlowError::DuplicateName(input.name));
        }
        self.check_refs(
            Some(input.brand_id),
            Some(input.geo_id),
            input.team_id,
            Some(input.owner_id),
        )
        .await?;

        let now = chrono::Utc::now().into();
        let flow = flows::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            brand_id: Set(input.brand_id),
            geo_id: Set(input.geo_id),
            team_id: Set(input.team_id),
            owner_id: Set(input.owner_id),
            flow_type: Set(input.flow_type),
            status: Set(input.status),
            kpi_metric: Set(input.kpi_metric),
            kpi_target: Set(input.kpi_target),
            percentage_ranges: Set(serde_json::to_value(&input.percentage_ranges)?),
            cpa_rate: Set(input.cpa_rate),
            currency: Set(input.currency),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            description: Set(input.description),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(flow.insert(&self.db).await?)
    }

    /// Updates a flow. Rules are checked against the merged result.
    pub async fn update(&self, id: Uuid, input: UpdateFlowInput) -> Result<flows::Model, FlowError> {
        let flow = self.get(id).await?;

        let flow_type = input.flow_type.unwrap_or(flow.flow_type);
        let cpa_rate = input.cpa_rate.unwrap_or(flow.cpa_rate);
        let kpi_target = input.kpi_target.unwrap_or(flow.kpi_target);
        let start_date = input.start_date.unwrap_or(flow.start_date);
        let end_date = input.end_date.unwrap_or(flow.end_date);
        let ranges = match &input.percentage_ranges {
            Some(ranges) => ranges.clone(),
            None => flow.ranges()?,
        };
        Self::check_rules(flow_type, cpa_rate, kpi_target, &ranges, start_date, end_date)?;

        if let Some(name) = &input.name
            && *name != flow.name
            && self.name_taken(name, Some(id)).await?
        {
            return Err(FlowError::DuplicateName(name.clone()));
        }
        self.check_refs(
            input.brand_id,
            input.geo_id,
            input.team_id.flatten(),
            input.owner_id,
        )
        .await?;

        let mut active: flows::ActiveModel = flow.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(brand_id) = input.brand_id {
            active.brand_id = Set(brand_id);
        }
        if let Some(geo_id) = input.geo_id {
            active.geo_id = Set(geo_id);
        }
        if let Some(team_id) = input.team_id {
            active.team_id = Set(team_id);
        }
        if let Some(owner_id) = input.owner_id {
            active.owner_id = Set(owner_id);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(kpi_metric) = input.kpi_metric {
            active.kpi_metric = Set(kpi_metric);
        }
        if let Some(ranges) = input.percentage_ranges {
            active.percentage_ranges = Set(serde_json::to_value(&ranges)?);
        }
        if let Some(currency) = input.currency {
            active.currency = Set(currency);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        active.flow_type = Set(flow_type);
        active.cpa_rate = Set(cpa_rate);
        active.kpi_target = Set(kpi_target);
        active.start_date = Set(start_date);
        active.end_date = Set(end_date);
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a flow without statistics, together with its members and
    /// messages.
    pub async fn delete(&self, id: Uuid) -> Result<(), FlowError> {
        self.get(id).await?;

        let stat_count = flow_stats::Entity::find()
            .filter(flow_stats::Column::FlowId.eq(id))
            .count(&self.db)
            .await?;
        if stat_count > 0 {
            return Err(FlowError::HasStats);
        }

        let txn = self.db.begin().await?;
        communications::Entity::delete_many()
            .filter(communications::Column::ContextType.eq(ContextType::Flow))
            .filter(communications::Column::ContextId.eq(id))
            .exec(&txn)
            .await?;
        flow_users::Entity::delete_many()
            .filter(flow_users::Column::FlowId.eq(id))
            .exec(&txn)
            .await?;
        flows::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::debug!(flow_id = %id, "Flow deleted with members and messages");

        Ok(())
    }

    // ========================================================================
    // Membership
    // ========================================================================

    /// Returns true if `user_id` is a member of the flow.
    pub async fn is_member(&self, flow_id: Uuid, user_id: Uuid) -> Result<bool, DbErr> {
        let count = flow_users::Entity::find()
            .filter(flow_users::Column::FlowId.eq(flow_id))
            .filter(flow_users::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Lists member users of a flow, ordered by name.
    pub async fn members(&self, flow_id: Uuid) -> Result<Vec<users::Model>, FlowError> {
        Ok(users::Entity::find()
            .join(JoinType::InnerJoin, flow_users::Relation::Users.def().rev())
            .filter(flow_users::Column::FlowId.eq(flow_id))
            .order_by_asc(users::Column::FullName)
            .all(&self.db)
            .await?)
    }

    /// Adds an active user to a flow.
    pub async fn add_member(&self, flow_id: Uuid, user_id: Uuid) -> Result<(), FlowError> {
        self.get(flow_id).await?;
        let user = users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(FlowError::UnknownReference {
                field: "user_id",
                id: user_id,
            })?;
        if !user.is_active {
            return Err(FlowError::InactiveUser(user_id));
        }
        if self.is_member(flow_id, user_id).await? {
            return Err(FlowError::AlreadyMember(user_id));
        }

        let member = flow_users::ActiveModel {
            flow_id: Set(flow_id),
            user_id: Set(user_id),
            created_at: Set(chrono::Utc::now().into()),
        };
        flow_users::Entity::insert(member).exec(&self.db).await?;
        Ok(())
    }

    /// Removes a user from a flow.
    pub async fn remove_member(&self, flow_id: Uuid, user_id: Uuid) -> Result<(), FlowError> {
        self.get(flow_id).await?;
        let result = flow_users::Entity::delete_many()
            .filter(flow_users::Column::FlowId.eq(flow_id))
            .filter(flow_users::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(FlowError::NotMember(user_id));
        }
        Ok(())
    }
}
