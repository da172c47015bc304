//! `SeaORM` Entity for flow_stats table.
//!
//! One row per flow, user and day; `(flow_id, user_id, stat_date)` is unique.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use affdesk_core::stats::StatCounters;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "flow_stats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub flow_id: Uuid,
    pub user_id: Uuid,
    pub stat_date: Date,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub spend: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub revenue: Decimal,
    pub installs: i64,
    pub registrations: i64,
    pub deposits: i64,
    pub redeposits: i64,
    pub unique_redeposits: i64,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// The additive figures of this row.
    #[must_use]
    pub const fn counters(&self) -> StatCounters {
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

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::flows::Entity",
        from = "Column::FlowId",
        to = "super::flows::Column::Id"
    )]
    Flows,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::flows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Flows.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
