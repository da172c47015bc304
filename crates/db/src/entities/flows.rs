//! `SeaORM` Entity for flows table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{FlowStatus, FlowType, KpiMetric};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "flows")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub brand_id: Uuid,
    pub geo_id: Uuid,
    pub team_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub flow_type: FlowType,
    pub status: FlowStatus,
    pub kpi_metric: KpiMetric,
    #[sea_orm(column_type = "Decimal(Some((18, 4)))")]
    pub kpi_target: Decimal,
    #[sea_orm(column_type = "JsonBinary")]
    pub percentage_ranges: Json,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))", nullable)]
    pub cpa_rate: Option<Decimal>,
    pub currency: String,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::flow_users::Entity")]
    FlowUsers,
    #[sea_orm(has_many = "super::flow_stats::Entity")]
    FlowStats,
}

impl Related<super::flow_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FlowUsers.def()
    }
}

impl Related<super::flow_stats::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FlowStats.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Decodes the stored payout ranges.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored JSON does not match the range shape.
    pub fn ranges(&self) -> Result<Vec<affdesk_core::flow::PercentageRange>, serde_json::Error> {
        serde_json::from_value(self.percentage_ranges.clone())
    }
}
