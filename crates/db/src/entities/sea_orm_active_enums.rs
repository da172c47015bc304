//! Postgres enum types and their mapping to core domain enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use affdesk_core::{auth, communication, finance, flow, workflow};

/// Maps a database enum onto its core twin in both directions.
macro_rules! mirror_enum {
    ($db:ident <=> $module:ident :: $core:ident { $($variant:ident),+ $(,)? }) => {
        impl From<$db> for $module::$core {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$module::$core> for $db {
            fn from(value: $module::$core) -> Self {
                match value {
                    $($module::$core::$variant => Self::$variant,)+
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "finance")]
    Finance,
    #[sea_orm(string_value = "teamlead")]
    TeamLead,
    #[sea_orm(string_value = "buyer")]
    Buyer,
    #[sea_orm(string_value = "bizdev")]
    BizDev,
}

mirror_enum!(UserRole <=> auth::UserRole { Admin, Finance, TeamLead, Buyer, BizDev });

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "flow_type")]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    #[sea_orm(string_value = "cpa")]
    Cpa,
    #[sea_orm(string_value = "spend")]
    Spend,
}

mirror_enum!(FlowType <=> flow::FlowType { Cpa, Spend });

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "flow_status")]
#[serde(rename_all = "lowercase")]
pub enum FlowStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "paused")]
    Paused,
    #[sea_orm(string_value = "archived")]
    Archived,
}

mirror_enum!(FlowStatus <=> flow::FlowStatus { Active, Paused, Archived });

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "kpi_metric")]
#[serde(rename_all = "lowercase")]
pub enum KpiMetric {
    #[sea_orm(string_value = "roi")]
    Roi,
    #[sea_orm(string_value = "oas")]
    Oas,
    #[sea_orm(string_value = "inst2reg")]
    Inst2Reg,
    #[sea_orm(string_value = "reg2dep")]
    Reg2Dep,
    #[sea_orm(string_value = "rd")]
    Rd,
    #[sea_orm(string_value = "urd")]
    Urd,
    #[sea_orm(string_value = "cpd")]
    Cpd,
}

mirror_enum!(KpiMetric <=> flow::KpiMetric { Roi, Oas, Inst2Reg, Reg2Dep, Rd, Urd, Cpd });

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "salary_status")]
#[serde(rename_all = "lowercase")]
pub enum SalaryStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "paid")]
    Paid,
}

mirror_enum!(SalaryStatus <=> workflow::SalaryStatus { Pending, Approved, Rejected, Paid });

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_status")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "hold")]
    Hold,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

mirror_enum!(PaymentStatus <=> workflow::PaymentStatus {
    Pending,
    Processing,
    Hold,
    Completed,
    Failed,
    Cancelled,
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "investment_operation_type")]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    #[sea_orm(string_value = "deposit")]
    Deposit,
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
    #[sea_orm(string_value = "profit")]
    Profit,
    #[sea_orm(string_value = "fee")]
    Fee,
}

mirror_enum!(OperationType <=> finance::OperationType { Deposit, Withdrawal, Profit, Fee });

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "bizdev_status")]
#[serde(rename_all = "snake_case")]
pub enum BizdevStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "done")]
    Done,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "communication_context")]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    #[sea_orm(string_value = "flow")]
    Flow,
    #[sea_orm(string_value = "bizdev_request")]
    BizdevRequest,
}

mirror_enum!(ContextType <=> communication::ContextType { Flow, BizdevRequest });

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_mirror_round_trip() {
        for role in auth::UserRole::ALL {
            let stored = UserRole::from(role);
            assert_eq!(auth::UserRole::from(stored), role);
        }
    }

    #[test]
    fn test_metric_string_values_match_core() {
        for metric in flow::KpiMetric::ALL {
            assert_eq!(KpiMetric::from(metric).to_value(), metric.as_str());
        }
    }
}
