//! `SeaORM` entity definitions.

#![allow(missing_docs)]

pub mod prelude;

pub mod bizdev_requests;
pub mod brands;
pub mod communications;
pub mod departments;
pub mod expenses;
pub mod flow_stats;
pub mod flow_users;
pub mod flows;
pub mod geos;
pub mod investment_operations;
pub mod partner_payments;
pub mod payment_methods;
pub mod salaries;
pub mod sea_orm_active_enums;
pub mod teams;
pub mod users;
