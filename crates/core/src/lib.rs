//! Core business rules for Affdesk.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Roles, KPI arithmetic, status machines and summaries live here; handlers
//! and repositories call into it.
//!
//! # Modules
//!
//! - `auth` - Roles, permission table, row scope and password hashing
//! - `flow` - Flow types, KPI metrics and payout ranges
//! - `stats` - Daily counters, KPI ratios, month calendar and rollups
//! - `workflow` - Salary and partner payment status machines
//! - `communication` - Message rules and thread trees
//! - `finance` - Expense and investment summaries

pub mod auth;
pub mod communication;
pub mod finance;
pub mod flow;
pub mod stats;
pub mod workflow;
