//! Flow statistics aggregation.
//!
//! Daily counters are reported per flow, user and day. Everything above the
//! day level is derived here: per-day and per-month totals, the month
//! calendar, the twelve-month summary and user / team / company rollups.
//! KPI ratios are always recomputed from summed counters.
//!
//! # Modules
//!
//! - `counters` - `StatCounters`, the additive daily figures
//! - `kpi` - derived ratios and assessment against a flow target
//! - `period` - month and date validation
//! - `calendar` - month calendar and day view
//! - `rollup` - year summary and keyed rollups
//! - `error` - `StatsError`

pub mod calendar;
pub mod counters;
pub mod error;
pub mod kpi;
pub mod period;
pub mod rollup;

#[cfg(test)]
mod stats_props;

pub use calendar::{CalendarDay, MonthCalendar, UserDayRow, UserMonthTotal};
pub use counters::{MAX_COUNTER, StatCounters, StatRecord};
pub use error::StatsError;
pub use kpi::{KpiAssessment, Kpis};
pub use period::{MonthPeriod, validate_stat_date, validate_year};
pub use rollup::{MappedReport, MonthSummary, RollupReport, RollupRow, rollup_by, year_summary};
