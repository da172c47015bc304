//! Year summaries and keyed rollups (per flow, per user, per team).

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use super::{Kpis, MonthPeriod, StatCounters, StatRecord, StatsError};

/// Totals for one month of a year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthSummary {
    /// Month, 1..=12.
    pub month: u32,
    /// Summed figures.
    pub totals: StatCounters,
    /// Ratios of `totals`.
    pub kpis: Kpis,
}

/// Twelve month summaries for `year`; records from other years are ignored.
pub fn year_summary(year: i32, records: &[StatRecord]) -> Result<Vec<MonthSummary>, StatsError> {
    let mut months = [StatCounters::default(); 12];
    for record in records.iter().filter(|r| r.stat_date.year() == year) {
        months[record.stat_date.month0() as usize].accumulate(&record.counters)?;
    }

    (1..=12)
        .zip(months)
        .map(|(month, totals)| {
            Ok(MonthSummary {
                month,
                totals,
                kpis: Kpis::from_counters(&totals)?,
            })
        })
        .collect()
}

/// Totals for one rollup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollupRow<K> {
    /// Grouping key (flow, user or team id).
    pub key: K,
    /// Summed figures.
    pub totals: StatCounters,
    /// Ratios of `totals`.
    pub kpis: Kpis,
}

/// Sums `records` by `key`, ordered by key.
pub fn rollup_by<K, F>(records: &[StatRecord], key: F) -> Result<Vec<RollupRow<K>>, StatsError>
where
    K: Ord,
    F: Fn(&StatRecord) -> K,
{
    let mut groups: BTreeMap<K, StatCounters> = BTreeMap::new();
    for record in records {
        groups
            .entry(key(record))
            .or_default()
            .accumulate(&record.counters)?;
    }

    groups
        .into_iter()
        .map(|(key, totals)| {
            Ok(RollupRow {
                key,
                totals,
                kpis: Kpis::from_counters(&totals)?,
            })
        })
        .collect()
}

/// A month rollup with grand totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollupReport<K> {
    /// The month.
    pub period: MonthPeriod,
    /// One row per key.
    pub rows: Vec<RollupRow<K>>,
    /// Sum over every row.
    pub totals: StatCounters,
    /// Ratios of `totals`.
    pub kpis: Kpis,
}

impl<K: Ord> RollupReport<K> {
    /// Rolls up the records of `period` by `key`.
    pub fn build<F>(period: MonthPeriod, records: &[StatRecord], key: F) -> Result<Self, StatsError>
    where
        F: Fn(&StatRecord) -> K,
    {
        let in_month: Vec<StatRecord> = records
            .iter()
            .filter(|record| period.contains(record.stat_date))
            .copied()
            .collect();
        let rows = rollup_by(&in_month, key)?;
        let totals = StatCounters::try_sum(rows.iter().map(|row| &row.totals))?;

        Ok(Self {
            period,
            rows,
            totals,
            kpis: Kpis::from_counters(&totals)?,
        })
    }

    /// Reshapes each row for the wire.
    pub fn map_rows<T>(self, f: impl FnMut(RollupRow<K>) -> T) -> MappedReport<T> {
        MappedReport {
            year: self.period.year,
            month: self.period.month,
            rows: self.rows.into_iter().map(f).collect(),
            totals: self.totals,
            kpis: self.kpis,
        }
    }
}

/// A rollup report with rows already shaped for the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappedReport<T> {
    /// Year.
    pub year: i32,
    /// Month.
    pub month: u32,
    /// Wire rows.
    pub rows: Vec<T>,
    /// Grand totals.
    pub totals: StatCounters,
    /// Ratios of `totals`.
    pub kpis: Kpis,
}
