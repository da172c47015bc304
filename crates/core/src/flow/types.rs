//! Flow enums.

use serde::{Deserialize, Serialize};

/// How a flow earns revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    /// Fixed payout per first deposit.
    Cpa,
    /// Revenue reported by the buyer against spend.
    Spend,
}

/// Lifecycle status of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowStatus {
    /// Running; accepts statistics.
    Active,
    /// Temporarily stopped; still accepts late statistics.
    Paused,
    /// Closed; statistics are frozen.
    Archived,
}

impl FlowStatus {
    /// Returns true if statistics may still be written.
    #[must_use]
    pub const fn accepts_stats(self) -> bool {
        !matches!(self, Self::Archived)
    }
}

/// KPI a flow is judged by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiMetric {
    /// Return on investment, percent.
    Roi,
    /// Revenue over spend, percent.
    Oas,
    /// Installs to registrations, percent.
    Inst2Reg,
    /// Registrations to deposits, percent.
    Reg2Dep,
    /// Redeposits per deposit, percent.
    Rd,
    /// Unique redepositors per deposit, percent.
    Urd,
    /// Cost per deposit.
    Cpd,
}

impl KpiMetric {
    /// Every metric.
    pub const ALL: [Self; 7] = [
        Self::Roi,
        Self::Oas,
        Self::Inst2Reg,
        Self::Reg2Dep,
        Self::Rd,
        Self::Urd,
        Self::Cpd,
    ];

    /// Lower values are better (a cost metric).
    #[must_use]
    pub const fn lower_is_better(self) -> bool {
        matches!(self, Self::Cpd)
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Roi => "roi",
            Self::Oas => "oas",
            Self::Inst2Reg => "inst2reg",
            Self::Reg2Dep => "reg2dep",
            Self::Rd => "rd",
            Self::Urd => "urd",
            Self::Cpd => "cpd",
        }
    }
}

macro_rules! impl_wire_str {
    ($ty:ty { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Parses the wire name.
            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($name => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let name = match self {
                    $(Self::$variant => $name,)+
                };
                f.write_str(name)
            }
        }
    };
}

impl_wire_str!(FlowType { Cpa => "cpa", Spend => "spend" });
impl_wire_str!(FlowStatus { Active => "active", Paused => "paused", Archived => "archived" });
impl_wire_str!(KpiMetric {
    Roi => "roi",
    Oas => "oas",
    Inst2Reg => "inst2reg",
    Reg2Dep => "reg2dep",
    Rd => "rd",
    Urd => "urd",
    Cpd => "cpd",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_wire_names_match_serde() {
        for metric in KpiMetric::ALL {
            let json = serde_json::to_string(&metric).unwrap();
            assert_eq!(json, format!("\"{}\"", metric.as_str()));
            assert_eq!(KpiMetric::parse(metric.as_str()), Some(metric));
            assert_eq!(metric.to_string(), metric.as_str());
        }
    }

    #[test]
    fn test_only_cpd_is_lower_better() {
        let lower: Vec<_> = KpiMetric::ALL
            .into_iter()
            .filter(|m| m.lower_is_better())
            .collect();
        assert_eq!(lower, vec![KpiMetric::Cpd]);
    }

    #[test]
    fn test_archived_rejects_stats() {
        assert!(FlowStatus::Active.accepts_stats());
        assert!(FlowStatus::Paused.accepts_stats());
        assert!(!FlowStatus::Archived.accepts_stats());
        assert_eq!(FlowStatus::parse("paused"), Some(FlowStatus::Paused));
        assert_eq!(FlowType::parse("CPA"), None);
    }
}
