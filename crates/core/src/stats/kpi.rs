//! Derived KPI ratios and assessment against a flow target.

use rust_decimal::Decimal;
use serde::Serialize;

use super::{StatCounters, StatsError};
use crate::flow::{KpiMetric, PercentageRange};

/// `numerator / denominator × scale`, rounded to 2 dp; 0 when the
/// denominator is 0.
///
/// Scales before dividing to keep precision, and divides first when that
/// would overflow.
fn ratio(
    numerator: Decimal,
    denominator: Decimal,
    scale: Decimal,
    field: &'static str,
) -> Result<Decimal, StatsError> {
    if denominator.is_zero() {
        return Ok(Decimal::ZERO);
    }
    numerator
        .checked_mul(scale)
        .and_then(|scaled| scaled.checked_div(denominator))
        .or_else(|| {
            numerator
                .checked_div(denominator)
                .and_then(|quotient| quotient.checked_mul(scale))
        })
        .map(|value| value.round_dp(2))
        .ok_or(StatsError::Overflow(field))
}

fn percent(
    numerator: Decimal,
    denominator: Decimal,
    field: &'static str,
) -> Result<Decimal, StatsError> {
    ratio(numerator, denominator, Decimal::ONE_HUNDRED, field)
}

/// KPI ratios derived from a set of counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Kpis {
    /// (revenue − spend) / spend × 100.
    pub roi: Decimal,
    /// revenue / spend × 100.
    pub oas: Decimal,
    /// registrations / installs × 100.
    pub inst2reg: Decimal,
    /// deposits / registrations × 100.
    pub reg2dep: Decimal,
    /// redeposits / deposits × 100.
    pub rd: Decimal,
    /// unique redeposits / deposits × 100.
    pub urd: Decimal,
    /// spend / deposits.
    pub cpd: Decimal,
}

impl Kpis {
    /// Computes every ratio from `counters`.
    pub fn from_counters(counters: &StatCounters) -> Result<Self, StatsError> {
        let installs = Decimal::from(counters.installs);
        let registrations = Decimal::from(counters.registrations);
        let deposits = Decimal::from(counters.deposits);
        let profit = counters
            .revenue
            .checked_sub(counters.spend)
            .ok_or(StatsError::Overflow("roi"))?;

        Ok(Self {
            roi: percent(profit, counters.spend, "roi")?,
            oas: percent(counters.revenue, counters.spend, "oas")?,
            inst2reg: percent(registrations, installs, "inst2reg")?,
            reg2dep: percent(deposits, registrations, "reg2dep")?,
            rd: percent(Decimal::from(counters.redeposits), deposits, "rd")?,
            urd: percent(Decimal::from(counters.unique_redeposits), deposits, "urd")?,
            cpd: ratio(counters.spend, deposits, Decimal::ONE, "cpd")?,
        })
    }

    /// Returns the value of one metric.
    #[must_use]
    pub const fn value(&self, metric: KpiMetric) -> Decimal {
        match metric {
            KpiMetric::Roi => self.roi,
            KpiMetric::Oas => self.oas,
            KpiMetric::Inst2Reg => self.inst2reg,
            KpiMetric::Reg2Dep => self.reg2dep,
            KpiMetric::Rd => self.rd,
            KpiMetric::Urd => self.urd,
            KpiMetric::Cpd => self.cpd,
        }
    }
}

/// How a flow's period performed against its KPI target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiAssessment {
    /// The flow's metric.
    pub metric: KpiMetric,
    /// The flow's target.
    pub target: Decimal,
    /// Actual value for the period.
    pub actual: Decimal,
    /// Percent of target achieved.
    pub achievement: Decimal,
    /// Payout percent from the matching range, if any range matches.
    pub payout_percent: Option<Decimal>,
}

impl KpiAssessment {
    /// Assesses `kpis` against a target.
    ///
    /// For a cost metric the ratio is inverted (`target / actual`), and an actual
    /// of zero scores zero.
    pub fn assess(
        metric: KpiMetric,
        target: Decimal,
        kpis: &Kpis,
        ranges: &[PercentageRange],
    ) -> Result<Self, StatsError> {
        let actual = kpis.value(metric);
        let achievement = if metric.lower_is_better() {
            percent(target, actual, "achievement")?
        } else {
            percent(actual, target, "achievement")?
        };

        Ok(Self {
            metric,
            target,
            actual,
            achievement,
            payout_percent: PercentageRange::payout_for(ranges, achievement),
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn sample() -> StatCounters {
        StatCounters {
            spend: dec!(200),
            revenue: dec!(300),
            installs: 1000,
            registrations: 250,
            deposits: 40,
            redeposits: 30,
            unique_redeposits: 12,
        }
    }

    #[test]
    fn test_formulas() {
        let kpis = Kpis::from_counters(&sample()).unwrap();

        assert_eq!(kpis.roi, dec!(50.00));
        assert_eq!(kpis.oas, dec!(150.00));
        assert_eq!(kpis.inst2reg, dec!(25.00));
        assert_eq!(kpis.reg2dep, dec!(16.00));
        assert_eq!(kpis.rd, dec!(75.00));
        assert_eq!(kpis.urd, dec!(30.00));
        assert_eq!(kpis.cpd, dec!(5.00));
    }

    #[test]
    fn test_zero_denominators() {
        assert_eq!(Kpis::from_counters(&StatCounters::default()).unwrap(), Kpis::default());

        let revenue_only = StatCounters {
            revenue: dec!(100),
            ..StatCounters::default()
        };
        let kpis = Kpis::from_counters(&revenue_only).unwrap();
        assert_eq!(kpis.roi, Decimal::ZERO);
        assert_eq!(kpis.oas, Decimal::ZERO);
    }

    #[test]
    fn test_rounding() {
        let counters = StatCounters {
            spend: dec!(100),
            deposits: 3,
            ..StatCounters::default()
        };
        assert_eq!(Kpis::from_counters(&counters).unwrap().cpd, dec!(33.33));
    }

    #[test]
    fn test_negative_roi() {
        let counters = StatCounters {
            spend: dec!(400),
            revenue: dec!(100),
            ..StatCounters::default()
        };
        assert_eq!(Kpis::from_counters(&counters).unwrap().roi, dec!(-75.00));
    }

    #[test]
    fn test_assessment_higher_is_better() {
        let ranges = [
            PercentageRange {
                from: dec!(0),
                to: Some(dec!(100)),
                percent: dec!(0),
            },
            PercentageRange {
                from: dec!(100),
                to: None,
                percent: dec!(15),
            },
        ];
        let kpis = Kpis::from_counters(&sample()).unwrap();
        let assessment =
            KpiAssessment::assess(KpiMetric::Roi, dec!(40), &kpis, &ranges).unwrap();

        assert_eq!(assessment.actual, dec!(50.00));
        assert_eq!(assessment.achievement, dec!(125.00));
        assert_eq!(assessment.payout_percent, Some(dec!(15)));
    }

    #[test]
    fn test_assessment_cpd_lower_is_better() {
        let kpis = Kpis::from_counters(&sample()).unwrap();
        let assessment = KpiAssessment::assess(KpiMetric::Cpd, dec!(10), &kpis, &[]).unwrap();

        assert_eq!(assessment.actual, dec!(5.00));
        assert_eq!(assessment.achievement, dec!(200.00));
        assert_eq!(assessment.payout_percent, None);
    }

    #[test]
    fn test_assessment_cpd_without_spend_scores_zero() {
        let kpis = Kpis::default();
        let assessment = KpiAssessment::assess(KpiMetric::Cpd, dec!(10), &kpis, &[]).unwrap();
        assert_eq!(assessment.achievement, Decimal::ZERO);
    }

    #[test]
    fn test_assessment_zero_target() {
        let kpis = Kpis::from_counters(&sample()).unwrap();
        let assessment =
            KpiAssessment::assess(KpiMetric::Oas, Decimal::ZERO, &kpis, &[]).unwrap();
        assert_eq!(assessment.achievement, Decimal::ZERO);
    }

    #[test]
    fn test_extreme_totals_do_not_panic() {
        let counters = StatCounters {
            spend: dec!(0.01),
            revenue: Decimal::MAX,
            ..StatCounters::default()
        };
        assert_eq!(
            Kpis::from_counters(&counters),
            Err(StatsError::Overflow("roi"))
        );

        // Scaling first would overflow; dividing first still fits.
        let counters = StatCounters {
            spend: dec!(1000),
            revenue: dec!(79000000000000000000000000000),
            ..StatCounters::default()
        };
        let kpis = Kpis::from_counters(&counters).unwrap();
        assert_eq!(kpis.oas, dec!(7900000000000000000000000000));
    }
}
