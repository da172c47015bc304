use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of investment operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Money in from an investor.
    Deposit,
    /// Money out to an investor.
    Withdrawal,
    /// Profit credited.
    Profit,
    /// Fee charged.
    Fee,
}

impl OperationType {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Profit => "profit",
            Self::Fee => "fee",
        }
    }

    /// Parses the wire name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(Self::Deposit),
            "withdrawal" => Some(Self::Withdrawal),
            "profit" => Some(Self::Profit),
            "fee" => Some(Self::Fee),
            _ => None,
        }
    }

    /// Sign of the operation in the investor's net position.
    #[must_use]
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Self::Deposit | Self::Profit => amount,
            Self::Withdrawal | Self::Fee => -amount,
        }
    }
}

/// One operation as loaded for the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvestmentEntry {
    /// Investor name.
    pub investor: String,
    /// Operation kind.
    pub operation_type: OperationType,
    /// Positive amount.
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
}

/// Totals for one currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CurrencyPosition {
    /// Currency code.
    pub currency: String,
    /// Sum of deposits.
    pub deposits: Decimal,
    /// Sum of withdrawals.
    pub withdrawals: Decimal,
    /// Sum of profit.
    pub profit: Decimal,
    /// Sum of fees.
    pub fees: Decimal,
    /// `deposits + profit − withdrawals − fees`.
    pub net: Decimal,
}

impl CurrencyPosition {
    fn add(&mut self, operation: OperationType, amount: Decimal) {
        match operation {
            OperationType::Deposit => self.deposits += amount,
            OperationType::Withdrawal => self.withdrawals += amount,
            OperationType::Profit => self.profit += amount,
            OperationType::Fee => self.fees += amount,
        }
        self.net += operation.signed(amount);
    }
}

/// One investor's net position in one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvestorPosition {
    /// Investor name.
    pub investor: String,
    /// Currency code.
    pub currency: String,
    /// Net amount.
    pub net: Decimal,
}

/// Per-currency and per-investor investment totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvestmentSummary {
    /// Ordered by currency.
    pub by_currency: Vec<CurrencyPosition>,
    /// Ordered by investor, then currency.
    pub by_investor: Vec<InvestorPosition>,
}

impl InvestmentSummary {
    /// Summarizes `entries`.
    #[must_use]
    pub fn build(entries: &[InvestmentEntry]) -> Self {
        let mut currencies: BTreeMap<&str, CurrencyPosition> = BTreeMap::new();
        let mut investors: BTreeMap<(&str, &str), Decimal> = BTreeMap::new();

        for entry in entries {
            currencies
                .entry(entry.currency.as_str())
                .or_insert_with(|| CurrencyPosition {
                    currency: entry.currency.clone(),
                    ..CurrencyPosition::default()
                })
                .add(entry.operation_type, entry.amount);

            *investors
                .entry((entry.investor.as_str(), entry.currency.as_str()))
                .or_default() += entry.operation_type.signed(entry.amount);
        }

        Self {
            by_currency: currencies.into_values().collect(),
            by_investor: investors
                .into_iter()
                .map(|((investor, currency), net)| InvestorPosition {
                    investor: investor.to_string(),
                    currency: currency.to_string(),
                    net,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn op(investor: &str, kind: OperationType, amount: Decimal, currency: &str) -> InvestmentEntry {
        InvestmentEntry {
            investor: investor.to_string(),
            operation_type: kind,
            amount,
            currency: currency.to_string(),
        }
    }

    #[test]
    fn test_net_formula() {
        let summary = InvestmentSummary::build(&[
            op("alpha", OperationType::Deposit, dec!(1000), "USDT"),
            op("alpha", OperationType::Profit, dec!(150), "USDT"),
            op("alpha", OperationType::Withdrawal, dec!(300), "USDT"),
            op("beta", OperationType::Deposit, dec!(500), "USDT"),
            op("beta", OperationType::Fee, dec!(25), "USDT"),
            op("beta", OperationType::Deposit, dec!(40), "EUR"),
        ]);

        assert_eq!(summary.by_currency.len(), 2);
        let usdt = &summary.by_currency[1];
        assert_eq!(usdt.currency, "USDT");
        assert_eq!(usdt.deposits, dec!(1500));
        assert_eq!(usdt.withdrawals, dec!(300));
        assert_eq!(usdt.profit, dec!(150));
        assert_eq!(usdt.fees, dec!(25));
        assert_eq!(usdt.net, dec!(1325));

        assert_eq!(summary.by_investor.len(), 3);
        assert_eq!(summary.by_investor[0].net, dec!(850));
        assert_eq!(summary.by_investor[1].currency, "EUR");
        assert_eq!(summary.by_investor[2].net, dec!(475));
    }

    #[test]
    fn test_parse() {
        assert_eq!(OperationType::parse("fee"), Some(OperationType::Fee));
        assert_eq!(OperationType::parse("Fee"), None);
    }
}
