use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

/// One expense as loaded for the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseEntry {
    /// Free-form category, e.g. `tools` or `proxies`.
    pub category: String,
    /// Upper-case currency code.
    pub currency: String,
    /// Positive amount.
    pub amount: Decimal,
}

/// Total of one category in one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpenseTotal {
    /// Category.
    pub category: String,
    /// Currency code.
    pub currency: String,
    /// Number of expenses.
    pub count: u64,
    /// Sum of amounts.
    pub total: Decimal,
}

/// Expenses grouped by category and currency, with per-currency totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpenseSummary {
    /// Ordered by category, then currency.
    pub by_category: Vec<ExpenseTotal>,
    /// Currency code → total.
    pub by_currency: BTreeMap<String, Decimal>,
}

impl ExpenseSummary {
    /// Summarizes `entries`. Amounts in different currencies are never added
    /// together.
    #[must_use]
    pub fn build(entries: &[ExpenseEntry]) -> Self {
        let mut groups: BTreeMap<(&str, &str), (u64, Decimal)> = BTreeMap::new();
        let mut by_currency: BTreeMap<String, Decimal> = BTreeMap::new();

        for entry in entries {
            let group = groups
                .entry((entry.category.as_str(), entry.currency.as_str()))
                .or_default();
            group.0 += 1;
            group.1 += entry.amount;
            *by_currency.entry(entry.currency.clone()).or_default() += entry.amount;
        }

        let by_category = groups
            .into_iter()
            .map(|((category, currency), (count, total))| ExpenseTotal {
                category: category.to_string(),
                currency: currency.to_string(),
                count,
                total,
            })
            .collect();

        Self {
            by_category,
            by_currency,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn entry(category: &str, currency: &str, amount: Decimal) -> ExpenseEntry {
        ExpenseEntry {
            category: category.to_string(),
            currency: currency.to_string(),
            amount,
        }
    }

    #[test]
    fn test_groups_by_category_and_currency() {
        let summary = ExpenseSummary::build(&[
            entry("tools", "USD", dec!(10.00)),
            entry("proxies", "USD", dec!(5.50)),
            entry("tools", "USD", dec!(2.25)),
            entry("tools", "EUR", dec!(7)),
        ]);

        assert_eq!(summary.by_category.len(), 3);
        assert_eq!(summary.by_category[0].category, "proxies");
        let tools_usd = &summary.by_category[2];
        assert_eq!((tools_usd.currency.as_str(), tools_usd.count), ("USD", 2));
        assert_eq!(tools_usd.total, dec!(12.25));
        assert_eq!(summary.by_currency["USD"], dec!(17.75));
        assert_eq!(summary.by_currency["EUR"], dec!(7));
    }

    #[test]
    fn test_empty() {
        let summary = ExpenseSummary::build(&[]);
        assert!(summary.by_category.is_empty());
        assert!(summary.by_currency.is_empty());
    }
}
