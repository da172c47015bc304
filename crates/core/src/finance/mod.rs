//! Expense and investment summaries.

mod expense;
mod investment;

pub use expense::{ExpenseEntry, ExpenseSummary, ExpenseTotal};
pub use investment::{
    CurrencyPosition, InvestmentEntry, InvestmentSummary, InvestorPosition, OperationType,
};

use rust_decimal::Decimal;

use affdesk_shared::AppError;

/// Requires a strictly positive amount.
pub fn ensure_positive_amount(amount: Decimal) -> Result<(), AppError> {
    if amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(AppError::field("amount", "amount must be greater than 0"))
    }
}
