use crate::models::stats::FinanceStats;
use crate::models::transaction::{Transaction, TransactionType};
use rust_decimal::Decimal;

pub fn derive_stats(transactions: &[Transaction]) -> FinanceStats {
    let total_income = sum_by_type(transactions, TransactionType::Income);
    let total_expenses = sum_by_type(transactions, TransactionType::Expense);
    let savings = total_income.saturating_sub(total_expenses);

    // Savings never exceed income, so the ratio can only overflow on the
    // negative side, where the rate clamps to zero anyway.
    let savings_rate = if total_income > Decimal::ZERO {
        savings
            .checked_div(total_income)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    FinanceStats {
        total_income,
        total_expenses,
        savings,
        savings_rate,
    }
}

fn sum_by_type(transactions: &[Transaction], transaction_type: TransactionType) -> Decimal {
    transactions
        .iter()
        .filter(|t| t.transaction_type == transaction_type)
        .fold(Decimal::ZERO, |acc, t| acc.saturating_add(t.amount))
}
