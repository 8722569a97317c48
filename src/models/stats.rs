use rust_decimal::Decimal;

/// Aggregates shown in the summary view. Always derived from the current
/// record list, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FinanceStats {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub savings: Decimal,
    /// Percentage of income kept, clamped at zero. `savings` itself is not clamped.
    pub savings_rate: Decimal,
}
