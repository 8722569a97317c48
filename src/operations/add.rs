use crate::db::slot::PersistencePort;
use crate::models::transaction::{Transaction, TransactionDraft, TransactionType};
use crate::store::RecordStore;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Largest accepted amount in cents. Amounts are stored as JSON floats, and
/// up to this size with two decimals they read back unchanged.
pub const MAX_AMOUNT_CENTS: i64 = 99_999_999_999_999;

/// Validates raw form input. Nothing here touches the store, so a rejected
/// draft never causes a write.
pub fn create_draft(
    transaction_type: TransactionType,
    amount: &str,
    description: &str,
    category: &str,
) -> Result<TransactionDraft, String> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err("Amount is required.".to_string());
    }
    let amount = match Decimal::from_str(amount) {
        Ok(parsed_amount) => parsed_amount,
        Err(_) => {
            return Err(format!("Invalid amount format {}. Please provide a valid decimal number.", amount));
        }
    };
    if amount <= Decimal::ZERO {
        return Err("Amount must be greater than zero.".to_string());
    }
    if amount.normalize().scale() > 2 {
        return Err("Amount can have at most two decimal places.".to_string());
    }
    let max_amount = Decimal::new(MAX_AMOUNT_CENTS, 2);
    if amount > max_amount {
        return Err(format!("Amount must not exceed {}.", max_amount));
    }

    let description = description.trim();
    if description.is_empty() {
        return Err("Description is required.".to_string());
    }

    let category = match category.trim() {
        "" => transaction_type.default_category(),
        c => c,
    };

    Ok(TransactionDraft {
        transaction_type,
        amount,
        description: description.to_string(),
        category: category.to_string(),
    })
}

pub fn add_transaction<'a, P: PersistencePort>(
    store: &'a mut RecordStore<P>,
    transaction_type: TransactionType,
    amount: &str,
    description: &str,
    category: &str,
) -> Result<&'a Transaction, String> {
    let draft = create_draft(transaction_type, amount, description, category)?;
    store
        .append(draft)
        .map_err(|e| format!("Failed to save transaction: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::MemorySlot;

    #[test]
    fn test_create_draft_success() {
        let draft = create_draft(TransactionType::Expense, " 12.50 ", " Lunch ", "Food").unwrap();

        assert_eq!(draft.amount, Decimal::new(1250, 2));
        assert_eq!(draft.description, "Lunch");
        assert_eq!(draft.category, "Food");
    }

    #[test]
    fn test_create_draft_blank_amount() {
        let result = create_draft(TransactionType::Income, "  ", "Pay", "Salary");
        assert_eq!(result.unwrap_err(), "Amount is required.");
    }

    #[test]
    fn test_create_draft_non_numeric_amount() {
        let result = create_draft(TransactionType::Income, "abc", "Pay", "Salary");
        assert!(result.unwrap_err().contains("Invalid amount format abc"));
    }

    #[test]
    fn test_create_draft_rejects_non_positive_amount() {
        assert!(create_draft(TransactionType::Expense, "0", "x", "Food").is_err());
        assert!(create_draft(TransactionType::Expense, "-5", "x", "Food").is_err());
    }

    #[test]
    fn test_create_draft_rejects_amount_above_limit() {
        let result = create_draft(TransactionType::Income, "1000000000000", "Windfall", "");
        assert_eq!(result.unwrap_err(), "Amount must not exceed 999999999999.99.");

        let result = create_draft(TransactionType::Income, "79228162514264337593543950335", "Windfall", "");
        assert!(result.is_err());
    }

    #[test]
    fn test_create_draft_rejects_sub_cent_precision() {
        let result = create_draft(TransactionType::Expense, "12345678901234567.89", "Yacht", "");
        assert!(result.is_err());

        let result = create_draft(TransactionType::Expense, "0.001", "Rounding", "");
        assert_eq!(result.unwrap_err(), "Amount can have at most two decimal places.");

        let draft = create_draft(TransactionType::Expense, "4.500", "Coffee", "").unwrap();
        assert_eq!(draft.amount, Decimal::new(45, 1));
    }

    #[test]
    fn test_amount_at_limit_survives_reload() {
        let slot = MemorySlot::default();
        let mut store = RecordStore::load(slot.clone());
        add_transaction(&mut store, TransactionType::Income, "999999999999.99", "Exit", "").unwrap();
        add_transaction(&mut store, TransactionType::Expense, "0.01", "Gum", "").unwrap();

        let reloaded = RecordStore::load(slot);
        assert_eq!(reloaded.transactions(), store.transactions());
        assert_eq!(reloaded.transactions()[1].amount, Decimal::new(MAX_AMOUNT_CENTS, 2));
    }

    #[test]
    fn test_create_draft_empty_description() {
        let result = create_draft(TransactionType::Expense, "5", "   ", "Food");
        assert_eq!(result.unwrap_err(), "Description is required.");
    }

    #[test]
    fn test_create_draft_blank_category_uses_default() {
        let draft = create_draft(TransactionType::Income, "5", "Bonus", "").unwrap();
        assert_eq!(draft.category, "Salary");
    }

    #[test]
    fn test_create_draft_accepts_custom_category() {
        let draft = create_draft(TransactionType::Expense, "5", "Vet", "Pets").unwrap();
        assert_eq!(draft.category, "Pets");
    }

    #[test]
    fn test_add_transaction_rejected_input_never_writes() {
        let slot = MemorySlot::default();
        let mut store = RecordStore::load(slot.clone());

        let result = add_transaction(&mut store, TransactionType::Expense, "oops", "x", "Food");

        assert!(result.is_err());
        assert!(store.is_empty());
        assert_eq!(*slot.writes.borrow(), 0);
    }

    #[test]
    fn test_add_transaction_success() {
        let mut store = RecordStore::load(MemorySlot::default());

        let added = add_transaction(&mut store, TransactionType::Income, "1500", "Salary", "")
            .unwrap()
            .clone();

        assert_eq!(added.amount, Decimal::from(1500));
        assert_eq!(store.transactions(), &[added]);
    }
}
