use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const INCOME_CATEGORIES: [&str; 5] = ["Salary", "Freelance", "Investment", "Gift", "Other"];
const EXPENSE_CATEGORIES: [&str; 8] = [
    "Food",
    "Rent",
    "Utilities",
    "Transport",
    "Entertainment",
    "Shopping",
    "Health",
    "Other",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// Categories offered when recording this kind of transaction. Any other
    /// text is accepted too.
    pub fn suggested_categories(self) -> &'static [&'static str] {
        match self {
            TransactionType::Income => &INCOME_CATEGORIES,
            TransactionType::Expense => &EXPENSE_CATEGORIES,
        }
    }

    pub fn default_category(self) -> &'static str {
        self.suggested_categories()[0]
    }
}

/// Everything the user supplies for a new transaction. `id` and `date` are
/// filled in when the draft is appended to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub description: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub description: String,
    pub category: String,
    #[serde(with = "iso_millis")]
    pub date: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        id: String,
        transaction_type: TransactionType,
        amount: Decimal,
        description: String,
        category: String,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            transaction_type,
            amount,
            description,
            category,
            date,
        }
    }

    /// Stamps a draft with a fresh id and the current time, truncated to the
    /// millisecond precision it is stored with.
    pub fn from_draft(draft: TransactionDraft) -> Self {
        Self::new(
            Uuid::new_v4().to_string(),
            draft.transaction_type,
            draft.amount,
            draft.description,
            draft.category,
            Utc::now().trunc_subsecs(3),
        )
    }
}

/// Timestamps are stored as `2024-01-01T00:00:00.000Z`.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|d| d.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
