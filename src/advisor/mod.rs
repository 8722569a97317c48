pub mod gemini;

use crate::error::RequestError;
use crate::models::transaction::Transaction;

/// Turns the full transaction list into free-text financial tips.
///
/// Implementations own prompt construction, model choice and transport. The
/// caller guarantees `transactions` is non-empty.
pub trait AdvisoryClient: Send + Sync {
    fn request(&self, transactions: &[Transaction]) -> Result<String, RequestError>;
}
