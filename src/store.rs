use crate::db::slot::PersistencePort;
use crate::error::StorageError;
use crate::models::transaction::{Transaction, TransactionDraft};
use tracing::{info, warn};

/// Owns the transaction list, newest first, and rewrites the whole list to
/// its persistence port after every mutation.
pub struct RecordStore<P: PersistencePort> {
    transactions: Vec<Transaction>,
    port: P,
}

impl<P: PersistencePort> RecordStore<P> {
    /// Loads the persisted list. Missing, unreadable or corrupt data yields an
    /// empty store; the bad value is replaced on the next mutation.
    pub fn load(port: P) -> Self {
        let transactions = match port.read() {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Transaction>>(&raw) {
                Ok(list) => list,
                Err(e) => {
                    warn!(error = %e, "stored transactions are unparseable, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "could not read stored transactions, starting empty");
                Vec::new()
            }
        };
        info!(count = transactions.len(), "loaded transactions");

        Self { transactions, port }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Stamps the draft with a fresh id and the current time and puts it at
    /// the front of the list. A record that would not read back unchanged is
    /// refused, and a failed write leaves the list as it was.
    pub fn append(&mut self, draft: TransactionDraft) -> Result<&Transaction, StorageError> {
        let transaction = Transaction::from_draft(draft);
        ensure_round_trip(&transaction)?;
        info!(
            id = %transaction.id,
            kind = transaction.transaction_type.as_str(),
            amount = %transaction.amount,
            "appending transaction"
        );
        self.transactions.insert(0, transaction);
        if let Err(e) = self.flush() {
            warn!(error = %e, "write failed, discarding new transaction");
            self.transactions.remove(0);
            return Err(e);
        }
        Ok(&self.transactions[0])
    }

    /// Removes the transaction with `id`. Returns whether one was found; an
    /// unknown id is not an error.
    pub fn remove(&mut self, id: &str) -> Result<bool, StorageError> {
        let position = self.transactions.iter().position(|t| t.id == id);
        let removed = position.map(|pos| (pos, self.transactions.remove(pos)));
        info!(id, removed = removed.is_some(), "removing transaction");
        if let Err(e) = self.flush() {
            if let Some((pos, transaction)) = removed {
                warn!(error = %e, "write failed, restoring removed transaction");
                self.transactions.insert(pos, transaction);
            }
            return Err(e);
        }
        Ok(removed.is_some())
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(&self.transactions)?;
        self.port.write(&serialized)
    }
}

/// Amounts are stored as JSON floats; anything the float form cannot carry
/// exactly would either change on reload or make the whole list unreadable.
fn ensure_round_trip(transaction: &Transaction) -> Result<(), StorageError> {
    let serialized = serde_json::to_string(transaction)?;
    match serde_json::from_str::<Transaction>(&serialized) {
        Ok(read_back) if read_back == *transaction => Ok(()),
        _ => Err(StorageError::Unrepresentable(transaction.amount.to_string())),
    }
}
