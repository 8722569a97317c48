use crate::db::slot::PersistencePort;
use crate::store::RecordStore;

/// Deletes by id. Returns `Ok(false)` when no transaction had that id.
pub fn remove_transaction<P: PersistencePort>(
    store: &mut RecordStore<P>,
    id_input: &str,
) -> Result<bool, String> {
    let id = id_input.trim();
    if id.is_empty() {
        return Err("Transaction ID cannot be empty.".to_string());
    }

    store
        .remove(id)
        .map_err(|e| format!("Failed to save transactions: {}", e))
}
