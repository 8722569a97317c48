use crate::error::StorageError;
use rusqlite::{Connection, OptionalExtension};

/// Name of the slot holding the serialized transaction list.
pub const DEFAULT_SLOT_KEY: &str = "fintrack_data";

/// Read/write access to the single durable value holding the record list.
pub trait PersistencePort {
    /// Returns `None` when nothing has been stored yet.
    fn read(&self) -> Result<Option<String>, StorageError>;
    /// Replaces the stored value wholesale.
    fn write(&mut self, value: &str) -> Result<(), StorageError>;
}

/// A slot backed by one row of the `key_values` table.
pub struct SqliteSlot {
    conn: Connection,
    key: String,
}

impl SqliteSlot {
    pub fn new(conn: Connection, key: &str) -> Self {
        Self {
            conn,
            key: key.to_string(),
        }
    }
}

impl PersistencePort for SqliteSlot {
    fn read(&self) -> Result<Option<String>, StorageError> {
        self.conn
            .query_row(
                "SELECT value FROM key_values WHERE key = ?1",
                [&self.key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|source| StorageError::Read {
                key: self.key.clone(),
                source,
            })
    }

    fn write(&mut self, value: &str) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO key_values (key, value) VALUES (?1, ?2)",
                [self.key.as_str(), value],
            )
            .map_err(|source| StorageError::Write {
                key: self.key.clone(),
                source,
            })?;
        Ok(())
    }
}
