//! ACID-durable statement store backed by redb.
//!
//! Statements are bincode-encoded and keyed by [`Statement::key`], so the
//! uniqueness check and the append happen inside one write transaction.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};

use super::{Statement, StatementStore, StoreResult};
use crate::error::StoreError;

/// Table of statements (identity key → bincode `Statement`).
const STATEMENTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("statements");

/// File name of the database inside the data directory.
const DB_FILE: &str = "statements.redb";

fn redb_err<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> StoreError {
    move |e| StoreError::Redb {
        message: format!("{context} failed: {e}"),
    }
}

/// Durable store using redb.
///
/// All writes go through transactions. Reads use MVCC snapshots.
pub struct DurableStatementStore {
    db: Arc<Database>,
}

impl DurableStatementStore {
    /// Open or create a store in the given directory.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| StoreError::Io { source: e })?;
        let db_path = data_dir.join(DB_FILE);
        let db = Database::create(&db_path).map_err(|e| StoreError::Redb {
            message: format!("failed to open redb at {}: {e}", db_path.display()),
        })?;

        // Read transactions cannot open a table that was never created.
        let txn = db.begin_write().map_err(redb_err("begin_write"))?;
        txn.open_table(STATEMENTS_TABLE)
            .map_err(redb_err("open_table"))?;
        txn.commit().map_err(redb_err("commit"))?;

        tracing::debug!(path = %db_path.display(), "opened statement store");
        Ok(Self { db: Arc::new(db) })
    }
}

impl StatementStore for DurableStatementStore {
    fn count(&self) -> StoreResult<usize> {
        let txn = self.db.begin_read().map_err(redb_err("begin_read"))?;
        let table = txn
            .open_table(STATEMENTS_TABLE)
            .map_err(redb_err("open_table"))?;
        let len = table.len().map_err(redb_err("len"))?;
        Ok(len as usize)
    }

    fn insert(&self, mut statement: Statement) -> StoreResult<bool> {
        let key = statement.key();
        let txn = self.db.begin_write().map_err(redb_err("begin_write"))?;
        let inserted = {
            let mut table = txn
                .open_table(STATEMENTS_TABLE)
                .map_err(redb_err("open_table"))?;
            let exists = table
                .get(key.as_str())
                .map_err(redb_err("get"))?
                .is_some();
            if exists {
                false
            } else {
                statement.seq = table.len().map_err(redb_err("len"))?;
                let encoded =
                    bincode::serialize(&statement).map_err(|e| StoreError::Serialization {
                        message: format!("failed to serialize statement: {e}"),
                    })?;
                table
                    .insert(key.as_str(), encoded.as_slice())
                    .map_err(redb_err("insert"))?;
                true
            }
        };
        txn.commit().map_err(redb_err("commit"))?;
        Ok(inserted)
    }

    fn statements(&self) -> StoreResult<Vec<Statement>> {
        let txn = self.db.begin_read().map_err(redb_err("begin_read"))?;
        let table = txn
            .open_table(STATEMENTS_TABLE)
            .map_err(redb_err("open_table"))?;

        let mut all = Vec::new();
        for entry in table.iter().map_err(redb_err("iter"))? {
            let (_, value) = entry.map_err(redb_err("iter"))?;
            let statement: Statement =
                bincode::deserialize(value.value()).map_err(|e| StoreError::Serialization {
                    message: format!("failed to deserialize statement: {e}"),
                })?;
            all.push(statement);
        }
        all.sort_by_key(|s| s.seq);
        Ok(all)
    }
}

impl std::fmt::Debug for DurableStatementStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStatementStore").finish()
    }
}
