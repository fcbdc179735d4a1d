//! In-memory statement store backed by DashMap.
//!
//! Used by tests and by `--ephemeral` sessions. All data is lost on exit.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{Statement, StatementStore, StoreResult};

/// Concurrent in-memory store using a sharded hashmap.
#[derive(Debug, Default)]
pub struct MemStatementStore {
    data: DashMap<String, Statement>,
    next_seq: AtomicU64,
}

impl MemStatementStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatementStore for MemStatementStore {
    fn count(&self) -> StoreResult<usize> {
        Ok(self.data.len())
    }

    fn insert(&self, mut statement: Statement) -> StoreResult<bool> {
        match self.data.entry(statement.key()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                statement.seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                slot.insert(statement);
                Ok(true)
            }
        }
    }

    fn statements(&self) -> StoreResult<Vec<Statement>> {
        let mut all: Vec<Statement> = self.data.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|s| s.seq);
        Ok(all)
    }
}
