use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use super::{LetterStore, not_found};
use crate::error::{ErrorCategory, ErrorKind, LetterboxError, Result};
use crate::letter::{LetterId, LetterRow, LetterUpdate, NewLetterRow};

/// Keeps letters in a map for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<LetterId, LetterRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<LetterId, LetterRow>>> {
        self.rows.lock().map_err(|_| {
            LetterboxError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::StoreUnavailable,
                "memory store lock poisoned",
            )
        })
    }
}

impl LetterStore for MemoryStore {
    fn insert(&self, row: &NewLetterRow) -> Result<LetterId> {
        let id = LetterId::parse(Uuid::new_v4().to_string())?;
        let stored = LetterRow::from_new(id.clone(), row.clone(), Utc::now());
        self.lock()?.insert(id.clone(), stored);
        Ok(id)
    }

    fn get(&self, id: &LetterId) -> Result<Option<LetterRow>> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn update(&self, id: &LetterId, update: &LetterUpdate) -> Result<()> {
        let mut rows = self.lock()?;
        let row = rows.get_mut(id).ok_or_else(|| not_found(id))?;
        row.apply(update);
        Ok(())
    }
}
