//! Record stores holding letters
//!
//! The core only needs three operations from a store: insert a row and learn
//! its id, fetch a row by id, and apply a partial update. Backends:
//! - [`MemoryStore`]: process-local, for tests and embedding
//! - [`FileStore`]: one JSON file per letter in a directory
//! - [`RestStore`]: a PostgREST-style HTTP endpoint

mod file;
mod memory;
mod rest;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use rest::RestStore;

use crate::error::{ErrorCategory, ErrorKind, LetterboxError, Result};
use crate::letter::{LetterId, LetterRow, LetterUpdate, NewLetterRow};

/// Storage interface for letters.
///
/// Implementations assign ids and `created_at` on insert. None of the
/// operations are retried here; transport failures surface as
/// `StoreUnavailable` errors and retrying is left to the user.
pub trait LetterStore: Send + Sync {
    /// Insert a new letter, returning its assigned id.
    fn insert(&self, row: &NewLetterRow) -> Result<LetterId>;

    /// Fetch a letter by id. `Ok(None)` means no such letter.
    fn get(&self, id: &LetterId) -> Result<Option<LetterRow>>;

    /// Apply a partial update. Updating a missing letter is a `NotFound`
    /// error.
    fn update(&self, id: &LetterId, update: &LetterUpdate) -> Result<()>;
}

pub(crate) fn not_found(id: &LetterId) -> LetterboxError {
    LetterboxError::with_kind(
        ErrorCategory::User,
        ErrorKind::NotFound,
        format!("letter {} not found", id),
    )
}
