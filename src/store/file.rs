//! Directory-backed letter store
//!
//! Each letter lives in `<dir>/<id>.json`. Every write goes through a
//! tempfile in the same directory that is fsynced and then renamed over the
//! target, so a reader sees either the old row or the new row, never a
//! partial one. Files are created with mode 0o600 on Unix systems.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::{LetterStore, not_found};
use crate::error::{ErrorCategory, ErrorKind, LetterboxError, Result};
use crate::letter::{LetterId, LetterRow, LetterUpdate, NewLetterRow};

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            LetterboxError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("failed to create store directory {}", dir.display()),
                e,
            )
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &LetterId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn read_row(&self, id: &LetterId) -> Result<Option<LetterRow>> {
        let path = self.path_for(id);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(read_error(&path, e)),
        };
        let row = serde_json::from_slice(&data).map_err(|e| {
            LetterboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::StoreResponse,
                format!("failed to parse {}", path.display()),
                e,
            )
        })?;
        Ok(Some(row))
    }

    /// Write `row` atomically. With `replace` false an existing file is an
    /// error rather than being overwritten.
    fn write_row(&self, row: &LetterRow, replace: bool) -> Result<()> {
        let path = self.path_for(&row.id);
        let json = serde_json::to_vec_pretty(row).map_err(|e| {
            LetterboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::StoreResponse,
                "failed to serialize letter",
                e,
            )
        })?;

        let mut temp_file = tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| {
            LetterboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to create tempfile",
                e,
            )
        })?;
        temp_file.write_all(&json).map_err(|e| {
            LetterboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to write to tempfile",
                e,
            )
        })?;
        // Flush and fsync() such that the rename later, if it succeeds, will
        // always point to a valid file.
        temp_file.flush().map_err(|e| {
            LetterboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to flush tempfile",
                e,
            )
        })?;
        temp_file.as_file().sync_all().map_err(|e| {
            LetterboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to sync file prior to rename",
                e,
            )
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp_file
                .as_file()
                .set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| {
                    LetterboxError::with_kind_and_source(
                        ErrorCategory::Internal,
                        ErrorKind::Io,
                        "failed to set tempfile permissions",
                        e,
                    )
                })?;
        }

        let persisted = if replace {
            temp_file.persist(&path).map(|_| ())
        } else {
            temp_file.persist_noclobber(&path).map(|_| ())
        };
        persisted.map_err(|e| {
            LetterboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to rename to target file {}", path.display()),
                e,
            )
        })?;
        debug!(path = %path.display(), "wrote letter file");
        Ok(())
    }
}

impl LetterStore for FileStore {
    fn insert(&self, row: &NewLetterRow) -> Result<LetterId> {
        let id = LetterId::parse(Uuid::new_v4().to_string())?;
        let stored = LetterRow::from_new(id.clone(), row.clone(), Utc::now());
        self.write_row(&stored, false)?;
        Ok(id)
    }

    fn get(&self, id: &LetterId) -> Result<Option<LetterRow>> {
        self.read_row(id)
    }

    fn update(&self, id: &LetterId, update: &LetterUpdate) -> Result<()> {
        let mut row = self.read_row(id)?.ok_or_else(|| not_found(id))?;
        row.apply(update);
        self.write_row(&row, true)
    }
}

fn read_error(path: &Path, err: io::Error) -> LetterboxError {
    let category = if err.kind() == io::ErrorKind::PermissionDenied {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    LetterboxError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;

    fn new_row() -> NewLetterRow {
        NewLetterRow {
            sender_name: "Alice".to_string(),
            recipient_name: "Bob".to_string(),
            encrypted_subject: "c3Vi".to_string(),
            encrypted_content: "Ym9keQ==".to_string(),
            subject_iv: "AAAAAAAAAAAAAAAA".to_string(),
            encryption_iv: "AQEBAQEBAQEBAQEB".to_string(),
            encryption_salt: "AAAAAAAAAAAAAAAAAAAAAA==".to_string(),
        }
    }

    #[test]
    fn test_insert_get_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();

        let id = store.insert(&new_row()).unwrap();
        assert!(temp_dir.path().join(format!("{}.json", id)).exists());

        let row = store.get(&id).unwrap().expect("row should exist");
        assert_eq!(row.id, id);
        assert_eq!(row.sender_name, "Alice");
        assert_eq!(row.encrypted_content, "Ym9keQ==");
    }

    #[test]
    fn test_rows_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let id = FileStore::open(temp_dir.path())
            .unwrap()
            .insert(&new_row())
            .unwrap();

        let reopened = FileStore::open(temp_dir.path()).unwrap();
        assert!(reopened.get(&id).unwrap().is_some());
    }

    #[test]
    fn test_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let store = FileStore::open(&nested).unwrap();
        store.insert(&new_row()).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_get_missing_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();
        let id = LetterId::parse("missing").unwrap();
        assert_eq!(store.get(&id).unwrap(), None);
    }

    #[test]
    fn test_update_read_at() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();
        let id = store.insert(&new_row()).unwrap();

        let now = Utc::now();
        store
            .update(&id, &LetterUpdate { read_at: Some(now) })
            .unwrap();

        let row = store.get(&id).unwrap().unwrap();
        assert_eq!(row.read_at, Some(now));
        assert_eq!(row.sender_name, "Alice");
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();
        let id = LetterId::parse("missing").unwrap();

        let err = store
            .update(&id, &LetterUpdate { read_at: Some(Utc::now()) })
            .expect_err("expected not found");
        assert_eq!(err.kind, Some(ErrorKind::NotFound));
        assert!(!temp_dir.path().join("missing.json").exists());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();
        fs::write(temp_dir.path().join("broken.json"), b"{not json").unwrap();

        let id = LetterId::parse("broken").unwrap();
        let err = store.get(&id).expect_err("expected parse error");
        assert_eq!(err.kind, Some(ErrorKind::StoreResponse));
    }

    #[test]
    #[cfg(unix)]
    fn test_file_permissions() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();
        let id = store.insert(&new_row()).unwrap();

        let metadata = fs::metadata(temp_dir.path().join(format!("{}.json", id))).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
    }
}
