//! Sending and reading letters
//!
//! These functions tie key derivation, sealing and the record store
//! together. One salt and one derived key cover both encrypted fields of a
//! letter, each field with its own nonce, so a single password entry unlocks
//! both or neither.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{ErrorCategory, ErrorKind, LetterboxError, Result};
use crate::kdf::{self, Salt};
use crate::letter::{Draft, Letter, LetterId, LetterUpdate, NewLetterRow, UnlockedLetter};
use crate::passphrase;
use crate::secretcrypt;
use crate::store::LetterStore;

/// Seal a draft under `password` and store it.
///
/// `confirmation` is the password typed a second time; the draft and the
/// password policy are checked before any cryptography runs.
pub fn send_letter(
    store: &dyn LetterStore,
    draft: &Draft,
    password: &str,
    confirmation: &str,
) -> Result<LetterId> {
    draft.validate()?;
    passphrase::validate_new_password(password, confirmation)?;

    let row = seal_draft(draft, password, Salt::generate())?;
    let id = store
        .insert(&row)
        .map_err(|e| e.with_context("failed to send letter"))?;

    info!(%id, "letter sent");
    Ok(id)
}

/// Seal both fields of a draft under one salt.
///
/// The salt is passed in rather than drawn here so the shared-salt
/// invariant is visible at the call site.
pub fn seal_draft(draft: &Draft, password: &str, salt: Salt) -> Result<NewLetterRow> {
    debug!("deriving letter key");
    let key = kdf::derive_key(password.as_bytes(), &salt);

    let body = secretcrypt::seal_fresh(&draft.body, &key)?;
    let subject = secretcrypt::seal_fresh(&draft.subject, &key)?;
    if subject.nonce == body.nonce {
        return Err(LetterboxError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::CipherFailure,
            "nonce collision between subject and body",
        ));
    }

    Ok(NewLetterRow::new(draft, &subject, &body, &salt))
}

/// Fetch and decode a letter without unlocking it.
pub fn fetch_letter(store: &dyn LetterStore, id: &LetterId) -> Result<Letter> {
    debug!(%id, "fetching letter");
    let row = store
        .get(id)
        .map_err(|e| e.with_context("failed to load letter"))?
        .ok_or_else(|| {
            LetterboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::NotFound,
                "letter not found",
            )
        })?;
    Letter::from_row(row)
}

/// Decrypt a fetched letter and record the first read.
///
/// A wrong password fails with `AuthenticationFailed` without saying which
/// field failed, and leaves `read_at` alone. Failing to record the read is
/// logged and otherwise ignored.
pub fn unlock_letter(
    store: &dyn LetterStore,
    letter: &Letter,
    password: &str,
) -> Result<UnlockedLetter> {
    if password.is_empty() {
        return Err(LetterboxError::validation("password must not be empty"));
    }

    debug!(id = %letter.id, "deriving letter key");
    let key = kdf::derive_key(password.as_bytes(), &letter.salt);
    let opened = secretcrypt::open(&letter.subject, &key)
        .and_then(|subject| Ok((subject, secretcrypt::open(&letter.body, &key)?)));
    let (subject, body) = opened.map_err(|e| {
        if e.is(ErrorKind::AuthenticationFailed) {
            LetterboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::AuthenticationFailed,
                "wrong password",
            )
        } else {
            e.with_context("failed to decrypt letter")
        }
    })?;

    let read_at = match letter.read_at {
        Some(read_at) => Some(read_at),
        None => record_first_read(store, letter),
    };

    Ok(UnlockedLetter {
        id: letter.id.clone(),
        sender_name: letter.sender_name.clone(),
        recipient_name: letter.recipient_name.clone(),
        subject,
        body,
        created_at: letter.created_at,
        read_at,
    })
}

/// Fetch a letter and unlock it in one go.
pub fn open_letter(store: &dyn LetterStore, id: &LetterId, password: &str) -> Result<UnlockedLetter> {
    let letter = fetch_letter(store, id)?;
    unlock_letter(store, &letter, password)
}

fn record_first_read(store: &dyn LetterStore, letter: &Letter) -> Option<DateTime<Utc>> {
    // A skewed local clock must not produce a read before the letter existed.
    let now = Utc::now().max(letter.created_at);
    match store.update(&letter.id, &LetterUpdate { read_at: Some(now) }) {
        Ok(()) => {
            info!(id = %letter.id, "letter opened for the first time");
            Some(now)
        }
        Err(e) => {
            warn!(id = %letter.id, error = %e, "failed to record read receipt");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn draft() -> Draft {
        Draft {
            sender_name: "Alice".to_string(),
            recipient_name: "Bob".to_string(),
            subject: "Hi".to_string(),
            body: "I love you".to_string(),
        }
    }

    #[test]
    fn test_seal_draft_shares_salt_not_nonce() {
        let salt = Salt::from_bytes([9u8; 16]);
        let row = seal_draft(&draft(), "secret6", salt).unwrap();

        assert_eq!(row.encryption_salt, salt.to_base64());
        assert_ne!(row.subject_iv, row.encryption_iv);
        assert_eq!(row.sender_name, "Alice");
        assert_eq!(row.recipient_name, "Bob");
    }

    #[test]
    fn test_sealed_fields_open_under_one_key() {
        let salt = Salt::from_bytes([9u8; 16]);
        let row = seal_draft(&draft(), "secret6", salt).unwrap();

        let key = kdf::derive_key(b"secret6", &Salt::from_base64(&row.encryption_salt).unwrap());
        let subject =
            secretcrypt::EncryptedBundle::from_base64(&row.encrypted_subject, &row.subject_iv)
                .unwrap();
        let body =
            secretcrypt::EncryptedBundle::from_base64(&row.encrypted_content, &row.encryption_iv)
                .unwrap();
        assert_eq!(secretcrypt::open(&subject, &key).unwrap(), "Hi");
        assert_eq!(secretcrypt::open(&body, &key).unwrap(), "I love you");
    }

    #[test]
    fn test_send_rejects_before_store() {
        let store = MemoryStore::new();

        let err = send_letter(&store, &draft(), "secre", "secre").expect_err("expected rejection");
        assert_eq!(err.kind, Some(ErrorKind::Validation));

        let mut blank = draft();
        blank.body.clear();
        let err = send_letter(&store, &blank, "secret6", "secret6").expect_err("expected rejection");
        assert_eq!(err.kind, Some(ErrorKind::Validation));

        assert!(store.is_empty());
    }

    #[test]
    fn test_fetch_missing_letter() {
        let store = MemoryStore::new();
        let id = LetterId::parse("does-not-exist").unwrap();

        let err = fetch_letter(&store, &id).expect_err("expected not found");
        assert_eq!(err.kind, Some(ErrorKind::NotFound));
        assert_eq!(err.message(), "letter not found");
    }

    #[test]
    fn test_unlock_requires_password() {
        let store = MemoryStore::new();
        let id = send_letter(&store, &draft(), "secret6", "secret6").unwrap();
        let letter = fetch_letter(&store, &id).unwrap();

        let err = unlock_letter(&store, &letter, "").expect_err("expected rejection");
        assert_eq!(err.kind, Some(ErrorKind::Validation));
    }

    #[test]
    fn test_wrong_password_does_not_name_field() {
        let store = MemoryStore::new();
        let id = send_letter(&store, &draft(), "secret6", "secret6").unwrap();

        let err = open_letter(&store, &id, "wrong12").expect_err("expected wrong password");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
        assert_eq!(err.message(), "wrong password");
        assert!(err.source_error().is_none());
        assert_eq!(store.get(&id).unwrap().unwrap().read_at, None);
    }
}
