//! Letter shapes: the compose-form draft, the decoded letter, and the rows
//! exchanged with a record store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCategory, ErrorKind, LetterboxError, Result};
use crate::kdf::Salt;
use crate::secretcrypt::EncryptedBundle;

/// Store-assigned identifier of a letter, carried in the share link fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LetterId(String);

impl LetterId {
    /// Accept an id if it can be placed in a URL fragment as-is.
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(LetterboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidLink,
                "letter id must not be empty",
            ));
        }
        if id
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '#' | '?'))
        {
            return Err(LetterboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidLink,
                format!("invalid letter id: {:?}", id),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LetterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LetterId {
    type Error = LetterboxError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<LetterId> for String {
    fn from(id: LetterId) -> Self {
        id.0
    }
}

/// What the sender fills in before choosing a password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub sender_name: String,
    pub recipient_name: String,
    pub subject: String,
    pub body: String,
}

impl Draft {
    /// Reject drafts with any blank field.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("sender name", &self.sender_name),
            ("recipient name", &self.recipient_name),
            ("subject", &self.subject),
            ("body", &self.body),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(LetterboxError::validation(format!(
                    "{} must not be empty",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// A stored letter with its binary fields decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Letter {
    pub id: LetterId,
    pub sender_name: String,
    pub recipient_name: String,
    pub subject: EncryptedBundle,
    pub body: EncryptedBundle,
    /// Shared by `subject` and `body`.
    pub salt: Salt,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    /// Carried for the store; nothing enforces it.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Letter {
    pub fn from_row(row: LetterRow) -> Result<Self> {
        let decode = || -> Result<Self> {
            Ok(Self {
                subject: EncryptedBundle::from_base64(&row.encrypted_subject, &row.subject_iv)?,
                body: EncryptedBundle::from_base64(&row.encrypted_content, &row.encryption_iv)?,
                salt: Salt::from_base64(&row.encryption_salt)?,
                id: row.id.clone(),
                sender_name: row.sender_name.clone(),
                recipient_name: row.recipient_name.clone(),
                created_at: row.created_at,
                read_at: row.read_at,
                expires_at: row.expires_at,
            })
        };
        decode().map_err(|e| e.with_context(format!("letter {} is corrupt", row.id)))
    }

    /// The part of a letter visible before it is unlocked.
    pub fn summary(&self) -> LetterSummary {
        LetterSummary {
            id: self.id.clone(),
            sender_name: self.sender_name.clone(),
            recipient_name: self.recipient_name.clone(),
            created_at: self.created_at,
            read_at: self.read_at,
        }
    }
}

/// Locked view of a letter: who it is from and to, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterSummary {
    pub id: LetterId,
    pub sender_name: String,
    pub recipient_name: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// A letter after a successful unlock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockedLetter {
    pub id: LetterId,
    pub sender_name: String,
    pub recipient_name: String,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    /// `None` only if this was the first read and recording it failed.
    pub read_at: Option<DateTime<Utc>>,
}

/// A full row of the `letters` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterRow {
    pub id: LetterId,
    pub sender_name: String,
    pub recipient_name: String,
    pub encrypted_subject: String,
    pub encrypted_content: String,
    pub subject_iv: String,
    pub encryption_iv: String,
    pub encryption_salt: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl LetterRow {
    /// Materialize an inserted row; used by stores that assign ids locally.
    pub fn from_new(id: LetterId, new: NewLetterRow, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            sender_name: new.sender_name,
            recipient_name: new.recipient_name,
            encrypted_subject: new.encrypted_subject,
            encrypted_content: new.encrypted_content,
            subject_iv: new.subject_iv,
            encryption_iv: new.encryption_iv,
            encryption_salt: new.encryption_salt,
            created_at,
            read_at: None,
            expires_at: None,
        }
    }

    pub fn apply(&mut self, update: &LetterUpdate) {
        if let Some(read_at) = update.read_at {
            self.read_at = Some(read_at);
        }
    }
}

/// The columns a sender supplies; the store assigns the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLetterRow {
    pub sender_name: String,
    pub recipient_name: String,
    pub encrypted_subject: String,
    pub encrypted_content: String,
    pub subject_iv: String,
    pub encryption_iv: String,
    pub encryption_salt: String,
}

impl NewLetterRow {
    pub fn new(draft: &Draft, subject: &EncryptedBundle, body: &EncryptedBundle, salt: &Salt) -> Self {
        Self {
            sender_name: draft.sender_name.clone(),
            recipient_name: draft.recipient_name.clone(),
            encrypted_subject: subject.ciphertext_base64(),
            encrypted_content: body.ciphertext_base64(),
            subject_iv: subject.nonce_base64(),
            encryption_iv: body.nonce_base64(),
            encryption_salt: salt.to_base64(),
        }
    }
}

/// Partial row for `update`; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}
