use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// In particular this means that use of Internal is never a guarantee
    /// the error is not, for example due to a user error - merely that it
    /// cannot be confidently determined by the code.
    Internal,

    /// The user provided invalid input (including a wrong password) or
    /// asked for something that does not exist.
    User,

    /// The record store could not be reached or did not answer properly.
    /// Retrying the same action later may succeed.
    Transient,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A stored or transmitted value is not valid standard base64.
    EncodingInvalid,
    /// A decoded salt or nonce does not have its required length.
    FieldLength,
    /// Ciphertext is too short to even hold an authentication tag.
    BinaryFormat,
    /// Authentication failed due to a wrong password, tampering or
    /// corruption.
    AuthenticationFailed,
    /// Authenticated plaintext was not valid UTF-8 text.
    PlaintextEncoding,
    /// AES-GCM refused to seal the data.
    CipherFailure,
    /// Caller-side input checks rejected the request before any
    /// cryptography ran.
    Validation,
    /// No letter exists under the requested id.
    NotFound,
    /// The record store failed to complete a request.
    StoreUnavailable,
    /// The record store answered with something we could not interpret.
    StoreResponse,
    /// A share link did not carry a usable letter id.
    InvalidLink,
    /// Store configuration is incomplete or malformed.
    Config,
    /// Password could not be obtained from the configured reader.
    PassphraseUnavailable,
    /// Interaction with the filesystem, stdin/stdout, or other I/O failed.
    Io,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct LetterboxError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag for consumers that need to
    /// branch their behavior. Any code consuming errors MUST handle
    /// the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl LetterboxError {
    /// Creates a new error with a required category and display message.
    pub fn new(category: ErrorCategory, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: None,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that retains the originating source error.
    pub fn with_source(
        category: ErrorCategory,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: None,
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// Shorthand for a `User`/`Validation` error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorCategory::User, ErrorKind::Validation, msg)
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// True when the error is tagged with `kind`.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == Some(kind)
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, LetterboxError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_with_context_keeps_category_and_kind() {
        let inner = LetterboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::AuthenticationFailed,
            "wrong password",
        );
        let outer = inner.with_context("failed to unlock letter");

        assert_eq!(outer.category, ErrorCategory::User);
        assert!(outer.is(ErrorKind::AuthenticationFailed));
        assert_eq!(outer.message(), "failed to unlock letter");
        assert_eq!(
            outer.source_error().map(|e| e.to_string()),
            Some("wrong password".to_string())
        );
    }

    #[test]
    fn test_source_is_exposed_through_std_error() {
        let err = LetterboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to read letter",
            io::Error::other("disk on fire"),
        );

        let source = StdError::source(&err).expect("expected a source");
        assert_eq!(source.to_string(), "disk on fire");
        assert_eq!(err.to_string(), "failed to read letter");
    }

    #[test]
    fn test_plain_error_has_no_kind() {
        let err = LetterboxError::new(ErrorCategory::Internal, "oops");
        assert_eq!(err.kind, None);
        assert!(err.source_error().is_none());
    }
}
