//! Text-safe encoding for binary values
//!
//! Every binary value a letter carries (salt, nonces, ciphertexts) is stored
//! and transmitted as standard base64 with padding, the same alphabet a
//! browser's `btoa` produces. Share links never embed these values, so the
//! URL-safe alphabet is not needed.

use crate::error::{ErrorCategory, ErrorKind, LetterboxError, Result};
use base64::{Engine, engine::general_purpose::STANDARD};

/// Encode bytes as standard base64.
pub fn wrap(body: &[u8]) -> String {
    STANDARD.encode(body)
}

/// Decode a standard base64 string.
///
/// `field` names the value in error messages (e.g. "salt").
pub fn unwrap(field: &str, encoded: &str) -> Result<Vec<u8>> {
    STANDARD.decode(encoded).map_err(|e| {
        LetterboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::EncodingInvalid,
            format!("{} is not valid base64: {}", field, e),
            e,
        )
    })
}

/// Decode a standard base64 string that must hold exactly `N` bytes.
pub fn unwrap_exact<const N: usize>(field: &str, encoded: &str) -> Result<[u8; N]> {
    let body = unwrap(field, encoded)?;
    let len = body.len();
    body.try_into().map_err(|_| {
        LetterboxError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::FieldLength,
            format!("{} must decode to {} bytes, got {}", field, N, len),
        )
    })
}
