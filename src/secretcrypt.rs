//! Authenticated encryption of letter fields using AES-256-GCM
//!
//! Each call to [`seal`] turns one piece of text into an [`EncryptedBundle`]:
//! - nonce: 12 bytes, fresh per call
//! - ciphertext: UTF-8 plaintext encrypted in place, followed by the
//!   16-byte GCM authentication tag
//!
//! No associated data is bound. The key comes from [`crate::kdf`]; this
//! module never sees passwords or salts.

use std::fmt;

use aes_gcm::Nonce as GcmNonce;
use aes_gcm::aead::Aead;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::armor;
use crate::error::{ErrorCategory, ErrorKind, LetterboxError, Result};
use crate::kdf::DerivedKey;

/// Length of nonce in bytes
pub const NONCE_LEN: usize = 12;

/// Length of the GCM authentication tag appended to every ciphertext
pub const TAG_LEN: usize = 16;

/// A value used once per key to randomize an encryption.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Nonce([u8; NONCE_LEN]);

impl Nonce {
    /// Draw a fresh nonce from the operating system RNG.
    pub fn generate() -> Self {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        Self(nonce)
    }

    pub fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        armor::wrap(&self.0)
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        armor::unwrap_exact::<NONCE_LEN>("nonce", encoded).map(Self)
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({})", self.to_base64())
    }
}

/// Ciphertext (tag included) plus the nonce it was sealed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBundle {
    pub ciphertext: Vec<u8>,
    pub nonce: Nonce,
}

impl EncryptedBundle {
    /// Rebuild a bundle from its stored base64 columns.
    pub fn from_base64(ciphertext: &str, nonce: &str) -> Result<Self> {
        Ok(Self {
            ciphertext: armor::unwrap("ciphertext", ciphertext)?,
            nonce: Nonce::from_base64(nonce)?,
        })
    }

    pub fn ciphertext_base64(&self) -> String {
        armor::wrap(&self.ciphertext)
    }

    pub fn nonce_base64(&self) -> String {
        self.nonce.to_base64()
    }
}

/// Seal text under `key` with a freshly drawn nonce.
pub fn seal_fresh(plaintext: &str, key: &DerivedKey) -> Result<EncryptedBundle> {
    seal(plaintext, key, Nonce::generate())
}

/// Seal text under `key` and the given nonce.
///
/// The caller is responsible for never reusing `nonce` with the same key;
/// outside of test vectors, use [`seal_fresh`].
pub fn seal(plaintext: &str, key: &DerivedKey, nonce: Nonce) -> Result<EncryptedBundle> {
    let cipher = key.cipher();
    let ciphertext = cipher
        .encrypt(GcmNonce::from_slice(nonce.as_bytes()), plaintext.as_bytes())
        .map_err(|_| {
            LetterboxError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::CipherFailure,
                "encryption failed",
            )
        })?;

    Ok(EncryptedBundle { ciphertext, nonce })
}

/// Open a bundle, returning the verified plaintext.
///
/// A tag mismatch (which is what a wrong password looks like) yields an
/// `AuthenticationFailed` error and no output at all.
pub fn open(bundle: &EncryptedBundle, key: &DerivedKey) -> Result<String> {
    if bundle.ciphertext.len() < TAG_LEN {
        return Err(LetterboxError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::BinaryFormat,
            "ciphertext shorter than authentication tag; likely truncated",
        ));
    }

    let cipher = key.cipher();
    let plaintext = cipher
        .decrypt(
            GcmNonce::from_slice(bundle.nonce.as_bytes()),
            bundle.ciphertext.as_slice(),
        )
        .map_err(|_| {
            LetterboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::AuthenticationFailed,
                "wrong password (or tampered-with data)",
            )
        })?;

    String::from_utf8(plaintext).map_err(|e| {
        LetterboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::PlaintextEncoding,
            "decrypted text is not valid UTF-8",
            e,
        )
    })
}
