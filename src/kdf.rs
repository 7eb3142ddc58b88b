//! Password-based key derivation
//!
//! Turns a password and a per-letter salt into an AES-256-GCM key using
//! PBKDF2 with HMAC-SHA256. The iteration count makes every password guess
//! expensive; it is fixed because stored letters carry no KDF parameters.

use std::fmt;

use aes_gcm::{Aes256Gcm, Key, KeyInit};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::armor;
use crate::error::Result;

/// Length of salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of derived key in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// PBKDF2 iteration count
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Random value mixed into key derivation, shared by both fields of a letter.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Draw a fresh salt from the operating system RNG.
    pub fn generate() -> Self {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        Self(salt)
    }

    pub fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        armor::wrap(&self.0)
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        armor::unwrap_exact::<SALT_LEN>("salt", encoded).map(Self)
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({})", self.to_base64())
    }
}

/// A key derived from a password. The raw bytes never leave this crate and
/// are wiped on drop; the only thing a key can do is seal and open bundles.
pub struct DerivedKey {
    bytes: Zeroizing<[u8; KEY_LEN]>,
}

impl DerivedKey {
    pub(crate) fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.bytes.as_slice()))
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

/// Derive a 32-byte key from a password and salt using PBKDF2-HMAC-SHA256.
///
/// Derivation never fails and never judges the password; a wrong password
/// only shows up later, when opening a bundle fails authentication.
pub fn derive_key(password: &[u8], salt: &Salt) -> DerivedKey {
    let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(password, salt.as_bytes(), PBKDF2_ITERATIONS, bytes.as_mut_slice());
    DerivedKey { bytes }
}
