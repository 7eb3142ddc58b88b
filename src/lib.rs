//! Letterbox - password-protected letters shared by link
//!
//! A letter's subject and body are sealed with AES-256-GCM under a key
//! derived from the sender's password (PBKDF2-HMAC-SHA256). Only ciphertext,
//! nonces, the salt and the display names reach the record store.

#![forbid(unsafe_code)]

pub mod armor;
pub mod config;
pub mod error;
pub mod kdf;
pub mod letter;
pub mod letter_ops;
pub mod passphrase;
pub mod secretcrypt;
pub mod share;
pub mod store;
