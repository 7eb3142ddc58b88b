//! Password reading and the password policy for new letters

use crate::error::{ErrorCategory, ErrorKind, LetterboxError, Result};
use std::io::{self, IsTerminal, Read, Write};
use zeroize::Zeroizing;

/// Minimum password length, in characters, for sealing a new letter.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Check a new letter's password before any cryptography runs.
///
/// Unlocking only requires a non-empty password; the policy applies when
/// sealing, where a typo would otherwise lock the recipient out.
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<()> {
    if password.is_empty() {
        return Err(LetterboxError::validation("password must not be empty"));
    }
    if password != confirmation {
        return Err(LetterboxError::validation("passwords do not match"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(LetterboxError::validation(format!(
            "password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Trait for reading passwords from various sources
pub trait PassphraseReader {
    /// Read a password as text.
    ///
    /// Returns the password wrapped in `Zeroizing` to ensure it is securely
    /// wiped from memory when dropped.
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>>;
}

/// Returns a fixed password (for testing)
pub struct ConstantPassphraseReader {
    passphrase: Zeroizing<String>,
}

impl ConstantPassphraseReader {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.into()),
        }
    }
}

impl PassphraseReader for ConstantPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        Ok(Zeroizing::new((*self.passphrase).clone()))
    }
}

/// Reads a password from any io::Read source.
///
/// The whole input is the password, minus one trailing line ending so that
/// `echo secret6 | letterbox ...` behaves as expected.
pub struct ReaderPassphraseReader {
    reader: Box<dyn Read>,
}

impl ReaderPassphraseReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl PassphraseReader for ReaderPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            LetterboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("error reading password: {}", e),
                e,
            )
        })?;

        let text = std::str::from_utf8(&data).map_err(|e| {
            LetterboxError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "password is not valid UTF-8",
                e,
            )
        })?;
        let text = text
            .strip_suffix('\n')
            .map(|t| t.strip_suffix('\r').unwrap_or(t))
            .unwrap_or(text);

        Ok(Zeroizing::new(text.to_owned()))
    }
}

/// Reads a password from the terminal with no echo
pub struct TerminalPassphraseReader {
    prompt: String,
}

impl TerminalPassphraseReader {
    pub fn new() -> Self {
        Self::with_prompt("Password: ")
    }

    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

impl Default for TerminalPassphraseReader {
    fn default() -> Self {
        Self::new()
    }
}

impl PassphraseReader for TerminalPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        if !io::stdin().is_terminal() {
            return Err(LetterboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "cannot read password from terminal - stdin is not a terminal",
            ));
        }

        io::stderr().write_all(self.prompt.as_bytes()).map_err(|e| {
            LetterboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to write prompt: {}", e),
                e,
            )
        })?;
        io::stderr().flush().map_err(|e| {
            LetterboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to flush prompt: {}", e),
                e,
            )
        })?;

        // Read password *without echo*
        let passphrase = rpassword::read_password().map_err(|e| {
            LetterboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("failure reading password: {}", e),
                e,
            )
        })?;

        Ok(Zeroizing::new(passphrase))
    }
}

/// Wraps another PassphraseReader and caches the result
///
/// Provides "at most once" semantics - the upstream reader is called
/// only on the first successful invocation, and subsequent calls return the
/// cached value. The cached password is wiped when this reader is dropped.
pub struct CachingPassphraseReader {
    upstream: Box<dyn PassphraseReader>,
    cached: Option<Zeroizing<String>>,
}

impl CachingPassphraseReader {
    pub fn new(upstream: Box<dyn PassphraseReader>) -> Self {
        Self {
            upstream,
            cached: None,
        }
    }
}

impl PassphraseReader for CachingPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        if let Some(cached) = &self.cached {
            return Ok(cached.clone());
        }
        let passphrase = self.upstream.read_passphrase()?;
        self.cached = Some(passphrase.clone());
        Ok(passphrase)
    }
}
