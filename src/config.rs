//! Remote store configuration.
//!
//! The library never reads the environment; the binary collects these
//! values from flags or `LETTERBOX_*` variables and hands them over.

use std::fmt;
use std::time::Duration;

use crate::error::{ErrorCategory, ErrorKind, LetterboxError, Result};

/// Default request timeout for the remote store.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the remote record store lives and how to authenticate to it.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Base URL of the store, without a trailing slash.
    /// Env: `LETTERBOX_ENDPOINT`
    pub endpoint: String,

    /// Token sent as both `apikey` and bearer credential.
    /// Env: `LETTERBOX_ACCESS_TOKEN`
    pub access_token: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl StoreConfig {
    pub fn new(endpoint: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        let access_token = access_token.into();

        let endpoint = endpoint.trim().trim_end_matches('/').to_string();
        let has_host = endpoint
            .strip_prefix("https://")
            .or_else(|| endpoint.strip_prefix("http://"))
            .is_some_and(|rest| !rest.is_empty());
        if !has_host {
            return Err(LetterboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::Config,
                format!("store endpoint must be an http(s) URL, got {:?}", endpoint),
            ));
        }
        if access_token.trim().is_empty() {
            return Err(LetterboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::Config,
                "store access token must not be empty",
            ));
        }

        Ok(Self {
            endpoint,
            access_token,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("endpoint", &self.endpoint)
            .field("access_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = StoreConfig::new("https://example.supabase.co/", "anon-key").unwrap();
        assert_eq!(config.endpoint, "https://example.supabase.co");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        for endpoint in ["", "example.com", "ftp://example.com", "https://"] {
            let err = StoreConfig::new(endpoint, "anon-key").expect_err("expected config error");
            assert_eq!(err.kind, Some(ErrorKind::Config));
        }
    }

    #[test]
    fn test_rejects_empty_token() {
        let err = StoreConfig::new("http://localhost:54321", " ").expect_err("expected config error");
        assert_eq!(err.kind, Some(ErrorKind::Config));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = StoreConfig::new("http://localhost:54321", "super-secret-token").unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("localhost:54321"));
    }
}
