//! PostgREST-style remote store (e.g. a hosted Postgres with a REST
//! gateway). The `letters` table lives at `<endpoint>/rest/v1/letters`.

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use tracing::debug;

use super::{LetterStore, not_found};
use crate::config::StoreConfig;
use crate::error::{ErrorCategory, ErrorKind, LetterboxError, Result};
use crate::letter::{LetterId, LetterRow, LetterUpdate, NewLetterRow};

const TABLE_PATH: &str = "/rest/v1/letters";

pub struct RestStore {
    config: StoreConfig,
    client: Client,
}

impl RestStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                LetterboxError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Config,
                    "failed to build HTTP client",
                    e,
                )
            })?;
        Ok(Self { config, client })
    }

    pub fn table_url(&self) -> String {
        format!("{}{}", self.config.endpoint, TABLE_PATH)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.access_token)
            .bearer_auth(&self.config.access_token)
    }

    fn send(&self, op: &str, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().map_err(|e| {
            LetterboxError::with_kind_and_source(
                ErrorCategory::Transient,
                ErrorKind::StoreUnavailable,
                format!("{} failed: could not reach letter store", op),
                e,
            )
        })?;

        let status = response.status();
        debug!(op, %status, "letter store responded");
        if !status.is_success() {
            return Err(status_error(op, status));
        }
        Ok(response)
    }

    fn rows(&self, op: &str, response: Response) -> Result<Vec<LetterRow>> {
        response.json::<Vec<LetterRow>>().map_err(|e| {
            LetterboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::StoreResponse,
                format!("{} failed: unexpected response from letter store", op),
                e,
            )
        })
    }
}

impl LetterStore for RestStore {
    fn insert(&self, row: &NewLetterRow) -> Result<LetterId> {
        let request = self
            .authorized(self.client.post(self.table_url()))
            .header("Prefer", "return=representation")
            .json(row);
        let response = self.send("insert", request)?;
        let inserted = self.rows("insert", response)?;

        inserted.into_iter().next().map(|r| r.id).ok_or_else(|| {
            LetterboxError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::StoreResponse,
                "insert failed: letter store returned no row",
            )
        })
    }

    fn get(&self, id: &LetterId) -> Result<Option<LetterRow>> {
        let request = self
            .authorized(self.client.get(self.table_url()))
            .query(&[("id", format!("eq.{}", id)), ("select", "*".to_string())]);
        let response = self.send("fetch", request)?;
        Ok(self.rows("fetch", response)?.into_iter().next())
    }

    fn update(&self, id: &LetterId, update: &LetterUpdate) -> Result<()> {
        let request = self
            .authorized(self.client.patch(self.table_url()))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(update);
        let response = self.send("update", request)?;
        if self.rows("update", response)?.is_empty() {
            return Err(not_found(id));
        }
        Ok(())
    }
}

fn status_error(op: &str, status: StatusCode) -> LetterboxError {
    let category = if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        ErrorCategory::Transient
    } else {
        ErrorCategory::Internal
    };
    LetterboxError::with_kind(
        category,
        ErrorKind::StoreUnavailable,
        format!("{} failed: letter store answered {}", op, status),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn store(endpoint: &str) -> RestStore {
        let config = StoreConfig::new(endpoint, "anon-key")
            .unwrap()
            .with_timeout(Duration::from_secs(2));
        RestStore::new(config).unwrap()
    }

    #[test]
    fn test_table_url() {
        let store = store("https://example.supabase.co/");
        assert_eq!(store.table_url(), "https://example.supabase.co/rest/v1/letters");
    }

    #[test]
    fn test_unreachable_store_is_transient() {
        // Nothing listens on the discard port in test environments.
        let store = store("http://127.0.0.1:9");
        let id = LetterId::parse("abc").unwrap();

        let err = store.get(&id).expect_err("expected connection failure");
        assert_eq!(err.kind, Some(ErrorKind::StoreUnavailable));
        assert_eq!(err.category, ErrorCategory::Transient);
        assert!(err.message().starts_with("fetch failed"));
    }

    #[test]
    fn test_status_error_categories() {
        let err = status_error("insert", StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.category, ErrorCategory::Transient);
        assert_eq!(err.message(), "insert failed: letter store answered 503 Service Unavailable");

        let err = status_error("fetch", StatusCode::UNAUTHORIZED);
        assert_eq!(err.category, ErrorCategory::Internal);
        assert_eq!(err.kind, Some(ErrorKind::StoreUnavailable));
    }
}
