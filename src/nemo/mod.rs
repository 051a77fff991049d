// This file is part of bin-lookup. Copyright © 2026 bin-lookup contributors.
// bin-lookup is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

//! NEMO API client: token-authenticated, paginated collection fetches.
//!
//! A fetch walks `next` cursors until the collection is exhausted. If the
//! upstream dies mid-walk we hand back whatever was collected together with the
//! error, so a degraded cache always beats no cache.

mod dto;
pub mod error;

pub use dto::{BinRecord, CustomerField, CustomerObject, Page, UserRecord};

use crate::config::Config;
use error::NemoError;
use reqwest::header;
use serde_json::Value;
use std::future::Future;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// The result of walking one paginated collection.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Raw records, in upstream order. Individual records are left untyped here
    /// so one malformed record cannot poison a whole page; the indexer sorts
    /// the good from the bad.
    pub records: Vec<Value>,
    /// Set when pagination stopped early on a transport/HTTP error. The records
    /// collected before the failure are still present above.
    pub error: Option<NemoError>,
}

impl FetchOutcome {
    /// A walk that reached the end of the collection
    pub fn complete(records: Vec<Value>) -> Self {
        Self {
            records,
            error: None,
        }
    }

    /// A walk cut short by an upstream error
    pub fn degraded(records: Vec<Value>, error: NemoError) -> Self {
        Self {
            records,
            error: Some(error),
        }
    }

    /// Split into usable records plus an optional degradation to log. Zero
    /// records combined with a fetch-level error is a total failure: there is
    /// nothing worth replacing a previous cache with.
    pub fn into_usable(self) -> Result<(Vec<Value>, Option<NemoError>), NemoError> {
        match self.error {
            Some(error) if self.records.is_empty() => Err(error),
            error => Ok((self.records, error)),
        }
    }
}

/// Seam between the cache manager and the upstream API. Production code uses
/// [`NemoClient`]; tests substitute fixture sources.
pub trait RecordSource {
    fn fetch_users(&self) -> impl Future<Output = FetchOutcome> + Send;
    fn fetch_bins(&self) -> impl Future<Output = FetchOutcome> + Send;
}

pub struct NemoClient {
    http: reqwest::Client,
    user_url: String,
    bin_url: String,
}

impl NemoClient {
    /// Build a client with the token header baked in and the configured
    /// per-request timeout (or none at all, if so configured).
    pub fn new(config: &Config) -> Result<Self, NemoError> {
        let mut api_key = header::HeaderValue::try_from(format!("Token {}", config.api_key))
            .map_err(|_| NemoError::InvalidApiKey)?;
        api_key.set_sensitive(true);
        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, api_key);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .gzip(true)
            .default_headers(headers);
        if let Some(timeout) = config.api_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(NemoError::ClientBuild)?;
        Ok(Self {
            http,
            user_url: config.user_url.clone(),
            bin_url: config.bin_url.clone(),
        })
    }

    /// Fetch an entire collection, following `next` cursors until exhausted.
    ///
    /// An unrecognized response shape (neither a bare array nor a results
    /// envelope) ends the walk cleanly with whatever has been accumulated; a
    /// transport or HTTP error ends it with a degraded outcome.
    async fn fetch_all(&self, collection: &'static str, start_url: &str) -> FetchOutcome {
        debug!("fetching {collection} records from {start_url}");
        let mut records: Vec<Value> = Vec::new();
        let mut next_url = Some(start_url.to_string());
        while let Some(url) = next_url {
            let response = match self.http.get(&url).send().await {
                Ok(response) => response,
                Err(error) => {
                    return FetchOutcome::degraded(records, NemoError::from_request(url, error));
                }
            };
            let status = response.status();
            if !status.is_success() {
                return FetchOutcome::degraded(records, NemoError::from_status(url, status));
            }
            let bytes = match response.bytes().await {
                Ok(bytes) => bytes,
                Err(error) => {
                    return FetchOutcome::degraded(records, NemoError::from_read(url, error));
                }
            };
            next_url = match serde_json::from_slice::<Page>(&bytes) {
                Ok(Page::Paginated { results, next }) => {
                    records.extend(results);
                    next.filter(|next| !next.is_empty())
                }
                Ok(Page::Array(results)) => {
                    records.extend(results);
                    None
                }
                Err(error) => {
                    warn!("unexpected {collection} response shape from {url}: {error}");
                    None
                }
            };
            debug!("loaded {} {collection} records so far", records.len());
        }
        FetchOutcome::complete(records)
    }
}

impl RecordSource for NemoClient {
    fn fetch_users(&self) -> impl Future<Output = FetchOutcome> + Send {
        self.fetch_all("user", &self.user_url)
    }

    fn fetch_bins(&self) -> impl Future<Output = FetchOutcome> + Send {
        self.fetch_all("bin", &self.bin_url)
    }
}
