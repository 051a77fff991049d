// This file is part of bin-lookup. Copyright © 2026 bin-lookup contributors.
// bin-lookup is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

use reqwest::StatusCode;
use std::fmt::{Display, Formatter};

/// Errors from talking to the NEMO API. These never abort a pagination walk on
/// their own: the fetcher attaches them to whatever partial data it collected
/// and leaves the keep-or-discard decision to the cache manager.
#[derive(Debug)]
pub enum NemoError {
    /// We got an HTTP response, but with a non-2xx status code.
    HttpResponse { url: String, status: StatusCode },
    /// We never got an HTTP response: failure during the initial `.send()`.
    /// Covers connect errors, timeouts, and TLS trouble.
    HttpRequest { url: String, error: reqwest::Error },
    /// Failure while reading the response body.
    HttpRead { url: String, error: reqwest::Error },
    /// The API key contains bytes that cannot be sent as an HTTP header.
    InvalidApiKey,
    /// The underlying HTTP client could not be constructed.
    ClientBuild(reqwest::Error),
}

impl Display for NemoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NemoError::HttpResponse { url, status } => {
                write!(f, "{url} returned status code {}", status.as_u16())
            }
            NemoError::HttpRequest { url, error } => {
                write!(f, "request to {url} failed: {error}")
            }
            NemoError::HttpRead { url, error } => {
                write!(f, "reading response body from {url} failed: {error}")
            }
            NemoError::InvalidApiKey => {
                f.write_str("NEMO_API_KEY contains characters that are not legal in an HTTP header")
            }
            NemoError::ClientBuild(error) => {
                write!(f, "failed to build HTTP client: {error}")
            }
        }
    }
}

impl std::error::Error for NemoError {}

impl NemoError {
    /// Build an error for a non-2xx response
    pub fn from_status(url: String, status: StatusCode) -> Self {
        Self::HttpResponse { url, status }
    }

    /// Build an error for a failed request (use this after `.send()`)
    pub fn from_request(url: String, error: reqwest::Error) -> Self {
        Self::HttpRequest { url, error }
    }

    /// Build an error for a failed body read (use this after `.bytes()`)
    pub fn from_read(url: String, error: reqwest::Error) -> Self {
        Self::HttpRead { url, error }
    }
}
