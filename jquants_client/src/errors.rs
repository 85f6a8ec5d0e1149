//! Error types for the J-Quants transport and the authenticated client.

use snafu::{Backtrace, Snafu};

/// Errors produced by a single HTTP exchange with the API.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ApiError {
    /// The request never produced a response (connection, TLS, timeout, body read).
    #[snafu(display("API request failed: {source}"))]
    Request {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The API answered with a status code >= 300.
    #[snafu(display("API error (HTTP {status}): {message}"))]
    Status {
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// The response body was not the JSON document the endpoint promises.
    #[snafu(display("Malformed API response: {source}"))]
    Decode {
        source: serde_json::Error,
        backtrace: Backtrace,
    },
}

impl ApiError {
    /// HTTP status for `Status` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for the one response the client recovers from: HTTP 401.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// Errors surfaced by [`Client`](crate::client::Client).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ClientError {
    /// A data request was made before a successful `login`. No request was sent.
    #[snafu(display("Not authorized: login must succeed before requesting data"))]
    NotAuthorized { backtrace: Backtrace },

    /// Exchanging credentials for tokens failed. Never retried.
    #[snafu(display("Authentication failed: {source}"))]
    Authentication { source: ApiError },

    /// A non-401 failure of a data or refresh request, surfaced unchanged.
    #[snafu(display("{source}"))]
    Api { source: ApiError },

    /// The configured bound on re-authentication cycles for one request was hit.
    #[snafu(display("Request still unauthorized after {attempts} re-authentication attempts"))]
    ReauthLimit { attempts: u32, backtrace: Backtrace },
}
