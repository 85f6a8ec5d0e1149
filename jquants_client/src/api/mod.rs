//! Transport abstraction for the J-Quants REST API.
//!
//! [`JQuantsApi`] is one method per endpoint and knows nothing about sessions:
//! every call takes the token it needs explicitly. Token lifecycle and the 401
//! recovery protocol live one level up in [`Client`](crate::client::Client), which
//! is generic over this trait so it can be driven by [`HttpApi`] in production
//! and by scripted implementations in tests.

pub mod http;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::{
    errors::ApiError,
    models::{DailyQuotesQuery, DailyQuotesResponse, ListBrandsQuery, ListBrandsResponse},
};

pub use http::{DEFAULT_BASE_URL, HttpApi, HttpApiConfig};

/// The four endpoints the ingestion needs.
#[async_trait]
pub trait JQuantsApi: Send + Sync {
    /// `POST /token/auth_user`: mail address and password for a refresh token.
    async fn auth_user(
        &self,
        mail_address: &str,
        password: &SecretString,
    ) -> Result<SecretString, ApiError>;

    /// `POST /token/auth_refresh`: refresh token for an ID token.
    async fn auth_refresh(&self, refresh_token: &SecretString) -> Result<SecretString, ApiError>;

    /// `GET /listed/info` with a bearer ID token.
    async fn listed_info(
        &self,
        id_token: &SecretString,
        query: &ListBrandsQuery,
    ) -> Result<ListBrandsResponse, ApiError>;

    /// `GET /prices/daily_quotes` with a bearer ID token. Returns one page.
    async fn daily_quotes(
        &self,
        id_token: &SecretString,
        query: &DailyQuotesQuery,
    ) -> Result<DailyQuotesResponse, ApiError>;
}
