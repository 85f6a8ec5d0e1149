use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};
use snafu::ResultExt;
use tracing::debug;

use crate::{
    api::JQuantsApi,
    errors::{ApiError, DecodeSnafu, RequestSnafu, StatusSnafu},
    models::{DailyQuotesQuery, DailyQuotesResponse, ListBrandsQuery, ListBrandsResponse},
};

pub const DEFAULT_BASE_URL: &str = "https://api.jquants.com/v1";

/// Settings for [`HttpApi`].
#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    /// Endpoint root, without trailing slash.
    pub base_url: String,
    /// Whole-request timeout. `None` keeps reqwest's default (no timeout).
    pub timeout: Option<Duration>,
}

impl Default for HttpApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

#[derive(Deserialize)]
struct AuthUserBody {
    #[serde(rename = "refreshToken")]
    refresh_token: String,
}

#[derive(Deserialize)]
struct AuthRefreshBody {
    #[serde(rename = "idToken")]
    id_token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// [`JQuantsApi`] over HTTPS with reqwest.
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(config: HttpApiConfig) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context(RequestSnafu)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Reads the body and decodes it, turning any status >= 300 into
    /// [`ApiError::Status`] carrying the API's `message`.
    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await.context(RequestSnafu)?;

        if status.as_u16() >= 300 {
            return StatusSnafu {
                status: status.as_u16(),
                message: error_message(&body),
            }
            .fail();
        }

        serde_json::from_str(&body).context(DecodeSnafu)
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl JQuantsApi for HttpApi {
    async fn auth_user(
        &self,
        mail_address: &str,
        password: &SecretString,
    ) -> Result<SecretString, ApiError> {
        let body = serde_json::json!({
            "mailaddress": mail_address,
            "password": password.expose_secret(),
        });
        let response = self
            .client
            .post(self.url("token/auth_user"))
            .json(&body)
            .send()
            .await
            .context(RequestSnafu)?;

        let parsed: AuthUserBody = Self::read(response).await?;
        Ok(SecretString::from(parsed.refresh_token))
    }

    async fn auth_refresh(&self, refresh_token: &SecretString) -> Result<SecretString, ApiError> {
        let response = self
            .client
            .post(self.url("token/auth_refresh"))
            .query(&[("refreshtoken", refresh_token.expose_secret())])
            .send()
            .await
            .context(RequestSnafu)?;

        let parsed: AuthRefreshBody = Self::read(response).await?;
        Ok(SecretString::from(parsed.id_token))
    }

    async fn listed_info(
        &self,
        id_token: &SecretString,
        query: &ListBrandsQuery,
    ) -> Result<ListBrandsResponse, ApiError> {
        let response = self
            .client
            .get(self.url("listed/info"))
            .bearer_auth(id_token.expose_secret())
            .query(&query.query_pairs())
            .send()
            .await
            .context(RequestSnafu)?;

        let parsed: ListBrandsResponse = Self::read(response).await?;
        debug!(rows = parsed.brands.len(), "listed/info answered");
        Ok(parsed)
    }

    async fn daily_quotes(
        &self,
        id_token: &SecretString,
        query: &DailyQuotesQuery,
    ) -> Result<DailyQuotesResponse, ApiError> {
        let response = self
            .client
            .get(self.url("prices/daily_quotes"))
            .bearer_auth(id_token.expose_secret())
            .query(&query.query_pairs())
            .send()
            .await
            .context(RequestSnafu)?;

        Self::read(response).await
    }
}
