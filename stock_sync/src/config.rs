//! Application settings read from the environment (and `.env`, loaded by the binary).

use std::{num::NonZeroU32, path::PathBuf, time::Duration};

use jquants_client::{
    ApiError, Client, Credentials, HttpApi, HttpApiConfig, api::DEFAULT_BASE_URL,
};
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::{EnvError, get_env_var, get_optional_env_var, parse_optional_env_var};

use crate::db::connection::DbConfig;

/// Loads `.env` from the working directory or one of its parents.
///
/// Returns the file that was read, or `None` when there is no `.env`. A file
/// that exists but cannot be read or parsed is an error.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    ignore_missing(dotenvy::dotenv())
}

fn ignore_missing<T>(result: Result<T, dotenvy::Error>) -> Result<Option<T>, dotenvy::Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// J-Quants account and transport settings.
#[derive(Debug)]
pub struct JQuantsConfig {
    /// Login mail address (`JQUANTS_MAIL_ADDRESS`).
    pub mail_address: String,
    /// Login password (`JQUANTS_PASSWORD`).
    pub password: SecretString,
    /// API root (`JQUANTS_API_BASE_URL`).
    pub base_url: String,
    /// Per-request timeout (`JQUANTS_HTTP_TIMEOUT_SECS`); none when unset.
    pub timeout: Option<Duration>,
    /// Cap on 401-triggered re-authentications per request (`JQUANTS_MAX_REAUTH`); none when unset.
    pub max_reauth: Option<NonZeroU32>,
}

impl JQuantsConfig {
    /// Reads the `JQUANTS_*` variables.
    pub fn from_env() -> Result<Self, EnvError> {
        Ok(Self {
            mail_address: get_env_var("JQUANTS_MAIL_ADDRESS")?,
            password: SecretString::from(get_env_var("JQUANTS_PASSWORD")?),
            base_url: get_optional_env_var("JQUANTS_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: parse_optional_env_var::<u64>("JQUANTS_HTTP_TIMEOUT_SECS")?
                .map(Duration::from_secs),
            max_reauth: parse_optional_env_var("JQUANTS_MAX_REAUTH")?,
        })
    }

    /// Builds an unauthenticated HTTP client from these settings.
    pub fn client(&self) -> Result<Client<HttpApi>, ApiError> {
        let api = HttpApi::new(HttpApiConfig {
            base_url: self.base_url.clone(),
            timeout: self.timeout,
        })?;
        let password = SecretString::from(self.password.expose_secret().to_string());
        let credentials = Credentials::new(self.mail_address.clone(), password);
        Ok(Client::new(api, credentials).with_reauth_limit(self.max_reauth))
    }
}

/// Settings for a full `update-stock-info` run.
#[derive(Debug)]
pub struct AppConfig {
    /// API side.
    pub jquants: JQuantsConfig,
    /// Store side.
    pub db: DbConfig,
}

impl AppConfig {
    /// Reads both halves from the environment.
    pub fn from_env() -> Result<Self, EnvError> {
        Ok(Self {
            jquants: JQuantsConfig::from_env()?,
            db: DbConfig::from_env()?,
        })
    }
}
