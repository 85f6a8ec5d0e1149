//! Authenticated J-Quants client.
//!
//! The client owns the credentials and the token [`Session`]. Data requests go
//! through a small per-call state machine:
//!
//! ```text
//! Send ──ok──────────────────────────────> return response
//!  │ 401                 other error ────> return ClientError::Api
//!  v
//! RefreshIdToken ──ok──> Send
//!  │ 401                 other error ────> return ClientError::Api
//!  v
//! Relogin ──ok──> Send
//!  │ any error ──────────────────────────> return ClientError::Authentication
//! ```
//!
//! A failed login is terminal and never re-enters the loop. Without a
//! configured [`reauth_limit`](Client::with_reauth_limit) the loop is unbounded,
//! so a server that rejects every freshly issued token keeps the call spinning.

use std::{num::NonZeroU32, sync::Arc};

use async_trait::async_trait;
use secrecy::SecretString;
use snafu::ResultExt;
use tracing::{debug, info, warn};

use crate::{
    api::JQuantsApi,
    errors::{
        ApiError, ApiSnafu, AuthenticationSnafu, ClientError, NotAuthorizedSnafu,
        ReauthLimitSnafu,
    },
    models::{DailyQuotesQuery, DailyQuotesResponse, ListBrandsQuery, ListBrandsResponse},
    pagination::DailyQuotePages,
    session::{AuthState, Credentials, Session},
};

/// A request that needs a bearer ID token.
#[async_trait]
trait Endpoint: Sync {
    type Response: Send;

    const NAME: &'static str;

    async fn send<A: JQuantsApi + ?Sized>(
        &self,
        api: &A,
        id_token: &SecretString,
    ) -> Result<Self::Response, ApiError>;
}

#[async_trait]
impl Endpoint for ListBrandsQuery {
    type Response = ListBrandsResponse;

    const NAME: &'static str = "listed/info";

    async fn send<A: JQuantsApi + ?Sized>(
        &self,
        api: &A,
        id_token: &SecretString,
    ) -> Result<ListBrandsResponse, ApiError> {
        api.listed_info(id_token, self).await
    }
}

#[async_trait]
impl Endpoint for DailyQuotesQuery {
    type Response = DailyQuotesResponse;

    const NAME: &'static str = "prices/daily_quotes";

    async fn send<A: JQuantsApi + ?Sized>(
        &self,
        api: &A,
        id_token: &SecretString,
    ) -> Result<DailyQuotesResponse, ApiError> {
        api.daily_quotes(id_token, self).await
    }
}

enum Step {
    Send,
    RefreshIdToken(Arc<Session>),
    Relogin,
}

/// Session-aware client over any [`JQuantsApi`].
pub struct Client<A> {
    api: A,
    credentials: Credentials,
    state: AuthState,
    reauth_limit: Option<NonZeroU32>,
}

impl<A: JQuantsApi> Client<A> {
    /// Creates an unauthenticated client. Call [`login`](Self::login) first.
    pub fn new(api: A, credentials: Credentials) -> Self {
        Self {
            api,
            credentials,
            state: AuthState::Unauthenticated,
            reauth_limit: None,
        }
    }

    /// Bounds the number of 401-triggered re-authentication cycles per request.
    pub fn with_reauth_limit(mut self, limit: Option<NonZeroU32>) -> Self {
        self.reauth_limit = limit;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn is_authorized(&self) -> bool {
        matches!(self.state, AuthState::Authenticated(_))
    }

    /// Exchanges mail/password for a refresh token, then the refresh token for an
    /// ID token. The session is replaced only when both succeed.
    pub async fn login(&mut self) -> Result<(), ClientError> {
        debug!("logging in");

        let refresh_token = self
            .api
            .auth_user(&self.credentials.mail_address, &self.credentials.password)
            .await
            .context(AuthenticationSnafu)?;
        let id_token = self
            .api
            .auth_refresh(&refresh_token)
            .await
            .context(AuthenticationSnafu)?;

        self.state = AuthState::Authenticated(Arc::new(Session::new(refresh_token, id_token)));
        Ok(())
    }

    /// Listed-issue reference data.
    pub async fn list_brands(
        &mut self,
        query: &ListBrandsQuery,
    ) -> Result<ListBrandsResponse, ClientError> {
        self.authorized(query).await
    }

    /// One page of daily quotes. Most callers want [`daily_quote_pages`](Self::daily_quote_pages).
    pub async fn fetch_quote_page(
        &mut self,
        query: &DailyQuotesQuery,
    ) -> Result<DailyQuotesResponse, ClientError> {
        self.authorized(query).await
    }

    /// Every page matching `query`, fetched lazily by following the cursor.
    pub fn daily_quote_pages(&mut self, query: DailyQuotesQuery) -> DailyQuotePages<'_, A> {
        DailyQuotePages::new(self, query)
    }

    fn session(&self) -> Result<Arc<Session>, ClientError> {
        match &self.state {
            AuthState::Authenticated(session) => Ok(Arc::clone(session)),
            AuthState::Unauthenticated => NotAuthorizedSnafu.fail(),
        }
    }

    async fn authorized<E: Endpoint>(&mut self, endpoint: &E) -> Result<E::Response, ClientError> {
        // Checked up front so an unauthenticated call never reaches the network.
        self.session()?;

        let mut reauth_cycles: u32 = 0;
        let mut step = Step::Send;
        loop {
            step = match step {
                Step::Send => {
                    let session = self.session()?;
                    match endpoint.send(&self.api, &session.id_token).await {
                        Ok(response) => return Ok(response),
                        Err(e) if e.is_unauthorized() => {
                            reauth_cycles += 1;
                            if let Some(limit) = self.reauth_limit {
                                if reauth_cycles > limit.get() {
                                    return ReauthLimitSnafu { attempts: limit.get() }.fail();
                                }
                            }
                            debug!(endpoint = E::NAME, "ID token rejected, refreshing");
                            Step::RefreshIdToken(session)
                        }
                        Err(e) => return Err(e).context(ApiSnafu),
                    }
                }
                Step::RefreshIdToken(session) => match self.refresh_id_token(&session).await {
                    Ok(()) => Step::Send,
                    Err(e) if e.is_unauthorized() => {
                        warn!(endpoint = E::NAME, "refresh token expired, logging in again");
                        Step::Relogin
                    }
                    Err(e) => return Err(e).context(ApiSnafu),
                },
                Step::Relogin => {
                    self.login().await?;
                    Step::Send
                }
            };
        }
    }

    async fn refresh_id_token(&mut self, session: &Session) -> Result<(), ApiError> {
        let id_token = self.api.auth_refresh(&session.refresh_token).await?;
        self.state = AuthState::Authenticated(Arc::new(session.with_id_token(id_token)));
        info!("ID token refreshed");
        Ok(())
    }
}

impl<A> std::fmt::Debug for Client<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("mail_address", &self.credentials.mail_address)
            .field("authorized", &matches!(self.state, AuthState::Authenticated(_)))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StatusSnafu;

    struct NeverCalled;

    #[async_trait]
    impl JQuantsApi for NeverCalled {
        async fn auth_user(&self, _: &str, _: &SecretString) -> Result<SecretString, ApiError> {
            panic!("auth_user must not be called")
        }
        async fn auth_refresh(&self, _: &SecretString) -> Result<SecretString, ApiError> {
            panic!("auth_refresh must not be called")
        }
        async fn listed_info(
            &self,
            _: &SecretString,
            _: &ListBrandsQuery,
        ) -> Result<ListBrandsResponse, ApiError> {
            panic!("listed_info must not be called")
        }
        async fn daily_quotes(
            &self,
            _: &SecretString,
            _: &DailyQuotesQuery,
        ) -> Result<DailyQuotesResponse, ApiError> {
            StatusSnafu { status: 500u16, message: "unreachable" }.fail()
        }
    }

    fn client() -> Client<NeverCalled> {
        Client::new(
            NeverCalled,
            Credentials::new("user@example.test", SecretString::from("pw".to_string())),
        )
    }

    #[tokio::test]
    async fn data_calls_before_login_fail_without_touching_the_network() {
        let mut c = client();
        assert!(!c.is_authorized());

        let err = c.list_brands(&ListBrandsQuery::default()).await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthorized { .. }));

        let err = c
            .fetch_quote_page(&DailyQuotesQuery::by_code("1301"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotAuthorized { .. }));
    }

    #[test]
    fn debug_output_does_not_leak_secrets() {
        let rendered = format!("{:?}", client());
        assert!(rendered.contains("user@example.test"));
        assert!(!rendered.contains("pw"));
    }
}
