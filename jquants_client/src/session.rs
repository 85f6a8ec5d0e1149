//! Credentials and token state owned by the [`Client`](crate::client::Client).

use std::sync::Arc;

use secrecy::SecretString;

/// Operator-supplied login, fixed for the life of the client.
#[derive(Debug)]
pub struct Credentials {
    pub(crate) mail_address: String,
    pub(crate) password: SecretString,
}

impl Credentials {
    pub fn new(mail_address: impl Into<String>, password: SecretString) -> Self {
        Self {
            mail_address: mail_address.into(),
            password,
        }
    }
}

/// A refresh token and the ID token derived from it.
///
/// Never mutated: a login or a refresh builds a new `Session` and swaps it in,
/// so a reader never sees tokens from two different login cycles.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) refresh_token: Arc<SecretString>,
    pub(crate) id_token: SecretString,
}

impl Session {
    pub(crate) fn new(refresh_token: SecretString, id_token: SecretString) -> Self {
        Self {
            refresh_token: Arc::new(refresh_token),
            id_token,
        }
    }

    /// Same refresh token, new ID token.
    pub(crate) fn with_id_token(&self, id_token: SecretString) -> Self {
        Self {
            refresh_token: Arc::clone(&self.refresh_token),
            id_token,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) enum AuthState {
    #[default]
    Unauthenticated,
    Authenticated(Arc<Session>),
}
