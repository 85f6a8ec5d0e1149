#![allow(dead_code)]

use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;
use jquants_client::{
    Client, Credentials, JQuantsApi,
    errors::{ApiError, StatusSnafu},
    models::{
        DailyQuote, DailyQuotesQuery, DailyQuotesResponse, Date, ListBrandsQuery,
        ListBrandsResponse,
    },
};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};

/// What a scripted endpoint answers next.
pub enum Reply<T> {
    Ok(T),
    Status(u16),
}

impl<T> Reply<T> {
    fn into_result(self) -> Result<T, ApiError> {
        match self {
            Reply::Ok(v) => Ok(v),
            Reply::Status(status) => StatusSnafu {
                status,
                message: format!("scripted HTTP {status}"),
            }
            .fail(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    AuthUser,
    AuthRefresh { refresh_token: String },
    ListedInfo { id_token: String },
    DailyQuotes { id_token: String, pagination_key: Option<String> },
}

/// In-memory API answering from per-endpoint queues.
///
/// Token endpoints fall back to issuing fresh tokens (`refresh-N`, `id-N`, where N
/// counts calls to that endpoint) once their queue is empty. Data endpoints panic
/// when called without a scripted reply.
#[derive(Default)]
pub struct ScriptedApi {
    auth_user: Mutex<VecDeque<Reply<String>>>,
    auth_refresh: Mutex<VecDeque<Reply<String>>>,
    listed_info: Mutex<VecDeque<Reply<ListBrandsResponse>>>,
    daily_quotes: Mutex<VecDeque<Reply<DailyQuotesResponse>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auth_user_replies(self, replies: Vec<Reply<String>>) -> Self {
        self.auth_user.lock().unwrap().extend(replies);
        self
    }

    pub fn auth_refresh_replies(self, replies: Vec<Reply<String>>) -> Self {
        self.auth_refresh.lock().unwrap().extend(replies);
        self
    }

    pub fn listed_info_replies(self, replies: Vec<Reply<ListBrandsResponse>>) -> Self {
        self.listed_info.lock().unwrap().extend(replies);
        self
    }

    pub fn daily_quotes_replies(self, replies: Vec<Reply<DailyQuotesResponse>>) -> Self {
        self.daily_quotes.lock().unwrap().extend(replies);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn auth_user_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::AuthUser))
    }

    pub fn auth_refresh_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::AuthRefresh { .. }))
    }

    pub fn data_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::ListedInfo { .. } | Call::DailyQuotes { .. }))
    }

    fn record(&self, call: Call) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call.clone());
        calls
            .iter()
            .filter(|c| std::mem::discriminant(*c) == std::mem::discriminant(&call))
            .count()
    }
}

#[async_trait]
impl JQuantsApi for ScriptedApi {
    async fn auth_user(
        &self,
        _mail_address: &str,
        _password: &SecretString,
    ) -> Result<SecretString, ApiError> {
        let n = self.record(Call::AuthUser);
        let reply = self
            .auth_user
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Ok(format!("refresh-{n}")));
        reply.into_result().map(SecretString::from)
    }

    async fn auth_refresh(&self, refresh_token: &SecretString) -> Result<SecretString, ApiError> {
        let n = self.record(Call::AuthRefresh {
            refresh_token: refresh_token.expose_secret().to_string(),
        });
        let reply = self
            .auth_refresh
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Ok(format!("id-{n}")));
        reply.into_result().map(SecretString::from)
    }

    async fn listed_info(
        &self,
        id_token: &SecretString,
        _query: &ListBrandsQuery,
    ) -> Result<ListBrandsResponse, ApiError> {
        self.record(Call::ListedInfo {
            id_token: id_token.expose_secret().to_string(),
        });
        let reply = self
            .listed_info
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected listed_info call");
        reply.into_result()
    }

    async fn daily_quotes(
        &self,
        id_token: &SecretString,
        query: &DailyQuotesQuery,
    ) -> Result<DailyQuotesResponse, ApiError> {
        self.record(Call::DailyQuotes {
            id_token: id_token.expose_secret().to_string(),
            pagination_key: query.pagination_key.clone(),
        });
        let reply = self
            .daily_quotes
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected daily_quotes call");
        reply.into_result()
    }
}

pub fn client(api: ScriptedApi) -> Client<ScriptedApi> {
    Client::new(
        api,
        Credentials::new("user@example.test", SecretString::from("password".to_string())),
    )
}

pub fn date(text: &str) -> Date {
    Date::parse(text).unwrap()
}

pub fn quote(code: &str, close: Option<Decimal>) -> DailyQuote {
    DailyQuote {
        date: date("2023-03-24"),
        code: code.to_string(),
        open: close,
        high: close,
        low: close,
        close,
        volume: close.map(|_| Decimal::new(1000, 0)),
        turnover_value: None,
        adjustment_factor: Some(Decimal::ONE),
        adjustment_open: close,
        adjustment_high: close,
        adjustment_low: close,
        adjustment_close: close,
        adjustment_volume: None,
    }
}

pub fn page(rows: Vec<DailyQuote>, cursor: Option<&str>) -> DailyQuotesResponse {
    DailyQuotesResponse {
        daily_quotes: rows,
        pagination_key: cursor.map(str::to_string),
    }
}
