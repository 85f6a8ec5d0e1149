#![allow(dead_code)]

use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use jquants_client::{
    Client, Credentials, JQuantsApi,
    errors::{ApiError, StatusSnafu},
    models::{
        BrandInfo, DailyQuote, DailyQuotesQuery, DailyQuotesResponse, Date, ListBrandsQuery,
        ListBrandsResponse,
    },
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use stock_sync::db::{
    connection::{DbConfig, connect_postgres},
    migrate,
};

/// Connection to the database named by the `DB_*` variables, migrated, with a
/// test transaction open so nothing a test writes is ever committed.
///
/// Point `DB_*` at a disposable database; these tests are `#[ignore]`d by default.
pub async fn setup_db() -> AsyncPgConnection {
    stock_sync::config::load_dotenv().expect("malformed .env");
    let config = DbConfig::from_env().expect("DB_* variables for a test database");
    let config = tokio::task::spawn_blocking(move || {
        migrate::run_postgres(&config).expect("migrations");
        config
    })
    .await
    .unwrap();

    let mut conn = connect_postgres(&config).await.expect("connect");
    conn.begin_test_transaction().await.expect("test transaction");
    diesel::sql_query("DELETE FROM prices")
        .execute(&mut conn)
        .await
        .unwrap();
    diesel::sql_query("DELETE FROM brands")
        .execute(&mut conn)
        .await
        .unwrap();
    conn
}

pub fn date(text: &str) -> Date {
    Date::parse(text).unwrap()
}

pub fn brand(code: &str, company_name: &str) -> BrandInfo {
    BrandInfo {
        date: date("2023-03-24"),
        code: code.to_string(),
        company_name: company_name.to_string(),
        company_name_english: format!("{company_name} (EN)"),
        sector17_code: "8".into(),
        sector17_code_name: "Chemicals".into(),
        sector33_code: "3200".into(),
        sector33_code_name: "Chemicals".into(),
        scale_category: "TOPIX Small 1".into(),
        market_code: "0111".into(),
        market_code_name: "Prime".into(),
    }
}

pub fn quote(day: &str, code: &str, close: Option<Decimal>) -> DailyQuote {
    DailyQuote {
        date: date(day),
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

/// Serves a fixed brand list and a queue of quote pages (`Err(status)` for a failure).
#[derive(Default)]
pub struct FakeApi {
    pub reject_login: bool,
    pub brands: Vec<BrandInfo>,
    pub pages: Mutex<VecDeque<Result<DailyQuotesResponse, u16>>>,
}

impl FakeApi {
    pub fn with_pages(
        brands: Vec<BrandInfo>,
        pages: Vec<Result<DailyQuotesResponse, u16>>,
    ) -> Self {
        Self {
            reject_login: false,
            brands,
            pages: Mutex::new(pages.into()),
        }
    }

    pub fn pages_left(&self) -> usize {
        self.pages.lock().unwrap().len()
    }
}

#[async_trait]
impl JQuantsApi for FakeApi {
    async fn auth_user(&self, _: &str, _: &SecretString) -> Result<SecretString, ApiError> {
        if self.reject_login {
            return StatusSnafu { status: 400u16, message: "invalid credentials" }.fail();
        }
        Ok(SecretString::from("refresh".to_string()))
    }

    async fn auth_refresh(&self, _: &SecretString) -> Result<SecretString, ApiError> {
        Ok(SecretString::from("id".to_string()))
    }

    async fn listed_info(
        &self,
        _: &SecretString,
        _: &ListBrandsQuery,
    ) -> Result<ListBrandsResponse, ApiError> {
        Ok(ListBrandsResponse {
            brands: self.brands.clone(),
        })
    }

    async fn daily_quotes(
        &self,
        _: &SecretString,
        _: &DailyQuotesQuery,
    ) -> Result<DailyQuotesResponse, ApiError> {
        match self.pages.lock().unwrap().pop_front() {
            Some(Ok(page)) => Ok(page),
            Some(Err(status)) => StatusSnafu { status, message: "scripted failure" }.fail(),
            None => panic!("no more scripted pages"),
        }
    }
}

pub fn client(api: FakeApi) -> Client<FakeApi> {
    Client::new(
        api,
        Credentials::new("user@example.test", SecretString::from("pw".to_string())),
    )
}
