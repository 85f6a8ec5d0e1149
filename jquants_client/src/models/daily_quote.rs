//! Daily price quotes (`GET /prices/daily_quotes`).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::date::Date;

/// One day of price/volume data for one issue.
///
/// Every numeric field is nullable: the API reports `null` for issues that did
/// not trade (or were suspended) on the date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DailyQuote {
    pub date: Date,
    pub code: String,
    #[serde(default, with = "crate::models::decimal::optional")]
    pub open: Option<Decimal>,
    #[serde(default, with = "crate::models::decimal::optional")]
    pub high: Option<Decimal>,
    #[serde(default, with = "crate::models::decimal::optional")]
    pub low: Option<Decimal>,
    #[serde(default, with = "crate::models::decimal::optional")]
    pub close: Option<Decimal>,
    #[serde(default, with = "crate::models::decimal::optional")]
    pub volume: Option<Decimal>,
    #[serde(default, with = "crate::models::decimal::optional")]
    pub turnover_value: Option<Decimal>,
    /// Split/merge factor applied on this date (1.0 when nothing happened).
    #[serde(default, with = "crate::models::decimal::optional")]
    pub adjustment_factor: Option<Decimal>,
    #[serde(default, with = "crate::models::decimal::optional")]
    pub adjustment_open: Option<Decimal>,
    #[serde(default, with = "crate::models::decimal::optional")]
    pub adjustment_high: Option<Decimal>,
    #[serde(default, with = "crate::models::decimal::optional")]
    pub adjustment_low: Option<Decimal>,
    #[serde(default, with = "crate::models::decimal::optional")]
    pub adjustment_close: Option<Decimal>,
    #[serde(default, with = "crate::models::decimal::optional")]
    pub adjustment_volume: Option<Decimal>,
}

/// Filters for the daily-quote query.
///
/// The API requires at least `code` or `date`; `from`/`to` narrow a per-code
/// query to a period. `pagination_key` is the continuation cursor of the
/// previous page and is normally managed by
/// [`DailyQuotePages`](crate::pagination::DailyQuotePages).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyQuotesQuery {
    pub code: Option<String>,
    pub date: Option<Date>,
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub pagination_key: Option<String>,
}

impl DailyQuotesQuery {
    /// Full history of one issue.
    pub fn by_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    /// One issue over `from..=to`.
    pub fn by_code_and_period(code: impl Into<String>, from: Date, to: Date) -> Self {
        Self {
            code: Some(code.into()),
            from: Some(from),
            to: Some(to),
            ..Self::default()
        }
    }

    /// Every issue on one date.
    pub fn by_date(date: Date) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    pub fn with_pagination_key(mut self, key: impl Into<String>) -> Self {
        self.pagination_key = Some(key.into());
        self
    }

    /// Query parameters for the present filters only.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(code) = &self.code {
            pairs.push(("code", code.clone()));
        }
        for (name, date) in [("date", &self.date), ("from", &self.from), ("to", &self.to)] {
            if let Some(date) = date {
                pairs.push((name, date.format()));
            }
        }
        if let Some(key) = &self.pagination_key {
            pairs.push(("pagination_key", key.clone()));
        }
        pairs
    }
}

/// One page of daily quotes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyQuotesResponse {
    pub daily_quotes: Vec<DailyQuote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination_key: Option<String>,
}

impl DailyQuotesResponse {
    /// Cursor for the next page; an empty key is treated as "no more pages".
    pub fn next_cursor(&self) -> Option<&str> {
        self.pagination_key
            .as_deref()
            .filter(|key| !key.is_empty())
    }
}
