//! Diesel models mapping to the database schema.
//!
//! Each table has a read model (`Queryable`/`Selectable`) carrying the surrogate
//! key and audit columns, and an insert model built from the API wire record.
//! Audit columns (`created_at`, `updated_at`, `deleted_at`) are owned by the
//! database defaults and the upsert statements; insert models never carry them.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use jquants_client::models::{BrandInfo, DailyQuote};
use rust_decimal::Decimal;

use crate::schema::{brands, prices};

/// A row in [`crate::schema::brands`]: one listed issue, keyed by `code`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = brands, check_for_backend(diesel::pg::Pg))]
pub struct Brand {
    /// Surrogate key.
    pub id: i64,
    /// Date the listing information applies to.
    pub date: NaiveDate,
    /// Issue code, unique across the table.
    pub code: String,
    /// Company name.
    pub company_name: String,
    /// Company name in English.
    pub company_name_english: String,
    /// 17-sector classification code.
    pub sector17_code: String,
    /// 17-sector classification name.
    pub sector17_code_name: String,
    /// 33-sector classification code.
    pub sector33_code: String,
    /// 33-sector classification name.
    pub sector33_code_name: String,
    /// Size category (e.g. "TOPIX Core30").
    pub scale_category: String,
    /// Market segment code.
    pub market_code: String,
    /// Market segment name.
    pub market_code_name: String,
    /// First insert time. Never changed by upserts.
    pub created_at: DateTime<Utc>,
    /// Last upsert time.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker; cleared whenever the issue is ingested again.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Insertable form of [`Brand`].
#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = brands)]
pub struct NewBrand {
    /// Date the listing information applies to.
    pub date: NaiveDate,
    /// Issue code (natural key).
    pub code: String,
    /// Company name.
    pub company_name: String,
    /// Company name in English.
    pub company_name_english: String,
    /// 17-sector classification code.
    pub sector17_code: String,
    /// 17-sector classification name.
    pub sector17_code_name: String,
    /// 33-sector classification code.
    pub sector33_code: String,
    /// 33-sector classification name.
    pub sector33_code_name: String,
    /// Size category.
    pub scale_category: String,
    /// Market segment code.
    pub market_code: String,
    /// Market segment name.
    pub market_code_name: String,
}

impl From<BrandInfo> for NewBrand {
    fn from(info: BrandInfo) -> Self {
        Self {
            date: info.date.into(),
            code: info.code,
            company_name: info.company_name,
            company_name_english: info.company_name_english,
            sector17_code: info.sector17_code,
            sector17_code_name: info.sector17_code_name,
            sector33_code: info.sector33_code,
            sector33_code_name: info.sector33_code_name,
            scale_category: info.scale_category,
            market_code: info.market_code,
            market_code_name: info.market_code_name,
        }
    }
}

/// A row in [`crate::schema::prices`]: one trading day of one issue, keyed by `(date, code)`.
///
/// `None` means the API did not report the value (e.g. no trade that day); it
/// is stored as SQL NULL and never confused with zero.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = prices, check_for_backend(diesel::pg::Pg))]
pub struct Price {
    /// Surrogate key.
    pub id: i64,
    /// Trading date.
    pub date: NaiveDate,
    /// Issue code.
    pub code: String,
    /// Opening price.
    pub open: Option<Decimal>,
    /// High price.
    pub high: Option<Decimal>,
    /// Low price.
    pub low: Option<Decimal>,
    /// Closing price.
    pub close: Option<Decimal>,
    /// Trading volume.
    pub volume: Option<Decimal>,
    /// Trading value.
    pub turnover_value: Option<Decimal>,
    /// Split/merge adjustment factor.
    pub adjustment_factor: Option<Decimal>,
    /// Adjusted opening price.
    pub adjustment_open: Option<Decimal>,
    /// Adjusted high price.
    pub adjustment_high: Option<Decimal>,
    /// Adjusted low price.
    pub adjustment_low: Option<Decimal>,
    /// Adjusted closing price.
    pub adjustment_close: Option<Decimal>,
    /// Adjusted volume.
    pub adjustment_volume: Option<Decimal>,
    /// First insert time. Never changed by upserts.
    pub created_at: DateTime<Utc>,
    /// Last upsert time.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker; cleared whenever the quote is ingested again.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Insertable form of [`Price`].
#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = prices)]
pub struct NewPrice {
    /// Trading date (natural key, with `code`).
    pub date: NaiveDate,
    /// Issue code (natural key, with `date`).
    pub code: String,
    /// Opening price.
    pub open: Option<Decimal>,
    /// High price.
    pub high: Option<Decimal>,
    /// Low price.
    pub low: Option<Decimal>,
    /// Closing price.
    pub close: Option<Decimal>,
    /// Trading volume.
    pub volume: Option<Decimal>,
    /// Trading value.
    pub turnover_value: Option<Decimal>,
    /// Split/merge adjustment factor.
    pub adjustment_factor: Option<Decimal>,
    /// Adjusted opening price.
    pub adjustment_open: Option<Decimal>,
    /// Adjusted high price.
    pub adjustment_high: Option<Decimal>,
    /// Adjusted low price.
    pub adjustment_low: Option<Decimal>,
    /// Adjusted closing price.
    pub adjustment_close: Option<Decimal>,
    /// Adjusted volume.
    pub adjustment_volume: Option<Decimal>,
}

impl From<DailyQuote> for NewPrice {
    fn from(q: DailyQuote) -> Self {
        Self {
            date: q.date.into(),
            code: q.code,
            open: q.open,
            high: q.high,
            low: q.low,
            close: q.close,
            volume: q.volume,
            turnover_value: q.turnover_value,
            adjustment_factor: q.adjustment_factor,
            adjustment_open: q.adjustment_open,
            adjustment_high: q.adjustment_high,
            adjustment_low: q.adjustment_low,
            adjustment_close: q.adjustment_close,
            adjustment_volume: q.adjustment_volume,
        }
    }
}
