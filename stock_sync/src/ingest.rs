//! The `update-stock-info` run: login, then brands, then one day of prices.
//!
//! Each data phase has its own transaction. Brands are fetched in one call and
//! written in one transaction. Prices are paged, and a single transaction spans
//! the whole page loop: every page is converted and upserted as it arrives, and
//! a failure on any page (fetch or write) rolls back every page of that run.
//! A failed price phase leaves the committed brands in place.

use chrono::{DateTime, Utc};
use chrono_tz::Asia::Tokyo;
use diesel_async::{AsyncConnection, AsyncPgConnection, scoped_futures::ScopedFutureExt};
use jquants_client::{
    Client, JQuantsApi,
    models::{BrandInfo, DailyQuote, DailyQuotesQuery, Date, ListBrandsQuery},
};
use tracing::info;

use crate::{
    errors::SyncError,
    models::{NewBrand, NewPrice},
    store::upsert_chunked,
};

/// What one run wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Brand rows upserted.
    pub brands: usize,
    /// Price rows upserted.
    pub prices: usize,
    /// Daily-quote pages fetched.
    pub pages: usize,
}

/// Logs in, refreshes every brand, then loads every quote for `date`.
pub async fn update_stock_info<A: JQuantsApi>(
    client: &mut Client<A>,
    conn: &mut AsyncPgConnection,
    date: Date,
) -> Result<UpdateReport, SyncError> {
    client.login().await?;

    let brands = update_brands(client, conn).await?;
    let (prices, pages) = update_prices(client, conn, date).await?;

    Ok(UpdateReport {
        brands,
        prices,
        pages,
    })
}

/// Fetches the listed-issue list and upserts it in one transaction.
pub async fn update_brands<A: JQuantsApi>(
    client: &mut Client<A>,
    conn: &mut AsyncPgConnection,
) -> Result<usize, SyncError> {
    let response = client.list_brands(&ListBrandsQuery::default()).await?;
    info!(rows = response.brands.len(), "brands fetched");

    let written = store_brands(conn, response.brands).await?;
    info!(rows = written, "brands committed");
    Ok(written)
}

/// Pages through the quotes for `date`, upserting as it goes, all in one
/// transaction. Returns `(rows written, pages fetched)`.
pub async fn update_prices<A: JQuantsApi>(
    client: &mut Client<A>,
    conn: &mut AsyncPgConnection,
    date: Date,
) -> Result<(usize, usize), SyncError> {
    let query = DailyQuotesQuery::by_date(date);

    let (written, pages) = conn
        .transaction::<_, SyncError, _>(|conn| {
            async move {
                let mut pages = client.daily_quote_pages(query);
                let mut written = 0;
                while let Some(quotes) = pages.next_page().await? {
                    written += upsert_chunked(conn, to_price_rows(quotes)).await?;
                }
                Ok((written, pages.pages_fetched()))
            }
            .scope_boxed()
        })
        .await?;

    info!(%date, rows = written, pages, "prices committed");
    Ok((written, pages))
}

/// Upserts already-fetched brands in one transaction.
pub async fn store_brands(
    conn: &mut AsyncPgConnection,
    brands: Vec<BrandInfo>,
) -> Result<usize, SyncError> {
    let rows: Vec<NewBrand> = brands.into_iter().map(NewBrand::from).collect();
    conn.transaction::<_, SyncError, _>(|conn| {
        async move { Ok(upsert_chunked(conn, rows).await?) }.scope_boxed()
    })
    .await
}

/// Upserts already-fetched quotes in one transaction.
pub async fn store_quotes(
    conn: &mut AsyncPgConnection,
    quotes: Vec<DailyQuote>,
) -> Result<usize, SyncError> {
    let rows = to_price_rows(quotes);
    conn.transaction::<_, SyncError, _>(|conn| {
        async move { Ok(upsert_chunked(conn, rows).await?) }.scope_boxed()
    })
    .await
}

fn to_price_rows(quotes: Vec<DailyQuote>) -> Vec<NewPrice> {
    quotes.into_iter().map(NewPrice::from).collect()
}

/// The date to ingest: `arg` when given, otherwise today in Asia/Tokyo.
pub fn target_date(arg: Option<&str>, now: DateTime<Utc>) -> Result<Date, SyncError> {
    match arg {
        Some(text) => Ok(Date::parse(text)?),
        None => Ok(Date::try_from(now.with_timezone(&Tokyo).date_naive())?),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn explicit_date_must_be_canonical() {
        let now = Utc::now();
        assert_eq!(
            target_date(Some("2023-03-24"), now).unwrap(),
            Date::from_ymd(2023, 3, 24).unwrap()
        );
        assert!(matches!(
            target_date(Some("2023-3-24"), now),
            Err(SyncError::Date(_))
        ));
    }

    #[test]
    fn default_date_follows_tokyo_calendar() {
        // 2023-03-24 16:30 UTC is already 2023-03-25 in Tokyo.
        let now = Utc.with_ymd_and_hms(2023, 3, 24, 16, 30, 0).unwrap();
        assert_eq!(target_date(None, now).unwrap().format(), "2023-03-25");

        let now = Utc.with_ymd_and_hms(2023, 3, 24, 14, 59, 59).unwrap();
        assert_eq!(target_date(None, now).unwrap().format(), "2023-03-24");
    }
}
