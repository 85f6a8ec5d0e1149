//! Chunked, idempotent upserts for brands and prices.
//!
//! [`upsert_chunked`] collapses rows that share a natural key (the last one
//! wins, keeping the first one's position), then writes them in batches of
//! [`CHUNK_SIZE`], one `INSERT ... ON CONFLICT DO UPDATE` per batch. It never
//! opens or commits a transaction: callers run it inside their own, so batch
//! boundaries are never visible as partial commits.
//!
//! On conflict every non-key column is overwritten, `updated_at` is set to
//! `now()`, `deleted_at` is cleared and `created_at` is left alone.

use std::hash::Hash;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::{prelude::*, result::QueryResult, upsert::excluded};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use indexmap::IndexMap;
use tracing::debug;

use crate::{
    models::{Brand, NewBrand, NewPrice, Price},
    schema::{brands, prices},
};

/// Rows per upsert statement.
pub const CHUNK_SIZE: usize = 100;

/// Identity of a record for upsert purposes, independent of the surrogate `id`.
pub trait NaturalKey {
    /// Key type; equal keys address the same stored row.
    type Key: Hash + Eq;

    /// Extracts the key.
    fn natural_key(&self) -> Self::Key;
}

impl NaturalKey for NewBrand {
    type Key = String;

    fn natural_key(&self) -> String {
        self.code.clone()
    }
}

impl NaturalKey for NewPrice {
    type Key = (NaiveDate, String);

    fn natural_key(&self) -> (NaiveDate, String) {
        (self.date, self.code.clone())
    }
}

/// Something that can upsert one batch of `R` in a single statement.
#[async_trait]
pub trait UpsertBatch<R: Sync>: Send {
    /// Writes `rows` with one statement, returning the affected row count.
    async fn upsert_batch(&mut self, rows: &[R]) -> QueryResult<usize>;
}

#[async_trait]
impl UpsertBatch<NewBrand> for AsyncPgConnection {
    async fn upsert_batch(&mut self, rows: &[NewBrand]) -> QueryResult<usize> {
        use crate::schema::brands::dsl::*;

        diesel::insert_into(brands)
            .values(rows)
            .on_conflict(code)
            .do_update()
            .set((
                date.eq(excluded(date)),
                company_name.eq(excluded(company_name)),
                company_name_english.eq(excluded(company_name_english)),
                sector17_code.eq(excluded(sector17_code)),
                sector17_code_name.eq(excluded(sector17_code_name)),
                sector33_code.eq(excluded(sector33_code)),
                sector33_code_name.eq(excluded(sector33_code_name)),
                scale_category.eq(excluded(scale_category)),
                market_code.eq(excluded(market_code)),
                market_code_name.eq(excluded(market_code_name)),
                updated_at.eq(diesel::dsl::now),
                deleted_at.eq(None::<DateTime<Utc>>),
            ))
            .execute(self)
            .await
    }
}

#[async_trait]
impl UpsertBatch<NewPrice> for AsyncPgConnection {
    async fn upsert_batch(&mut self, rows: &[NewPrice]) -> QueryResult<usize> {
        use crate::schema::prices::dsl::*;

        diesel::insert_into(prices)
            .values(rows)
            .on_conflict((date, code))
            .do_update()
            .set((
                open.eq(excluded(open)),
                high.eq(excluded(high)),
                low.eq(excluded(low)),
                close.eq(excluded(close)),
                volume.eq(excluded(volume)),
                turnover_value.eq(excluded(turnover_value)),
                adjustment_factor.eq(excluded(adjustment_factor)),
                adjustment_open.eq(excluded(adjustment_open)),
                adjustment_high.eq(excluded(adjustment_high)),
                adjustment_low.eq(excluded(adjustment_low)),
                adjustment_close.eq(excluded(adjustment_close)),
                adjustment_volume.eq(excluded(adjustment_volume)),
                updated_at.eq(diesel::dsl::now),
                deleted_at.eq(None::<DateTime<Utc>>),
            ))
            .execute(self)
            .await
    }
}

/// Upserts `rows` in order, [`CHUNK_SIZE`] rows per statement.
///
/// Returns the number of rows written. The first failing batch aborts the
/// load; rolling back the enclosing transaction is the caller's job.
pub async fn upsert_chunked<R, T>(target: &mut T, rows: Vec<R>) -> QueryResult<usize>
where
    R: NaturalKey + Send + Sync,
    T: UpsertBatch<R> + ?Sized,
{
    let rows = dedup_by_natural_key(rows);

    let mut written = 0;
    for (index, chunk) in rows.chunks(CHUNK_SIZE).enumerate() {
        written += target.upsert_batch(chunk).await?;
        debug!(chunk = index, rows = chunk.len(), "upserted chunk");
    }
    Ok(written)
}

/// Postgres refuses to let one `ON CONFLICT DO UPDATE` touch a row twice, so
/// duplicates are folded before batching.
fn dedup_by_natural_key<R: NaturalKey>(rows: Vec<R>) -> Vec<R> {
    let total = rows.len();
    let mut by_key: IndexMap<R::Key, R> = IndexMap::with_capacity(total);
    for row in rows {
        by_key.insert(row.natural_key(), row);
    }
    if by_key.len() < total {
        debug!(dropped = total - by_key.len(), "collapsed duplicate natural keys");
    }
    by_key.into_values().collect()
}

/// Looks up the stored brand for `code`.
pub async fn find_brand(conn: &mut AsyncPgConnection, code: &str) -> QueryResult<Option<Brand>> {
    brands::table
        .filter(brands::code.eq(code))
        .select(Brand::as_select())
        .first(conn)
        .await
        .optional()
}

/// Looks up the stored price for `(date, code)`.
pub async fn find_price(
    conn: &mut AsyncPgConnection,
    date: NaiveDate,
    code: &str,
) -> QueryResult<Option<Price>> {
    prices::table
        .filter(prices::date.eq(date).and(prices::code.eq(code)))
        .select(Price::as_select())
        .first(conn)
        .await
        .optional()
}

/// Number of stored prices for a trading date.
pub async fn count_prices_on(conn: &mut AsyncPgConnection, date: NaiveDate) -> QueryResult<i64> {
    prices::table
        .filter(prices::date.eq(date))
        .count()
        .get_result(conn)
        .await
}

#[cfg(test)]
mod tests {
    use diesel::result::Error as DieselError;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        key: u32,
        value: &'static str,
    }

    impl NaturalKey for Row {
        type Key = u32;

        fn natural_key(&self) -> u32 {
            self.key
        }
    }

    /// Records every statement instead of running it.
    #[derive(Default)]
    struct Recorder {
        statements: Vec<Vec<Row>>,
        fail_on: Option<usize>,
    }

    #[async_trait]
    impl UpsertBatch<Row> for Recorder {
        async fn upsert_batch(&mut self, rows: &[Row]) -> QueryResult<usize> {
            if self.fail_on == Some(self.statements.len()) {
                return Err(DieselError::RollbackTransaction);
            }
            self.statements.push(rows.to_vec());
            Ok(rows.len())
        }
    }

    fn rows(n: u32) -> Vec<Row> {
        (0..n).map(|key| Row { key, value: "v" }).collect()
    }

    #[tokio::test]
    async fn splits_250_rows_into_100_100_50() {
        let mut target = Recorder::default();
        let written = upsert_chunked(&mut target, rows(250)).await.unwrap();

        assert_eq!(written, 250);
        let sizes: Vec<usize> = target.statements.iter().map(Vec::len).collect();
        assert_eq!(sizes, [100, 100, 50]);

        let keys: Vec<u32> = target.statements.concat().iter().map(|r| r.key).collect();
        assert_eq!(keys, (0..250).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn exact_multiple_has_no_trailing_empty_statement() {
        let mut target = Recorder::default();
        upsert_chunked(&mut target, rows(200)).await.unwrap();
        assert_eq!(target.statements.len(), 2);
    }

    #[tokio::test]
    async fn empty_input_issues_no_statement() {
        let mut target = Recorder::default();
        assert_eq!(upsert_chunked(&mut target, Vec::<Row>::new()).await.unwrap(), 0);
        assert!(target.statements.is_empty());
    }

    #[tokio::test]
    async fn later_duplicate_wins_in_first_position() {
        let mut target = Recorder::default();
        let input = vec![
            Row { key: 1, value: "old" },
            Row { key: 2, value: "b" },
            Row { key: 1, value: "new" },
        ];
        upsert_chunked(&mut target, input).await.unwrap();

        assert_eq!(
            target.statements,
            vec![vec![Row { key: 1, value: "new" }, Row { key: 2, value: "b" }]]
        );
    }

    #[tokio::test]
    async fn failing_batch_stops_the_load() {
        let mut target = Recorder {
            fail_on: Some(1),
            ..Recorder::default()
        };
        assert!(upsert_chunked(&mut target, rows(250)).await.is_err());
        assert_eq!(target.statements.len(), 1);
    }

    proptest::proptest! {
        #[test]
        fn statement_count_is_ceil_of_distinct_rows(n in 0u32..600) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let mut target = Recorder::default();
            runtime.block_on(upsert_chunked(&mut target, rows(n))).unwrap();

            let n = n as usize;
            proptest::prop_assert_eq!(target.statements.len(), n.div_ceil(CHUNK_SIZE));
            proptest::prop_assert!(target.statements.iter().all(|s| !s.is_empty() && s.len() <= CHUNK_SIZE));
            proptest::prop_assert_eq!(target.statements.iter().map(Vec::len).sum::<usize>(), n);
        }
    }

    #[test]
    fn price_key_is_date_and_code() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let price = NewPrice {
            date,
            code: "1234".into(),
            open: None,
            high: None,
            low: None,
            close: None,
            volume: None,
            turnover_value: None,
            adjustment_factor: None,
            adjustment_open: None,
            adjustment_high: None,
            adjustment_low: None,
            adjustment_close: None,
            adjustment_volume: None,
        };
        assert_eq!(price.natural_key(), (date, "1234".to_string()));
    }

    #[test]
    fn price_lookup_sql_uses_both_key_columns() {
        let date = NaiveDate::from_ymd_opt(2023, 3, 24).unwrap();
        let query = prices::table
            .filter(prices::date.eq(date).and(prices::code.eq("1301")))
            .select(Price::as_select());
        let sql = diesel::debug_query::<diesel::pg::Pg, _>(&query).to_string();

        assert!(sql.contains(r#"FROM "prices""#), "{sql}");
        assert!(sql.contains(r#""prices"."date" = $1"#), "{sql}");
        assert!(sql.contains(r#""prices"."code" = $2"#), "{sql}");
    }
}
