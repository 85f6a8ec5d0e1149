//! Cursor-following pagination over the daily-quote endpoint.
//!
//! [`DailyQuotePages`] yields one page at a time, in server order, and only asks
//! for page N+1 after the caller has taken page N. It cannot be rewound. The
//! first error ends the sequence: the error is returned once and every later
//! [`next_page`](DailyQuotePages::next_page) returns `Ok(None)` without a request.

use tracing::debug;

use crate::{
    api::JQuantsApi,
    client::Client,
    errors::ClientError,
    models::{DailyQuote, DailyQuotesQuery},
};

#[derive(Debug)]
enum Cursor {
    Start,
    Next(String),
    Exhausted,
}

/// Lazy, finite sequence of daily-quote pages for one query.
pub struct DailyQuotePages<'c, A> {
    client: &'c mut Client<A>,
    query: DailyQuotesQuery,
    cursor: Cursor,
    pages_fetched: usize,
}

impl<'c, A: JQuantsApi> DailyQuotePages<'c, A> {
    pub(crate) fn new(client: &'c mut Client<A>, mut query: DailyQuotesQuery) -> Self {
        query.pagination_key = None;
        Self {
            client,
            query,
            cursor: Cursor::Start,
            pages_fetched: 0,
        }
    }

    /// Fetches the next page, `Ok(None)` once the last page has been returned.
    pub async fn next_page(&mut self) -> Result<Option<Vec<DailyQuote>>, ClientError> {
        let query = match std::mem::replace(&mut self.cursor, Cursor::Exhausted) {
            Cursor::Exhausted => return Ok(None),
            Cursor::Start => self.query.clone(),
            Cursor::Next(key) => self.query.clone().with_pagination_key(key),
        };

        let page = self.client.fetch_quote_page(&query).await?;
        self.pages_fetched += 1;

        if let Some(key) = page.next_cursor() {
            self.cursor = Cursor::Next(key.to_string());
        }
        debug!(
            page = self.pages_fetched,
            rows = page.daily_quotes.len(),
            more = matches!(self.cursor, Cursor::Next(_)),
            "daily quotes page received"
        );

        Ok(Some(page.daily_quotes))
    }

    /// Pages returned so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Drains every page into one vector. Meant for small queries (one issue,
    /// short period); bulk loads should consume page by page.
    pub async fn collect_all(mut self) -> Result<Vec<DailyQuote>, ClientError> {
        let mut rows = Vec::new();
        while let Some(page) = self.next_page().await? {
            rows.extend(page);
        }
        Ok(rows)
    }
}
