//! Wire models and value codecs for the J-Quants API.

pub mod brand;
pub mod daily_quote;
pub mod date;
pub mod decimal;

pub use brand::{BrandInfo, ListBrandsQuery, ListBrandsResponse};
pub use daily_quote::{DailyQuote, DailyQuotesQuery, DailyQuotesResponse};
pub use date::{Date, DateFormatError};
