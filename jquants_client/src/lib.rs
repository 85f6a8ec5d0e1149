//! Client for the J-Quants market data API.
//!
//! - [`models`]: wire records plus the `YYYY-MM-DD` date and exact-decimal codecs.
//! - [`api`]: the [`JQuantsApi`](api::JQuantsApi) transport trait and its reqwest implementation.
//! - [`client`]: token lifecycle with transparent recovery from HTTP 401.
//! - [`pagination`]: lazy cursor-following over daily quotes.

pub mod api;
pub mod client;
pub mod errors;
pub mod models;
pub mod pagination;
pub mod session;

pub use api::{HttpApi, HttpApiConfig, JQuantsApi};
pub use client::Client;
pub use errors::{ApiError, ClientError};
pub use pagination::DailyQuotePages;
pub use session::Credentials;
