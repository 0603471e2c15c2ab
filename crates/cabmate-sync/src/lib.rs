//! Feed transport: fetches the published spreadsheet export over HTTP.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{FeedClient, FeedError};
