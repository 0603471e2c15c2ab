use async_trait::async_trait;

use crate::FetchError;

/// Upstream provider of the raw feed text.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_raw(&self) -> Result<String, FetchError>;
}
