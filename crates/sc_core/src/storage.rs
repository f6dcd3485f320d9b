use async_trait::async_trait;

use crate::types::{RatingPage, RatingRecord};
use crate::Result;

/// Read side of the community rating store.
#[async_trait]
pub trait RatingStore: Send + Sync {
    /// One page of the full scan, starting after `continuation`.
    async fn scan_page(&self, continuation: Option<String>) -> Result<RatingPage>;

    /// Full scan, following continuation keys until the store reports none.
    async fn scan_all(&self) -> Result<Vec<RatingRecord>> {
        let mut items = Vec::new();
        let mut continuation = None;
        loop {
            let page = self.scan_page(continuation).await?;
            items.extend(page.items);
            match page.continuation {
                Some(next) => continuation = Some(next),
                None => break,
            }
        }
        Ok(items)
    }
}

/// Administrative writes. The aggregator never holds one of these.
#[async_trait]
pub trait RatingWriter: Send + Sync {
    async fn put_rating(&self, record: &RatingRecord) -> Result<()>;
}
