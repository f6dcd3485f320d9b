use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use sc_core::{RatingPage, RatingRecord, RatingStore, RatingWriter, Result};
use tokio::sync::RwLock;

use crate::DEFAULT_SCAN_PAGE_SIZE;

/// In-process rating store with keyset pagination ordered by URL.
pub struct MemoryRatingStore {
    ratings: RwLock<BTreeMap<String, f64>>,
    page_size: usize,
}

impl MemoryRatingStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_SCAN_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            ratings: RwLock::new(BTreeMap::new()),
            page_size: page_size.max(1),
        }
    }

    pub fn from_records(records: impl IntoIterator<Item = RatingRecord>) -> Self {
        let ratings = records
            .into_iter()
            .map(|r| (r.url, r.average_rating))
            .collect();
        Self {
            ratings: RwLock::new(ratings),
            page_size: DEFAULT_SCAN_PAGE_SIZE,
        }
    }

    pub async fn len(&self) -> usize {
        self.ratings.read().await.len()
    }
}

impl Default for MemoryRatingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RatingStore for MemoryRatingStore {
    async fn scan_page(&self, continuation: Option<String>) -> Result<RatingPage> {
        let ratings = self.ratings.read().await;
        let lower = match &continuation {
            Some(key) => Bound::Excluded(key.clone()),
            None => Bound::Unbounded,
        };

        let items: Vec<RatingRecord> = ratings
            .range((lower, Bound::Unbounded))
            .take(self.page_size)
            .map(|(url, rating)| RatingRecord {
                url: url.clone(),
                average_rating: *rating,
            })
            .collect();

        let continuation = match items.last() {
            Some(last) if ratings.range((Bound::Excluded(last.url.clone()), Bound::Unbounded)).next().is_some() => {
                Some(last.url.clone())
            }
            _ => None,
        };

        Ok(RatingPage { items, continuation })
    }
}

#[async_trait]
impl RatingWriter for MemoryRatingStore {
    async fn put_rating(&self, record: &RatingRecord) -> Result<()> {
        let mut ratings = self.ratings.write().await;
        ratings.insert(record.url.clone(), record.average_rating);
        Ok(())
    }
}
