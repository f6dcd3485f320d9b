use async_trait::async_trait;

use crate::Result;

/// Remote or local semantic-similarity capability.
#[async_trait]
pub trait SimilarityScorer: Send + Sync {
    fn name(&self) -> &str;

    /// Similarity of `query` against each title, in title order.
    async fn similarity(&self, query: &str, titles: &[String]) -> Result<Vec<f64>>;
}
