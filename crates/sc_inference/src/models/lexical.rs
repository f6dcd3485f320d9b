use std::collections::HashSet;

use async_trait::async_trait;

use sc_core::{Result, SimilarityScorer};

/// Offline scorer: Jaccard overlap of lowercase word sets.
#[derive(Debug, Default, Clone)]
pub struct LexicalScorer;

impl LexicalScorer {
    pub fn new() -> Self {
        Self
    }
}

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

#[async_trait]
impl SimilarityScorer for LexicalScorer {
    fn name(&self) -> &str {
        "lexical"
    }

    async fn similarity(&self, query: &str, titles: &[String]) -> Result<Vec<f64>> {
        let query = tokens(query);
        Ok(titles.iter().map(|t| jaccard(&query, &tokens(t))).collect())
    }
}
