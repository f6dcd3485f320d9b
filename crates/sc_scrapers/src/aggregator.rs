//! Federated search across every registered source.
//!
//! One request moves through
//! `Dispatching → Collecting → Scoring → RatingMerge → Sorting → Done`, or
//! ends in `Failed` when the rating store cannot be read. Source failures
//! and scorer failures never fail the request: a source contributes nothing
//! and an unscored batch keeps its collection order.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use sc_core::ranking;
use sc_core::{
    Error, RatingStore, RawArticle, Result, ScoredArticle, SearchPage, SearchQuery,
    SimilarityScorer, Source,
};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::dispatch::SourceRegistry;
use crate::scrapers::SourceAdapter;

/// Concurrent source calls per request.
pub const DEFAULT_WORKERS: usize = 3;

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Per-source deadline. `None` waits for every source however long it takes.
    pub source_timeout: Option<Duration>,
    pub workers: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            source_timeout: None,
            workers: DEFAULT_WORKERS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggregationOutcome {
    Ranked(Vec<ScoredArticle>),
    NoResults,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Dispatching,
    Collecting,
    Scoring,
    RatingMerge,
    Sorting,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

pub struct Aggregator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    scorer: Arc<dyn SimilarityScorer>,
    ratings: Arc<dyn RatingStore>,
    config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(
        registry: &SourceRegistry,
        scorer: Arc<dyn SimilarityScorer>,
        ratings: Arc<dyn RatingStore>,
        config: AggregatorConfig,
    ) -> Self {
        Self::with_adapters(registry.adapters(), scorer, ratings, config)
    }

    /// Adapters are queried, and their results concatenated, in the given order.
    pub fn with_adapters(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        scorer: Arc<dyn SimilarityScorer>,
        ratings: Arc<dyn RatingStore>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            adapters,
            scorer,
            ratings,
            config,
        }
    }

    pub async fn aggregate(&self, query: &SearchQuery) -> Result<AggregationOutcome> {
        query.validate()?;
        info!("🔎 Aggregating '{}' (page {}, sort {})", query.query, query.page, query.sort);

        match self.run(query).await {
            Ok(outcome) => {
                self.enter(Stage::Done, query);
                Ok(outcome)
            }
            Err(e) => {
                self.enter(Stage::Failed, query);
                error!("❌ Aggregation for '{}' failed: {}", query.query, e);
                Err(e)
            }
        }
    }

    async fn run(&self, query: &SearchQuery) -> Result<AggregationOutcome> {
        self.enter(Stage::Dispatching, query);
        let handles = self.dispatch(query);

        self.enter(Stage::Collecting, query);
        let articles = self.collect(handles).await;
        if articles.is_empty() {
            info!("🫙 No source returned articles for '{}'", query.query);
            return Ok(AggregationOutcome::NoResults);
        }

        self.enter(Stage::Scoring, query);
        let mut scored = self.score(&query.query, articles).await;

        self.enter(Stage::RatingMerge, query);
        let ratings = self.ratings.scan_all().await.map_err(|e| match e {
            Error::StoreUnavailable(_) => e,
            other => Error::StoreUnavailable(other.to_string()),
        })?;
        ranking::merge_ratings(&mut scored, &ratings);

        self.enter(Stage::Sorting, query);
        ranking::rank_order(&mut scored);

        info!("✅ {} ranked articles for '{}'", scored.len(), query.query);
        Ok(AggregationOutcome::Ranked(scored))
    }

    fn enter(&self, stage: Stage, query: &SearchQuery) {
        debug!("🧭 {} (query '{}')", stage, query.query);
    }

    /// Spawns one task per adapter. The worker pool belongs to this call only.
    fn dispatch(&self, query: &SearchQuery) -> Vec<(Source, JoinHandle<SearchPage>)> {
        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));
        self.adapters
            .iter()
            .map(|adapter| {
                let adapter = Arc::clone(adapter);
                let semaphore = Arc::clone(&semaphore);
                let query = query.clone();
                let timeout = self.config.source_timeout;
                let source = adapter.source();

                let handle = tokio::spawn(async move {
                    let _permit = match semaphore.acquire().await {
                        Ok(permit) => permit,
                        Err(_) => return SearchPage::empty(),
                    };
                    match timeout {
                        Some(limit) => match tokio::time::timeout(limit, adapter.search(&query)).await {
                            Ok(page) => page,
                            Err(_) => {
                                warn!("⏱️ [{}] no answer within {:?}, contributing no results", source, limit);
                                SearchPage::empty()
                            }
                        },
                        None => adapter.search(&query).await,
                    }
                });
                (source, handle)
            })
            .collect()
    }

    /// Join barrier: waits for every task, keeping adapter order.
    async fn collect(&self, handles: Vec<(Source, JoinHandle<SearchPage>)>) -> Vec<RawArticle> {
        let (sources, handles): (Vec<Source>, Vec<_>) = handles.into_iter().unzip();
        let results = join_all(handles).await;

        let mut articles = Vec::new();
        for (source, result) in sources.into_iter().zip(results) {
            match result {
                Ok(page) => {
                    debug!("📥 [{}] {} articles ({} reported)", source, page.articles.len(), page.total_results);
                    articles.extend(page.articles);
                }
                Err(e) => warn!("💥 [{}] search task aborted, contributing no results: {}", source, e),
            }
        }
        articles
    }

    async fn score(&self, query: &str, articles: Vec<RawArticle>) -> Vec<ScoredArticle> {
        let titles: Vec<String> = articles.iter().map(|a| a.title.clone()).collect();
        match self.scorer.similarity(query, &titles).await {
            Ok(similarities) => {
                if similarities.len() != titles.len() {
                    warn!(
                        "⚠️ Scorer '{}' returned {} scores for {} titles",
                        self.scorer.name(),
                        similarities.len(),
                        titles.len()
                    );
                }
                ranking::score_articles(articles, &similarities)
            }
            Err(e) => {
                warn!("⚠️ Scoring unavailable ({}), keeping collection order", e);
                articles.into_iter().map(ScoredArticle::from).collect()
            }
        }
    }
}
