use std::sync::Arc;

use sc_core::{ArticleAbstract, Error, Result, Source, StructuredDocument};
use tracing::{info, warn};

use crate::scrapers::{MedRxivAdapter, PlosAdapter, PubMedAdapter, SourceAdapter, SourcesConfig};

/// One adapter per [`Source`], fixed at construction.
#[derive(Clone)]
pub struct SourceRegistry {
    pubmed: Arc<dyn SourceAdapter>,
    medrxiv: Arc<dyn SourceAdapter>,
    plos: Arc<dyn SourceAdapter>,
}

impl SourceRegistry {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        for source in config.unconfigured_sources() {
            warn!("⚠️ {} has no endpoint configured and will contribute no results", source);
        }
        info!("🗂️ Building source registry");
        Ok(Self::from_adapters(
            Arc::new(PubMedAdapter::new(config)?),
            Arc::new(MedRxivAdapter::new(config)?),
            Arc::new(PlosAdapter::new(config)?),
        ))
    }

    pub fn from_adapters(
        pubmed: Arc<dyn SourceAdapter>,
        medrxiv: Arc<dyn SourceAdapter>,
        plos: Arc<dyn SourceAdapter>,
    ) -> Self {
        Self { pubmed, medrxiv, plos }
    }

    pub fn adapter(&self, source: Source) -> Arc<dyn SourceAdapter> {
        match source {
            Source::PubMed => Arc::clone(&self.pubmed),
            Source::MedRxiv => Arc::clone(&self.medrxiv),
            Source::Plos => Arc::clone(&self.plos),
        }
    }

    /// All adapters in aggregation order.
    pub fn adapters(&self) -> Vec<Arc<dyn SourceAdapter>> {
        Source::ALL.iter().map(|s| self.adapter(*s)).collect()
    }

    /// The source whose adapter recognizes `url`, if any.
    pub fn source_for_url(&self, url: &str) -> Option<Source> {
        Source::ALL
            .into_iter()
            .find(|s| self.adapter(*s).can_handle(url))
    }

    pub async fn fetch_abstract(&self, source: Source, url: &str) -> Result<ArticleAbstract> {
        let url = require_url(url)?;
        info!("📄 [{}] abstract for {}", source, url);
        self.adapter(source).fetch_abstract(url).await
    }

    pub async fn fetch_detail(&self, source: Source, url: &str) -> Result<StructuredDocument> {
        let url = require_url(url)?;
        info!("📖 [{}] full text for {}", source, url);
        self.adapter(source).fetch_detail(url).await
    }
}

fn require_url(url: &str) -> Result<&str> {
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::InvalidRequest("Missing required parameter 'url'.".to_string()));
    }
    Ok(url)
}
