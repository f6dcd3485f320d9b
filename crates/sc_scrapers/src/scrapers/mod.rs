use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use sc_core::{ArticleAbstract, Error, Result, SearchPage, SearchQuery, Source, StructuredDocument};
use tracing::warn;

pub mod blocks;
pub mod medrxiv;
pub mod plos;
pub mod pubmed;

pub use medrxiv::MedRxivAdapter;
pub use plos::PlosAdapter;
pub use pubmed::PubMedAdapter;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Upstream endpoints and HTTP settings shared by the adapters.
#[derive(Debug, Clone)]
pub struct SourcesConfig {
    pub pubmed_base_url: String,
    pub medrxiv_base_url: String,
    /// PLOS listing service. Without one, PLOS contributes nothing.
    pub plos_listing_url: Option<String>,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            pubmed_base_url: pubmed::BASE_URL.to_string(),
            medrxiv_base_url: medrxiv::BASE_URL.to_string(),
            plos_listing_url: None,
            request_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl SourcesConfig {
    /// Sources that will return nothing because their endpoint is missing.
    pub fn unconfigured_sources(&self) -> Vec<Source> {
        let mut missing = Vec::new();
        if self.plos_listing_url.as_deref().map_or(true, |u| u.trim().is_empty()) {
            missing.push(Source::Plos);
        }
        missing
    }

    pub fn http_client(&self) -> Result<Client> {
        Ok(Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(self.request_timeout)
            .build()?)
    }
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> Source;

    /// Returns true if this adapter can fetch details for the given URL
    fn can_handle(&self, url: &str) -> bool;

    /// One page of listing results, or the failure that prevented it.
    async fn try_search(&self, query: &SearchQuery) -> Result<SearchPage>;

    /// Never fails: an upstream problem degrades to an empty page.
    async fn search(&self, query: &SearchQuery) -> SearchPage {
        match self.try_search(query).await {
            Ok(page) => page,
            Err(e) => {
                warn!("⚠️ [{}] search failed, contributing no results: {}", self.source(), e);
                SearchPage::empty()
            }
        }
    }

    async fn fetch_abstract(&self, url: &str) -> Result<ArticleAbstract>;

    async fn fetch_detail(&self, url: &str) -> Result<StructuredDocument>;
}

/// GETs a page body, treating any non-200 status as the source being down.
pub(crate) async fn fetch_html(client: &Client, source: Source, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::source_unavailable(source, e.to_string()))?;

    if response.status() != StatusCode::OK {
        return Err(Error::source_unavailable(
            source,
            format!("{} returned status {}", url, response.status()),
        ));
    }

    response
        .text()
        .await
        .map_err(|e| Error::source_unavailable(source, e.to_string()))
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Parse(format!("Invalid selector '{}': {:?}", css, e)))
}

/// Element text with runs of whitespace collapsed.
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn first_text(scope: ElementRef<'_>, css: &str) -> Result<Option<String>> {
    let sel = selector(css)?;
    Ok(scope.select(&sel).next().map(text_of).filter(|t| !t.is_empty()))
}

pub(crate) fn first_attr(scope: ElementRef<'_>, css: &str, attr: &str) -> Result<Option<String>> {
    let sel = selector(css)?;
    Ok(scope
        .select(&sel)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

pub(crate) fn doc_text(document: &Html, css: &str) -> Result<Option<String>> {
    first_text(document.root_element(), css)
}

pub(crate) fn doc_attr(document: &Html, css: &str, attr: &str) -> Result<Option<String>> {
    first_attr(document.root_element(), css, attr)
}

/// Reads a count like `of 1,234` or `5,678 Results`.
pub(crate) fn parse_count(text: &str) -> u64 {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("of 1,234"), 1234);
        assert_eq!(parse_count("5,678 Results"), 5678);
        assert_eq!(parse_count("no results"), 0);
    }

    #[test]
    fn test_text_of_collapses_whitespace() {
        let document = Html::parse_fragment("<p>  Cancer\n   <b>immuno</b>therapy  trial </p>");
        let p = doc_text(&document, "p").unwrap();
        assert_eq!(p.as_deref(), Some("Cancer immunotherapy trial"));
    }

    #[test]
    fn test_unconfigured_sources() {
        let config = SourcesConfig::default();
        assert_eq!(config.unconfigured_sources(), vec![Source::Plos]);

        let config = SourcesConfig {
            plos_listing_url: Some("http://listing.local/".to_string()),
            ..SourcesConfig::default()
        };
        assert!(config.unconfigured_sources().is_empty());
    }

    #[test]
    fn test_missing_elements_are_none() {
        let document = Html::parse_document("<html><body><a>no href</a></body></html>");
        assert_eq!(doc_attr(&document, "a", "href").unwrap(), None);
        assert_eq!(doc_text(&document, "h1").unwrap(), None);
        assert!(selector("::::").is_err());
    }
}
