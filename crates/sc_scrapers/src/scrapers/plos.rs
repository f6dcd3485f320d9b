use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use scraper::Html;
use serde::Deserialize;
use serde_json::Value;
use sc_core::types::{
    format_date, ABSTRACT_NOT_AVAILABLE, AUTHORS_NOT_AVAILABLE, DATE_NOT_AVAILABLE,
    DOI_NOT_AVAILABLE, PAGE_SIZE, TITLE_NOT_AVAILABLE,
};
use sc_core::{
    ArticleAbstract, ContentBlock, Error, Result, RawArticle, SearchPage, SearchQuery, Source,
    StructuredDocument,
};
use tracing::{debug, warn};

use super::blocks::body_blocks;
use super::{doc_attr, doc_text, fetch_html, selector, text_of};
use super::{SourceAdapter, SourcesConfig};
use crate::logging::Logger;

/// One row as the listing service reports it.
#[derive(Debug, Deserialize)]
struct ListingItem {
    title: Option<String>,
    link: Option<String>,
    authors: Option<Value>,
    date: Option<String>,
    doi: Option<String>,
    #[serde(default)]
    citation_count: u64,
}

/// `published 12 Mar 2024` becomes `12-Mar-2024`; anything else is kept.
fn listing_date(raw: Option<String>) -> String {
    match raw {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "published %d %b %Y")
            .map(format_date)
            .unwrap_or(raw),
        None => DATE_NOT_AVAILABLE.to_string(),
    }
}

fn listing_authors(raw: Option<Value>) -> String {
    match raw {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Array(names)) if !names.is_empty() => names
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        _ => AUTHORS_NOT_AVAILABLE.to_string(),
    }
}

/// Unwraps the bare array or the `{statusCode, body}` envelope.
fn listing_items(response: Value) -> Result<Vec<Value>> {
    match response {
        Value::Array(items) => Ok(items),
        Value::Object(mut envelope) => {
            let status = envelope.get("statusCode").and_then(Value::as_u64);
            if status != Some(200) {
                debug!("PLOS listing returned status {:?}, treating as empty", status);
                return Ok(Vec::new());
            }
            match envelope.remove("body") {
                Some(Value::String(body)) => Ok(serde_json::from_str(&body)?),
                Some(Value::Array(items)) => Ok(items),
                _ => Ok(Vec::new()),
            }
        }
        other => Err(Error::source_unavailable(
            Source::Plos,
            format!("unexpected listing payload: {}", other),
        )),
    }
}

pub fn parse_listing(response: Value) -> Result<SearchPage> {
    let mut articles = Vec::new();
    for value in listing_items(response)? {
        if articles.len() == PAGE_SIZE {
            break;
        }
        let item: ListingItem = match serde_json::from_value(value) {
            Ok(item) => item,
            Err(e) => {
                warn!("Skipping malformed PLOS row: {}", e);
                continue;
            }
        };
        let Some(link) = item.link.filter(|l| !l.trim().is_empty()) else {
            continue;
        };

        let title = item.title.unwrap_or_else(|| TITLE_NOT_AVAILABLE.to_string());
        let mut article = RawArticle::new(Source::Plos, title, link);
        article.authors = listing_authors(item.authors);
        article.date = listing_date(item.date);
        article.doi = item.doi.unwrap_or_else(|| DOI_NOT_AVAILABLE.to_string());
        article.citation_count = item.citation_count;
        articles.push(article);
    }

    Ok(SearchPage {
        articles,
        total_results: 0,
    })
}

pub fn listing_params(query: &SearchQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("query", query.query.clone()),
        ("page", query.page.to_string()),
        ("sort", query.sort.to_string()),
    ];
    if let Some((start, end)) = query.date_range() {
        params.push(("start_date", start.format("%Y-%m-%d").to_string()));
        params.push(("end_date", end.format("%Y-%m-%d").to_string()));
    }
    if !query.article_types.is_empty() {
        params.push(("article_types", query.article_types.join(",")));
    }
    if !query.subject_areas.is_empty() {
        params.push(("subject_areas", query.subject_areas.join(",")));
    }
    params
}

fn abstract_heading(level: u8, text: String) -> ContentBlock {
    match level {
        2 => ContentBlock::Subsubheading(text),
        _ => ContentBlock::Subsubsubheading(text),
    }
}

pub fn parse_abstract(html: &str, url: &str) -> Result<ArticleAbstract> {
    let document = Html::parse_document(html);
    let title = doc_text(&document, "h1#artTitle")?.unwrap_or_else(|| TITLE_NOT_AVAILABLE.to_string());
    let doi = doc_attr(&document, "li#artDoi a", "href")?.unwrap_or_else(|| DOI_NOT_AVAILABLE.to_string());

    let author_sel = selector("ul#author-list li a.author-name")?;
    let mut authors: Vec<String> = document
        .select(&author_sel)
        .map(|a| text_of(a).replace(',', "").trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();
    if authors.is_empty() {
        authors.push(AUTHORS_NOT_AVAILABLE.to_string());
    }

    let abstract_sel = selector("div.abstract")?;
    let mut abstract_blocks = if document.select(&abstract_sel).next().is_some() {
        body_blocks(&document, "div.abstract", abstract_heading)?
    } else {
        Vec::new()
    };
    if abstract_blocks.is_empty() {
        abstract_blocks.push(ContentBlock::Text(ABSTRACT_NOT_AVAILABLE.to_string()));
    }

    Ok(ArticleAbstract {
        title,
        doi,
        authors,
        abstract_blocks,
        full_text_url: url.to_string(),
    })
}

pub fn parse_detail(html: &str, url: &str) -> Result<StructuredDocument> {
    let document = Html::parse_document(html);
    let mut blocks = Vec::new();
    if let Some(title) = doc_text(&document, "h1#artTitle")? {
        blocks.push(ContentBlock::Title(title));
    }
    blocks.extend(body_blocks(&document, "div.article-text", ContentBlock::heading)?);

    if let Some(published) = doc_text(&document, "li#artPubDate")? {
        blocks.push(ContentBlock::PublicationDate(published));
    }
    if let Some(doi) = doc_attr(&document, "li#artDoi a", "href")? {
        blocks.push(ContentBlock::Doi(doi));
    }
    if let Some(info) = doc_text(&document, "div.articleinfo p")? {
        if let Some(citation) = info.strip_prefix("Citation:") {
            blocks.push(ContentBlock::Citation(citation.trim().to_string()));
        }
    }

    Ok(StructuredDocument {
        source: Source::Plos,
        url: url.to_string(),
        blocks,
    })
}

pub struct PlosAdapter {
    client: Client,
    listing_url: Option<String>,
    logger: Logger,
}

impl PlosAdapter {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        Ok(Self {
            client: config.http_client()?,
            listing_url: config.plos_listing_url.clone(),
            logger: Logger::new().with_prefix("[PLOS]".to_string()),
        })
    }
}

impl fmt::Debug for PlosAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlosAdapter")
            .field("client", &"<reqwest::Client>")
            .field("listing_url", &self.listing_url)
            .finish()
    }
}

#[async_trait]
impl SourceAdapter for PlosAdapter {
    fn source(&self) -> Source {
        Source::Plos
    }

    fn can_handle(&self, url: &str) -> bool {
        url.contains("plos.org")
    }

    async fn try_search(&self, query: &SearchQuery) -> Result<SearchPage> {
        let endpoint = self
            .listing_url
            .as_deref()
            .ok_or_else(|| Error::source_unavailable(Source::Plos, "no listing endpoint configured"))?;

        let response = self
            .client
            .get(endpoint)
            .query(&listing_params(query))
            .send()
            .await
            .map_err(|e| Error::source_unavailable(Source::Plos, e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::source_unavailable(
                Source::Plos,
                format!("listing returned status {}", response.status()),
            ));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::source_unavailable(Source::Plos, e.to_string()))?;

        let page = parse_listing(body)?;
        self.logger.info(&format!("📚 {} articles on page {}", page.articles.len(), query.page));
        Ok(page)
    }

    async fn fetch_abstract(&self, url: &str) -> Result<ArticleAbstract> {
        self.logger.debug(&format!("📄 Fetching abstract {}", url));
        let html = fetch_html(&self.client, Source::Plos, url).await?;
        parse_abstract(&html, url)
    }

    async fn fetch_detail(&self, url: &str) -> Result<StructuredDocument> {
        self.logger.debug(&format!("📖 Fetching full text {}", url));
        let html = fetch_html(&self.client, Source::Plos, url).await?;
        parse_detail(&html, url)
    }
}
