use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use scraper::Html;
use sc_core::types::{
    format_date, ABSTRACT_NOT_AVAILABLE, AUTHORS_NOT_AVAILABLE, DATE_FORMAT, DOI_NOT_AVAILABLE,
    PAGE_SIZE, TITLE_NOT_AVAILABLE,
};
use sc_core::{
    ArticleAbstract, ContentBlock, Result, RawArticle, SearchPage, SearchQuery, SortOrder, Source,
    StructuredDocument,
};
use tracing::debug;

use super::blocks::{body_blocks, labelled_paragraph};
use super::{doc_attr, doc_text, fetch_html, first_attr, first_text, parse_count, selector};
use super::{SourceAdapter, SourcesConfig};
use crate::logging::Logger;

pub const BASE_URL: &str = "https://www.medrxiv.org";

pub fn search_url(base_url: &str, query: &SearchQuery) -> String {
    let term: String = url::form_urlencoded::byte_serialize(query.query.as_bytes()).collect();
    let date_filter = match query.date_range() {
        Some((start, end)) => format!(
            "limit_from%3A{}%20limit_to%3A{}%20",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        ),
        None => String::new(),
    };
    let sort = match query.sort {
        SortOrder::Recent => "publication-date%20direction%3Adescending",
        SortOrder::Oldest => "publication-date%20direction%3Aascending",
        SortOrder::Relevance => "relevance-rank",
    };

    // medRxiv pages are zero-based.
    format!(
        "{}/search/{}%20jcode%3Amedrxiv%20{}numresults%3A{}%20sort%3A{}%20format_result%3Astandard?page={}",
        base_url,
        term,
        date_filter,
        PAGE_SIZE,
        sort,
        query.page.saturating_sub(1)
    )
}

fn absolute(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}{}", base_url, href)
    }
}

fn strip_doi_label(raw: &str) -> String {
    raw.replace("doi:", "").trim().to_string()
}

/// medRxiv DOIs end in `YYYY.MM.DD.nnnnnnnn`.
fn date_from_doi(doi: &str) -> Option<String> {
    let suffix = doi.rsplit('/').next()?;
    let parts: Vec<&str> = suffix.split('.').take(3).collect();
    if parts.len() != 3 {
        return None;
    }
    NaiveDate::parse_from_str(&parts.join("-"), "%Y-%m-%d").ok().map(format_date)
}

pub fn parse_listing(html: &str, base_url: &str) -> Result<SearchPage> {
    let document = Html::parse_document(html);
    let total_results = doc_text(&document, "h1#page-title")?
        .map(|t| parse_count(&t))
        .unwrap_or(0);

    let rows = selector("div.highwire-article-citation")?;
    let mut articles = Vec::new();
    for row in document.select(&rows) {
        if articles.len() == PAGE_SIZE {
            break;
        }
        let Some(href) = first_attr(row, "a.highwire-cite-linked-title", "href")? else {
            continue;
        };
        let title = first_text(row, "span.highwire-cite-title")?.unwrap_or_else(|| TITLE_NOT_AVAILABLE.to_string());
        let mut article = RawArticle::new(Source::MedRxiv, title, absolute(base_url, &href));
        article.authors =
            first_text(row, "div.highwire-cite-authors")?.unwrap_or_else(|| AUTHORS_NOT_AVAILABLE.to_string());

        if let Some(doi) = first_text(row, "span.highwire-cite-metadata-doi")? {
            let doi = strip_doi_label(&doi);
            if let Some(date) = date_from_doi(&doi) {
                article.date = date;
            }
            article.doi = doi;
        }
        if let Some(posted) = first_text(row, "span.highwire-cite-metadata-pages")? {
            if let Ok(date) = NaiveDate::parse_from_str(&posted, DATE_FORMAT) {
                article.date = format_date(date);
            }
        }
        articles.push(article);
    }

    Ok(SearchPage { articles, total_results })
}

pub fn parse_abstract(html: &str, url: &str, base_url: &str) -> Result<ArticleAbstract> {
    let document = Html::parse_document(html);
    let title = doc_text(&document, "h1.highwire-cite-title")?.unwrap_or_else(|| TITLE_NOT_AVAILABLE.to_string());
    let doi = doc_attr(&document, "meta[name='citation_doi']", "content")?
        .unwrap_or_else(|| DOI_NOT_AVAILABLE.to_string());

    let author_sel = selector("meta[name='citation_author']")?;
    let mut authors: Vec<String> = document
        .select(&author_sel)
        .filter_map(|m| m.value().attr("content"))
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();
    if authors.is_empty() {
        authors.push(AUTHORS_NOT_AVAILABLE.to_string());
    }

    let mut abstract_blocks = Vec::new();
    if let Some(heading) = doc_text(&document, "div.abstract h2")? {
        abstract_blocks.push(ContentBlock::Subsubheading(heading));
    }
    let paragraphs = selector("div.abstract p")?;
    for p in document.select(&paragraphs) {
        abstract_blocks.extend(labelled_paragraph(p)?);
    }
    if abstract_blocks.is_empty() {
        abstract_blocks.push(ContentBlock::Text(ABSTRACT_NOT_AVAILABLE.to_string()));
    }

    let full_text_url = doc_attr(&document, "a.panels-ajax-tab-tab[href*='full-text']", "href")?
        .map(|href| absolute(base_url, &href))
        .unwrap_or_else(|| url.to_string());

    Ok(ArticleAbstract {
        title,
        doi,
        authors,
        abstract_blocks,
        full_text_url,
    })
}

fn heading(level: u8, text: String) -> ContentBlock {
    match level {
        2 => ContentBlock::Heading(text),
        3 => ContentBlock::Subheading(text),
        _ => ContentBlock::Subsubheading(text),
    }
}

pub fn parse_detail(html: &str, url: &str) -> Result<StructuredDocument> {
    let document = Html::parse_document(html);
    let mut blocks = Vec::new();

    let title = doc_text(&document, "h1.highwire-cite-title")?;
    if let Some(title) = &title {
        blocks.push(ContentBlock::Title(title.clone()));
    }
    if let Some(doi) = doc_text(&document, "span.highwire-cite-metadata-doi")? {
        blocks.push(ContentBlock::Doi(strip_doi_label(&doi)));
    }
    if let Some(citation) = doc_text(&document, "div.highwire-citation-info")? {
        let citation = match &title {
            Some(title) => citation.replace(title.as_str(), ""),
            None => citation,
        };
        let citation = citation.trim();
        if !citation.is_empty() {
            blocks.push(ContentBlock::Citation(citation.to_string()));
        }
    }
    blocks.extend(body_blocks(&document, "div.article.fulltext-view", heading)?);

    Ok(StructuredDocument {
        source: Source::MedRxiv,
        url: url.to_string(),
        blocks,
    })
}

pub struct MedRxivAdapter {
    client: Client,
    base_url: String,
    logger: Logger,
}

impl MedRxivAdapter {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        Ok(Self {
            client: config.http_client()?,
            base_url: config.medrxiv_base_url.trim_end_matches('/').to_string(),
            logger: Logger::new().with_prefix("[MedRxiv]".to_string()),
        })
    }
}

impl fmt::Debug for MedRxivAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MedRxivAdapter")
            .field("client", &"<reqwest::Client>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl SourceAdapter for MedRxivAdapter {
    fn source(&self) -> Source {
        Source::MedRxiv
    }

    fn can_handle(&self, url: &str) -> bool {
        url.contains("medrxiv.org") || url.contains("biorxiv.org")
    }

    async fn try_search(&self, query: &SearchQuery) -> Result<SearchPage> {
        let url = search_url(&self.base_url, query);
        debug!("🔗 MedRxiv search URL: {}", url);
        let html = fetch_html(&self.client, Source::MedRxiv, &url).await?;
        let page = parse_listing(&html, &self.base_url)?;
        self.logger.info(&format!(
            "📚 {} articles on page {} ({} total)",
            page.articles.len(),
            query.page,
            page.total_results
        ));
        Ok(page)
    }

    async fn fetch_abstract(&self, url: &str) -> Result<ArticleAbstract> {
        self.logger.debug(&format!("📄 Fetching abstract {}", url));
        let html = fetch_html(&self.client, Source::MedRxiv, url).await?;
        parse_abstract(&html, url, &self.base_url)
    }

    async fn fetch_detail(&self, url: &str) -> Result<StructuredDocument> {
        self.logger.debug(&format!("📖 Fetching full text {}", url));
        let html = fetch_html(&self.client, Source::MedRxiv, url).await?;
        parse_detail(&html, url)
    }
}
