use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use scraper::Html;
use sc_core::types::{
    format_date, ABSTRACT_NOT_AVAILABLE, AUTHORS_NOT_AVAILABLE, DOI_NOT_AVAILABLE, PAGE_SIZE,
    TITLE_NOT_AVAILABLE,
};
use sc_core::{
    ArticleAbstract, ContentBlock, Result, RawArticle, SearchPage, SearchQuery, SortOrder, Source,
    StructuredDocument,
};
use tracing::{debug, warn};

use super::blocks::{body_blocks, dedupe, labelled_paragraph};
use super::{doc_attr, doc_text, fetch_html, first_text, parse_count, selector, text_of};
use super::{SourceAdapter, SourcesConfig};
use crate::logging::Logger;

pub const BASE_URL: &str = "https://pubmed.ncbi.nlm.nih.gov/";

/// PubMed publication-type filters, keyed by the label users pick from.
const ARTICLE_TYPES: [(&str, &str); 24] = [
    ("Adaptive Clinical Trial", "pubt.adaptiveclinicaltrial"),
    ("Clinical Study", "pubt.clinicalstudy"),
    ("Observational Study", "pubt.observationalstudy"),
    ("Randomized Controlled Trial", "pubt.randomizedcontrolledtrial"),
    ("Comparative Study", "pubt.comparativestudy"),
    ("Published Erratum", "pubt.publishederratum"),
    ("Corrected and Republished Article", "pubt.correctedrepublishedarticle"),
    ("Review", "pubt.review"),
    ("Systematic Review", "pubt.systematicreview"),
    ("Meta-Analysis", "pubt.metaanalysis"),
    ("Editorial", "pubt.editorial"),
    ("Personal Narrative", "pubt.personalnarrative"),
    ("Comment", "pubt.comment"),
    ("Letter", "pubt.letter"),
    ("Practice Guideline", "pubt.practiceguideline"),
    ("Guideline", "pubt.guideline"),
    ("Consensus Development Conference", "pubt.consensusdevelopmentconference"),
    ("Case Reports", "pubt.casereports"),
    ("Historical Article", "pubt.historicalarticle"),
    ("Interview", "pubt.interview"),
    ("Congress", "pubt.congress"),
    ("Technical Report", "pubt.technicalreport"),
    ("Dataset", "pubt.dataset"),
    ("Video-Audio Media", "pubt.videoaudiomedia"),
];

const FREE_FULL_TEXT: &str = "&filter=simsearch1.fha&filter=simsearch2.ffrft";

lazy_static! {
    static ref CITATION_DATE: Regex =
        Regex::new(r"\b(\d{4} [A-Za-z]{3,4}(?: \d{1,2})?)\b").expect("citation date pattern");
}

fn article_type_filter(label: &str) -> Option<&'static str> {
    ARTICLE_TYPES
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, filter)| *filter)
}

pub fn search_url(base_url: &str, query: &SearchQuery) -> String {
    let term: String = url::form_urlencoded::byte_serialize(query.query.as_bytes()).collect();
    let mut url = format!("{}?term={}&page={}", base_url, term, query.page);

    if let Some((start, end)) = query.date_range() {
        url.push_str(&format!(
            "&filter=dates.{}-{}",
            start.format("%Y%%2F%m%%2F%d"),
            end.format("%Y%%2F%m%%2F%d")
        ));
    }

    match query.sort {
        SortOrder::Recent => {
            url.push_str(FREE_FULL_TEXT);
            url.push_str("&sort=date");
        }
        SortOrder::Oldest => url.push_str("&sort=date&filter=years.2008-2025"),
        SortOrder::Relevance => url.push_str(FREE_FULL_TEXT),
    }

    for label in &query.article_types {
        match article_type_filter(label) {
            Some(filter) => {
                url.push_str("&filter=");
                url.push_str(filter);
            }
            None => warn!("Unknown PubMed article type '{}', no filter applied", label),
        }
    }

    url
}

/// `2024 Mar 5` or `2024 Mar` (day defaults to 01) as `05-Mar-2024`.
fn citation_date(citation: &str) -> Option<String> {
    let raw = CITATION_DATE.captures(citation)?.get(1)?.as_str();
    let parts: Vec<&str> = raw.split_whitespace().collect();
    let normalized = match parts.as_slice() {
        [year, month] => format!("{} {} 01", year, month),
        [year, month, day] => format!("{} {} {}", year, month, day),
        _ => return None,
    };
    NaiveDate::parse_from_str(&normalized, "%Y %b %d").ok().map(format_date)
}

/// The first token after `doi:`, without its trailing period.
fn citation_doi(citation: &str) -> Option<String> {
    let idx = citation.to_ascii_lowercase().rfind("doi:")?;
    let doi = citation[idx + 4..]
        .split_whitespace()
        .next()?
        .trim_end_matches(|c| c == '.' || c == ';');
    (!doi.is_empty()).then(|| doi.to_string())
}

pub fn parse_listing(html: &str, base_url: &str) -> Result<SearchPage> {
    let document = Html::parse_document(html);
    let total_results = doc_text(&document, "label.of-total-pages")?
        .map(|t| parse_count(&t))
        .unwrap_or(0);

    let rows = selector("article.full-docsum")?;
    let mut articles = Vec::new();
    for row in document.select(&rows).take(PAGE_SIZE) {
        let Some(pmid) = first_text(row, "span.docsum-pmid")? else {
            continue;
        };
        let title = first_text(row, "a.docsum-title")?.unwrap_or_else(|| TITLE_NOT_AVAILABLE.to_string());
        let mut article = RawArticle::new(Source::PubMed, title, format!("{}{}/", base_url, pmid));
        article.authors =
            first_text(row, "span.docsum-authors")?.unwrap_or_else(|| AUTHORS_NOT_AVAILABLE.to_string());

        if let Some(citation) = first_text(row, "span.docsum-journal-citation")? {
            if let Some(doi) = citation_doi(&citation) {
                article.doi = doi;
            }
            if let Some(date) = citation_date(&citation) {
                article.date = date;
            }
        }
        articles.push(article);
    }

    Ok(SearchPage { articles, total_results })
}

pub fn parse_abstract(html: &str, url: &str) -> Result<ArticleAbstract> {
    let document = Html::parse_document(html);
    let title = doc_text(&document, "h1.heading-title")?.unwrap_or_else(|| TITLE_NOT_AVAILABLE.to_string());
    let doi = doc_text(&document, "span.doi")?
        .map(|d| d.replace("DOI:", "").trim().to_string())
        .unwrap_or_else(|| DOI_NOT_AVAILABLE.to_string());

    let author_sel = selector("a.full-name")?;
    let mut authors = dedupe(document.select(&author_sel).map(text_of).collect());
    if authors.is_empty() {
        authors.push(AUTHORS_NOT_AVAILABLE.to_string());
    }

    let mut abstract_blocks = Vec::new();
    let paragraphs = selector("div.abstract p")?;
    for p in document.select(&paragraphs) {
        abstract_blocks.extend(labelled_paragraph(p)?);
    }
    if abstract_blocks.is_empty() {
        abstract_blocks.push(ContentBlock::Text(ABSTRACT_NOT_AVAILABLE.to_string()));
    }

    let full_text_url = doc_attr(&document, "a.link-item.pmc", "href")?.unwrap_or_else(|| url.to_string());

    Ok(ArticleAbstract {
        title,
        doi,
        authors,
        abstract_blocks,
        full_text_url,
    })
}

pub fn parse_detail(html: &str, url: &str) -> Result<StructuredDocument> {
    let document = Html::parse_document(html);
    let mut blocks = Vec::new();
    if let Some(title) = doc_text(&document, "section.front-matter h1")? {
        blocks.push(ContentBlock::Title(title));
    }
    if let Some(doi) = doc_attr(&document, "section.front-matter a[href*='doi.org']", "href")? {
        blocks.push(ContentBlock::Doi(doi));
    }
    blocks.extend(body_blocks(&document, "section[aria-label='Article content']", ContentBlock::heading)?);

    Ok(StructuredDocument {
        source: Source::PubMed,
        url: url.to_string(),
        blocks,
    })
}

pub struct PubMedAdapter {
    client: Client,
    base_url: String,
    logger: Logger,
}

impl PubMedAdapter {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        Ok(Self {
            client: config.http_client()?,
            base_url: config.pubmed_base_url.clone(),
            logger: Logger::new().with_prefix("[PubMed]".to_string()),
        })
    }
}

impl fmt::Debug for PubMedAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PubMedAdapter")
            .field("client", &"<reqwest::Client>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl SourceAdapter for PubMedAdapter {
    fn source(&self) -> Source {
        Source::PubMed
    }

    fn can_handle(&self, url: &str) -> bool {
        url.contains("pubmed.ncbi.nlm.nih.gov") || url.contains("ncbi.nlm.nih.gov/pmc")
            || url.contains("pmc.ncbi.nlm.nih.gov")
    }

    async fn try_search(&self, query: &SearchQuery) -> Result<SearchPage> {
        let url = search_url(&self.base_url, query);
        debug!("🔗 PubMed search URL: {}", url);
        let html = fetch_html(&self.client, Source::PubMed, &url).await?;
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
        let html = fetch_html(&self.client, Source::PubMed, url).await?;
        parse_abstract(&html, url)
    }

    async fn fetch_detail(&self, url: &str) -> Result<StructuredDocument> {
        self.logger.debug(&format!("📖 Fetching full text {}", url));
        let html = fetch_html(&self.client, Source::PubMed, url).await?;
        parse_detail(&html, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    const LISTING: &str = r#"
        <html><body>
          <label class="of-total-pages">of 1,234</label>
          <article class="full-docsum">
            <a class="docsum-title" href="/38000001/">Cancer immunotherapy: a review</a>
            <span class="docsum-authors full-authors">Smith J, Doe A.</span>
            <span class="docsum-journal-citation full-journal-citation">Nature. 2024 Mar 5;627(8002):12-20. doi: 10.1038/s41586-024-0001-1. Epub 2024 Feb 1.</span>
            <span class="docsum-pmid">38000001</span>
          </article>
          <article class="full-docsum">
            <a class="docsum-title" href="/38000002/">Checkpoint inhibitors</a>
            <span class="docsum-journal-citation">Lancet. 2023 Nov;402:1-9.</span>
            <span class="docsum-pmid">38000002</span>
          </article>
          <article class="full-docsum">
            <a class="docsum-title">Row without identifier</a>
          </article>
        </body></html>
    "#;

    #[test]
    fn test_search_url_relevance_with_dates_and_types() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let query = SearchQuery::new("cancer immunotherapy")
            .with_page(2)
            .with_dates(start, end)
            .with_article_types(vec!["Review".into(), "Unknown Kind".into()]);

        assert_eq!(
            search_url(BASE_URL, &query),
            "https://pubmed.ncbi.nlm.nih.gov/?term=cancer+immunotherapy&page=2\
             &filter=dates.2024%2F01%2F01-2024%2F06%2F30\
             &filter=simsearch1.fha&filter=simsearch2.ffrft\
             &filter=pubt.review"
        );
    }

    #[test]
    fn test_search_url_sort_orders() {
        let recent = SearchQuery::new("x").with_sort(SortOrder::Recent);
        assert!(search_url(BASE_URL, &recent).ends_with("&filter=simsearch2.ffrft&sort=date"));

        let oldest = SearchQuery::new("x").with_sort(SortOrder::Oldest);
        assert!(search_url(BASE_URL, &oldest).ends_with("&page=1&sort=date&filter=years.2008-2025"));
    }

    #[test]
    fn test_article_type_table_is_complete() {
        assert_eq!(ARTICLE_TYPES.len(), 24);
        assert_eq!(article_type_filter("Meta-Analysis"), Some("pubt.metaanalysis"));
        assert_eq!(article_type_filter("review"), None);
    }

    #[test]
    fn test_parse_listing() {
        let page = parse_listing(LISTING, BASE_URL).unwrap();
        assert_eq!(page.total_results, 1234);
        assert_eq!(page.articles.len(), 2);

        let first = &page.articles[0];
        assert_eq!(first.title, "Cancer immunotherapy: a review");
        assert_eq!(first.url, "https://pubmed.ncbi.nlm.nih.gov/38000001/");
        assert_eq!(first.authors, "Smith J, Doe A.");
        assert_eq!(first.doi, "10.1038/s41586-024-0001-1");
        assert_eq!(first.date, "05-Mar-2024");
        assert_eq!(first.source, Source::PubMed);

        let second = &page.articles[1];
        assert_eq!(second.doi, DOI_NOT_AVAILABLE);
        assert_eq!(second.date, "01-Nov-2023");
        assert_eq!(second.authors, AUTHORS_NOT_AVAILABLE);
    }

    #[test]
    fn test_parse_listing_caps_rows() {
        let row = r#"<article class="full-docsum"><a class="docsum-title">T</a><span class="docsum-pmid">1</span></article>"#;
        let html = format!("<html><body>{}</body></html>", row.repeat(15));
        assert_eq!(parse_listing(&html, BASE_URL).unwrap().articles.len(), PAGE_SIZE);
    }

    #[test]
    fn test_citation_date_unparseable() {
        assert_eq!(citation_date("Cell. 2022 Sept 12;1:1"), None);
        assert_eq!(citation_date("No date here"), None);
    }

    #[test]
    fn test_parse_abstract() {
        let html = r#"
            <html><body>
              <h1 class="heading-title"> Checkpoint inhibitors </h1>
              <span class="doi">DOI: 10.1000/xyz</span>
              <a class="full-name">Li W</a><a class="full-name">Smith J</a><a class="full-name">Li W</a>
              <div class="abstract">
                <h2 class="title">Abstract</h2>
                <div class="abstract-content">
                  <p><strong class="sub-title">Background:</strong> Tumours evade.</p>
                  <p>Plain sentence.</p>
                </div>
              </div>
              <a class="link-item pmc" href="https://www.ncbi.nlm.nih.gov/pmc/articles/PMC1/">PMC</a>
            </body></html>
        "#;
        let abs = parse_abstract(html, "https://pubmed.ncbi.nlm.nih.gov/1/").unwrap();
        assert_eq!(abs.title, "Checkpoint inhibitors");
        assert_eq!(abs.doi, "10.1000/xyz");
        assert_eq!(abs.authors, vec!["Li W", "Smith J"]);
        assert_eq!(
            abs.abstract_blocks,
            vec![
                ContentBlock::Subsubsubheading("Background:".into()),
                ContentBlock::Text("Tumours evade.".into()),
                ContentBlock::Text("Plain sentence.".into()),
            ]
        );
        assert_eq!(abs.full_text_url, "https://www.ncbi.nlm.nih.gov/pmc/articles/PMC1/");
    }

    #[test]
    fn test_parse_abstract_without_abstract() {
        let abs = parse_abstract("<html><body></body></html>", "u").unwrap();
        assert_eq!(abs.abstract_blocks, vec![ContentBlock::Text(ABSTRACT_NOT_AVAILABLE.into())]);
        assert_eq!(abs.full_text_url, "u");
    }

    #[tokio::test]
    async fn test_try_search_against_mock() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .match_query(mockito::Matcher::UrlEncoded("term".into(), "crispr".into()))
            .with_status(200)
            .with_body(LISTING)
            .create_async()
            .await;

        let config = SourcesConfig {
            pubmed_base_url: format!("{}/", server.url()),
            ..SourcesConfig::default()
        };
        let adapter = PubMedAdapter::new(&config).unwrap();
        let page = adapter.try_search(&SearchQuery::new("crispr")).await.unwrap();
        assert_eq!(page.articles.len(), 2);
        assert!(page.articles[0].url.starts_with(&server.url()));
    }

    #[tokio::test]
    async fn test_search_degrades_on_server_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let config = SourcesConfig {
            pubmed_base_url: format!("{}/", server.url()),
            ..SourcesConfig::default()
        };
        let adapter = PubMedAdapter::new(&config).unwrap();
        assert!(adapter.try_search(&SearchQuery::new("x")).await.is_err());
        assert!(adapter.search(&SearchQuery::new("x")).await.is_empty());
    }
}
