use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const DOI_NOT_AVAILABLE: &str = "DOI not available";
pub const DATE_NOT_AVAILABLE: &str = "Date not available";
pub const TITLE_NOT_AVAILABLE: &str = "Title not available";
pub const AUTHORS_NOT_AVAILABLE: &str = "Authors not available";
pub const ABSTRACT_NOT_AVAILABLE: &str = "Abstract not available";

/// Display format for publication dates, e.g. `05-Mar-2024`.
pub const DATE_FORMAT: &str = "%d-%b-%Y";

/// Upper bound on articles returned by one adapter call.
pub const PAGE_SIZE: usize = 10;

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    PubMed,
    MedRxiv,
    #[serde(rename = "PLOS")]
    Plos,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::PubMed, Source::MedRxiv, Source::Plos];

    pub fn name(&self) -> &'static str {
        match self {
            Source::PubMed => "PubMed",
            Source::MedRxiv => "MedRxiv",
            Source::Plos => "PLOS",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Source {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pubmed" => Ok(Source::PubMed),
            "medrxiv" | "biorxiv" => Ok(Source::MedRxiv),
            "plos" => Ok(Source::Plos),
            other => Err(Error::InvalidRequest(format!(
                "Invalid source '{}'. Choose from 'pubmed', 'medrxiv', 'plos'.",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Relevance,
    Recent,
    Oldest,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "relevance" => Ok(SortOrder::Relevance),
            "recent" => Ok(SortOrder::Recent),
            "oldest" => Ok(SortOrder::Oldest),
            other => Err(Error::InvalidRequest(format!(
                "Invalid sort parameter '{}'. Must be 'relevance', 'recent', or 'oldest'.",
                other
            ))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortOrder::Relevance => "relevance",
            SortOrder::Recent => "recent",
            SortOrder::Oldest => "oldest",
        };
        f.write_str(s)
    }
}

/// One aggregation request, shared read-only by every adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub page: u32,
    pub sort: SortOrder,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub article_types: Vec<String>,
    pub subject_areas: Vec<String>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: 1,
            sort: SortOrder::default(),
            start_date: None,
            end_date: None,
            article_types: Vec::new(),
            subject_areas: Vec::new(),
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn with_article_types(mut self, types: Vec<String>) -> Self {
        self.article_types = types;
        self
    }

    pub fn with_subject_areas(mut self, areas: Vec<String>) -> Self {
        self.subject_areas = areas;
        self
    }

    /// Both bounds, or nothing. A lone bound is ignored.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(Error::InvalidRequest(
                "Query parameter 'query' is required.".to_string(),
            ));
        }
        if self.page < 1 {
            return Err(Error::InvalidRequest(
                "Page number must be 1 or greater.".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parses a `YYYY-MM-DD` filter bound.
pub fn parse_filter_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| Error::InvalidRequest(format!("Invalid date '{}': {}", value, e)))
}

/// Splits a comma-separated filter list, dropping empty entries.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    pub title: String,
    pub url: String,
    pub authors: String,
    pub doi: String,
    pub date: String,
    pub source: Source,
    #[serde(default)]
    pub citation_count: u64,
}

impl RawArticle {
    pub fn new(source: Source, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            authors: String::new(),
            doi: DOI_NOT_AVAILABLE.to_string(),
            date: DATE_NOT_AVAILABLE.to_string(),
            source,
            citation_count: 0,
        }
    }
}

/// What one adapter returned for one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub articles: Vec<RawArticle>,
    pub total_results: u64,
}

impl SearchPage {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredArticle {
    #[serde(flatten)]
    pub article: RawArticle,
    pub final_score: f64,
    pub average_rating: f64,
}

impl From<RawArticle> for ScoredArticle {
    fn from(article: RawArticle) -> Self {
        Self {
            article,
            final_score: 0.0,
            average_rating: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub url: String,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingPage {
    pub items: Vec<RatingRecord>,
    pub continuation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum ContentBlock {
    Title(String),
    Heading(String),
    Subheading(String),
    Subsubheading(String),
    Subsubsubheading(String),
    Text(String),
    Doi(String),
    PublicationDate(String),
    Citation(String),
}

impl ContentBlock {
    /// Maps an HTML heading level onto the block hierarchy.
    pub fn heading(level: u8, text: String) -> Self {
        match level {
            1 => ContentBlock::Title(text),
            2 => ContentBlock::Subheading(text),
            3 => ContentBlock::Subsubheading(text),
            _ => ContentBlock::Subsubsubheading(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleAbstract {
    pub title: String,
    pub doi: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_blocks: Vec<ContentBlock>,
    pub full_text_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredDocument {
    pub source: Source,
    pub url: String,
    pub blocks: Vec<ContentBlock>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_round_trips_through_names() {
        assert_eq!("PubMed".parse::<Source>().unwrap(), Source::PubMed);
        assert_eq!("biorxiv".parse::<Source>().unwrap(), Source::MedRxiv);
        assert_eq!(" plos ".parse::<Source>().unwrap(), Source::Plos);
        assert!("arxiv".parse::<Source>().unwrap_err().is_invalid_request());
        assert_eq!(serde_json::to_string(&Source::Plos).unwrap(), "\"PLOS\"");
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!("".parse::<SortOrder>().unwrap(), SortOrder::Relevance);
        assert_eq!("Recent".parse::<SortOrder>().unwrap(), SortOrder::Recent);
        assert!("newest".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_date_range_requires_both_bounds() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();

        let mut query = SearchQuery::new("crispr");
        query.start_date = Some(start);
        assert_eq!(query.date_range(), None);

        let query = query.with_dates(start, end);
        assert_eq!(query.date_range(), Some((start, end)));
    }

    #[test]
    fn test_validate_rejects_blank_query_and_page_zero() {
        assert!(SearchQuery::new("  ").validate().is_err());
        assert!(SearchQuery::new("x").with_page(0).validate().is_err());
        assert!(SearchQuery::new("x").validate().is_ok());
    }

    #[test]
    fn test_split_list_trims_entries() {
        assert_eq!(split_list("Review, Editorial,,"), vec!["Review", "Editorial"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_scored_article_flattens_raw_fields() {
        let raw = RawArticle::new(Source::PubMed, "T", "https://pubmed.ncbi.nlm.nih.gov/1/");
        let scored = ScoredArticle::from(raw);
        let json = serde_json::to_value(&scored).unwrap();
        assert_eq!(json["title"], "T");
        assert_eq!(json["source"], "PubMed");
        assert_eq!(json["doi"], DOI_NOT_AVAILABLE);
        assert_eq!(json["final_score"], 0.0);
        assert_eq!(json["average_rating"], 0.0);
    }

    #[test]
    fn test_content_block_wire_shape() {
        let json = serde_json::to_value(ContentBlock::PublicationDate("x".into())).unwrap();
        assert_eq!(json, serde_json::json!({"type": "publication_date", "content": "x"}));
    }
}
