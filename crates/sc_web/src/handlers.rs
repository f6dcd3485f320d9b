use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use sc_core::types::{parse_filter_date, split_list};
use sc_core::{
    ArticleAbstract, Error, Result, ScoredArticle, SearchQuery, SortOrder, Source,
    StructuredDocument,
};
use sc_scrapers::{AggregationOutcome, SourceRegistry};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

/// Raw query string; every field is validated by hand so bad input gets a JSON 400.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub page: Option<String>,
    pub sort: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub article_types: Option<String>,
    pub subject_areas: Option<String>,
}

impl SearchParams {
    pub fn into_query(self) -> Result<SearchQuery> {
        let text = self.query.unwrap_or_default();
        let page = match self.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| Error::InvalidRequest("Page number must be a valid integer.".to_string()))?,
        };
        let sort = match self.sort.as_deref() {
            Some(raw) => raw.parse::<SortOrder>()?,
            None => SortOrder::default(),
        };

        let mut query = SearchQuery::new(text).with_page(page).with_sort(sort);
        query.start_date = optional_date(self.start_date.as_deref())?;
        query.end_date = optional_date(self.end_date.as_deref())?;
        query.article_types = self.article_types.as_deref().map(split_list).unwrap_or_default();
        query.subject_areas = self.subject_areas.as_deref().map(split_list).unwrap_or_default();
        query.validate()?;
        Ok(query)
    }
}

fn optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_filter_date(value).map(Some),
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub articles: Vec<ScoredArticle>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> std::result::Result<Json<SearchResponse>, ApiError> {
    let query = params.into_query().map_err(ApiError::from_search)?;
    match state.aggregator.aggregate(&query).await {
        Ok(AggregationOutcome::Ranked(articles)) => Ok(Json(SearchResponse { articles })),
        Ok(AggregationOutcome::NoResults) => Err(ApiError::no_articles()),
        Err(e) => Err(ApiError::from_search(e)),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DetailParams {
    pub source: Option<String>,
    pub url: Option<String>,
}

impl DetailParams {
    /// An explicit `source` wins; otherwise the URL's host decides.
    pub fn resolve(self, registry: &SourceRegistry) -> Result<(Source, String)> {
        let url = self
            .url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::InvalidRequest("Missing required parameter 'url'.".to_string()))?;

        let source = match self.source.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw.parse::<Source>()?,
            _ => registry.source_for_url(&url).ok_or_else(|| {
                Error::InvalidRequest(format!("Cannot tell which source serves '{}'.", url))
            })?,
        };
        Ok((source, url))
    }
}

pub async fn get_abstract(
    State(state): State<AppState>,
    Query(params): Query<DetailParams>,
) -> std::result::Result<Json<ArticleAbstract>, ApiError> {
    let (source, url) = params.resolve(&state.registry).map_err(ApiError::from_detail)?;
    let summary = state
        .registry
        .fetch_abstract(source, &url)
        .await
        .map_err(ApiError::from_detail)?;
    Ok(Json(summary))
}

pub async fn get_fulltext(
    State(state): State<AppState>,
    Query(params): Query<DetailParams>,
) -> std::result::Result<Json<StructuredDocument>, ApiError> {
    let (source, url) = params.resolve(&state.registry).map_err(ApiError::from_detail)?;
    let document = state
        .registry
        .fetch_detail(source, &url)
        .await
        .map_err(ApiError::from_detail)?;
    info!("📖 {} blocks from {}", document.blocks.len(), source);
    Ok(Json(document))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
