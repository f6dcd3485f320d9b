use chrono::NaiveDate;
use clap::Args;
use sc_core::{Result, SearchQuery, SortOrder};

/// Search filters shared by every front end that builds a [`SearchQuery`].
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Free-text search terms
    pub query: String,

    /// Result page, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// relevance, recent or oldest
    #[arg(long, default_value = "relevance")]
    pub sort: SortOrder,

    /// Earliest publication date (YYYY-MM-DD); needs --end-date
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Latest publication date (YYYY-MM-DD); needs --start-date
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// PubMed/PLOS article types, comma separated (e.g. "Review,Editorial")
    #[arg(long, value_delimiter = ',')]
    pub article_types: Vec<String>,

    /// PLOS subject areas, comma separated
    #[arg(long, value_delimiter = ',')]
    pub subject_areas: Vec<String>,
}

impl SearchArgs {
    pub fn to_query(&self) -> Result<SearchQuery> {
        let query = SearchQuery {
            query: self.query.clone(),
            page: self.page,
            sort: self.sort,
            start_date: self.start_date,
            end_date: self.end_date,
            article_types: clean(&self.article_types),
            subject_areas: clean(&self.subject_areas),
        };
        query.validate()?;
        Ok(query)
    }
}

fn clean(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        search: SearchArgs,
    }

    #[test]
    fn test_search_args_to_query() {
        let harness = Harness::parse_from([
            "scholia",
            "gene therapy",
            "--page",
            "2",
            "--sort",
            "recent",
            "--start-date",
            "2024-01-01",
            "--end-date",
            "2024-02-01",
            "--article-types",
            "Review, Editorial",
        ]);
        let query = harness.search.to_query().unwrap();
        assert_eq!(query.page, 2);
        assert_eq!(query.sort, SortOrder::Recent);
        assert!(query.date_range().is_some());
        assert_eq!(query.article_types, vec!["Review", "Editorial"]);
        assert!(query.subject_areas.is_empty());
    }

    #[test]
    fn test_search_args_rejects_page_zero() {
        let harness = Harness::parse_from(["scholia", "x", "--page", "0"]);
        assert!(harness.search.to_query().unwrap_err().is_invalid_request());
    }

    #[test]
    fn test_search_args_rejects_bad_sort() {
        assert!(Harness::try_parse_from(["scholia", "x", "--sort", "newest"]).is_err());
    }
}
