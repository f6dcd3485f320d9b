pub mod error;
pub mod models;
pub mod ranking;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use models::SimilarityScorer;
pub use storage::{RatingStore, RatingWriter};
pub use types::{
    ArticleAbstract, ContentBlock, RatingPage, RatingRecord, RawArticle, ScoredArticle,
    SearchPage, SearchQuery, SortOrder, Source, StructuredDocument,
};
