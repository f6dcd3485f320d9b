use thiserror::Error;

use crate::types::Source;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{upstream} unavailable: {reason}")]
    SourceUnavailable { upstream: Source, reason: String },

    #[error("Similarity scoring unavailable: {0}")]
    ScoringUnavailable(String),

    #[error("Rating store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    pub fn source_unavailable(upstream: Source, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            upstream,
            reason: reason.into(),
        }
    }

    /// True for errors caused by the caller rather than by an upstream.
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
