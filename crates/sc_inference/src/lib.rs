use std::time::Duration;

pub mod models;

pub use models::{create_scorer, LexicalScorer, RemoteScorer};
pub use sc_core::SimilarityScorer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScorerKind {
    Remote,
    #[default]
    Lexical,
}

impl std::str::FromStr for ScorerKind {
    type Err = sc_core::Error;

    fn from_str(s: &str) -> sc_core::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "remote" => Ok(Self::Remote),
            "lexical" => Ok(Self::Lexical),
            other => Err(sc_core::Error::InvalidRequest(format!(
                "Unknown scorer '{}'. Available scorers: remote, lexical",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScorerConfig {
    pub kind: ScorerKind,
    pub endpoint: Option<String>,
    pub timeout: Duration,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            kind: ScorerKind::default(),
            endpoint: None,
            timeout: Duration::from_secs(30),
        }
    }
}

pub mod prelude {
    pub use super::{create_scorer, ScorerConfig, ScorerKind};
    pub use sc_core::{Error, Result, SimilarityScorer};
}
