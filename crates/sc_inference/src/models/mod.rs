use std::sync::Arc;

use sc_core::{Error, Result, SimilarityScorer};
use tracing::info;

use crate::{ScorerConfig, ScorerKind};

pub mod lexical;
pub mod remote;

pub use lexical::LexicalScorer;
pub use remote::RemoteScorer;

pub fn create_scorer(config: &ScorerConfig) -> Result<Arc<dyn SimilarityScorer>> {
    let scorer: Arc<dyn SimilarityScorer> = match config.kind {
        ScorerKind::Remote => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                Error::InvalidRequest("remote scorer requires an endpoint URL".to_string())
            })?;
            Arc::new(RemoteScorer::new(endpoint, config.timeout)?)
        }
        ScorerKind::Lexical => Arc::new(LexicalScorer::new()),
    };
    info!("🧠 Similarity scorer ready (using {})", scorer.name());
    Ok(scorer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_requires_endpoint() {
        let config = ScorerConfig {
            kind: ScorerKind::Remote,
            ..ScorerConfig::default()
        };
        assert!(create_scorer(&config).is_err());

        let config = ScorerConfig {
            kind: ScorerKind::Remote,
            endpoint: Some("http://localhost:9/similarity".to_string()),
            ..ScorerConfig::default()
        };
        assert_eq!(create_scorer(&config).unwrap().name(), "remote");
    }

    #[test]
    fn test_default_config_builds_lexical_scorer() {
        assert_eq!(ScorerKind::default(), ScorerKind::Lexical);
        assert_eq!(create_scorer(&ScorerConfig::default()).unwrap().name(), "lexical");
    }
}
