use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use sc_core::{Error, Result, SimilarityScorer};

#[derive(Serialize)]
struct SimilarityRequest<'a> {
    documents: Vec<&'a str>,
}

/// Client for the pairwise similarity service.
///
/// The service scores `[query, t1, .., tN]` and answers with a full
/// similarity matrix; only row 0, columns 1..=N are used.
pub struct RemoteScorer {
    client: Client,
    endpoint: String,
}

impl RemoteScorer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl fmt::Debug for RemoteScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteScorer")
            .field("client", &"<reqwest::Client>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Accepts both the bare `{similarity_matrix}` body and the gateway
/// envelope whose `body` holds the same object as a JSON string.
fn extract_matrix(response: Value) -> Result<Vec<Vec<f64>>> {
    let unwrapped = match response.get("body") {
        Some(Value::String(body)) => Some(serde_json::from_str::<Value>(body)?),
        Some(body @ Value::Object(_)) => Some(body.clone()),
        _ => None,
    };
    let payload = unwrapped.unwrap_or(response);

    match payload.get("similarity_matrix") {
        Some(matrix) => Ok(serde_json::from_value(matrix.clone())?),
        None => Err(Error::ScoringUnavailable(
            "response has no similarity_matrix".to_string(),
        )),
    }
}

fn query_row(matrix: Vec<Vec<f64>>) -> Result<Vec<f64>> {
    let row = matrix
        .into_iter()
        .next()
        .ok_or_else(|| Error::ScoringUnavailable("similarity_matrix is empty".to_string()))?;
    Ok(row.into_iter().skip(1).collect())
}

#[async_trait]
impl SimilarityScorer for RemoteScorer {
    fn name(&self) -> &str {
        "remote"
    }

    async fn similarity(&self, query: &str, titles: &[String]) -> Result<Vec<f64>> {
        let mut documents = Vec::with_capacity(titles.len() + 1);
        documents.push(query);
        documents.extend(titles.iter().map(String::as_str));

        let response = self
            .client
            .post(&self.endpoint)
            .json(&SimilarityRequest { documents })
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        let scores = query_row(extract_matrix(response)?)?;
        debug!("🔢 Received {} similarity scores for {} titles", scores.len(), titles.len());
        Ok(scores)
    }
}
