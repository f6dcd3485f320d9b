use std::sync::Arc;

use sc_scrapers::{Aggregator, SourceRegistry};

/// Collaborators shared by every handler, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub registry: SourceRegistry,
}

impl AppState {
    pub fn new(aggregator: Aggregator, registry: SourceRegistry) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            registry,
        }
    }
}
