pub mod aggregator;
pub mod cli;
pub mod dispatch;
pub mod logging;
pub mod scrapers;

pub use aggregator::{AggregationOutcome, Aggregator, AggregatorConfig, Stage};
pub use cli::SearchArgs;
pub use dispatch::SourceRegistry;
pub use logging::{init_logging, Logger};
pub use scrapers::{SourceAdapter, SourcesConfig};

pub mod prelude {
    pub use super::aggregator::{AggregationOutcome, Aggregator, AggregatorConfig};
    pub use super::dispatch::SourceRegistry;
    pub use super::scrapers::{SourceAdapter, SourcesConfig};
    pub use sc_core::{Error, Result, SearchQuery, Source};
}
