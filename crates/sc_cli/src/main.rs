use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use sc_core::{RatingRecord, RatingStore, RatingWriter, Source};
use sc_inference::{create_scorer, ScorerConfig, ScorerKind};
use sc_scrapers::{
    init_logging, AggregationOutcome, Aggregator, AggregatorConfig, SearchArgs, SourceRegistry,
    SourcesConfig,
};
use sc_storage::{create_store, RatingBackend, StoreKind};
use sc_web::AppState;
use serde_json::json;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    /// Accepts `30s`, `2m`, `1h30m` or a bare number of seconds.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_ms = 0u64;
        let mut current = String::new();
        let mut chars = s.trim().chars().peekable();

        while let Some(c) = chars.next() {
            if c.is_ascii_digit() {
                current.push(c);
                continue;
            }
            let num: u64 = current
                .parse()
                .map_err(|_| format!("Duration unit '{}' must follow a number", c))?;
            current.clear();
            let unit_ms = match c {
                'm' if chars.peek() == Some(&'s') => {
                    chars.next();
                    1
                }
                's' => 1_000,
                'm' => 60_000,
                'h' => 3_600_000,
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            total_ms = add_scaled(total_ms, num, unit_ms)?;
        }

        if !current.is_empty() {
            let num = current
                .parse::<u64>()
                .map_err(|_| "Invalid number in duration".to_string())?;
            total_ms = add_scaled(total_ms, num, 1_000)?;
        } else if total_ms == 0 && s.trim().is_empty() {
            return Err("Duration must include a number".to_string());
        }

        Ok(HumanDuration(Duration::from_millis(total_ms)))
    }
}

fn add_scaled(total_ms: u64, num: u64, unit_ms: u64) -> std::result::Result<u64, String> {
    num.checked_mul(unit_ms)
        .and_then(|ms| total_ms.checked_add(ms))
        .ok_or_else(|| "Duration is too large".to_string())
}

#[derive(Parser, Debug)]
#[command(name = "scholia", author, version, about = "Federated scholarly article search")]
struct Cli {
    /// Similarity scorer: remote or lexical. Defaults to remote when --scorer-url is set.
    #[arg(long, env = "SCHOLIA_SCORER")]
    scorer: Option<ScorerKind>,
    #[arg(long, env = "SCHOLIA_SCORER_URL")]
    scorer_url: Option<String>,
    /// JSON listing service for PLOS results
    #[arg(long, env = "SCHOLIA_PLOS_URL")]
    plos_url: Option<String>,
    #[arg(long, env = "SCHOLIA_STORE", default_value = "memory", help = "Rating store: memory (default), sqlite")]
    store: StoreKind,
    /// Database path for the sqlite store
    #[arg(long, env = "SCHOLIA_STORE_URL")]
    store_url: Option<String>,
    /// Upstream HTTP timeout (e.g. 30s, 1m)
    #[arg(long, default_value = "30s")]
    request_timeout: HumanDuration,
    /// Give up on a source after this long; unset waits for every source
    #[arg(long)]
    source_timeout: Option<HumanDuration>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search every source and print the ranked list as JSON
    Search {
        #[command(flatten)]
        args: SearchArgs,
    },
    /// Print an article's abstract
    Abstract {
        /// pubmed, medrxiv or plos; inferred from the URL when omitted
        #[arg(long)]
        source: Option<Source>,
        url: String,
    },
    /// Print an article's full text as content blocks
    Fulltext {
        #[arg(long)]
        source: Option<Source>,
        url: String,
    },
    /// Run the HTTP API
    Serve {
        #[arg(long, env = "SCHOLIA_BIND", default_value = "127.0.0.1:3000")]
        bind: SocketAddr,
    },
    /// Inspect or edit community ratings
    Ratings {
        #[command(subcommand)]
        command: RatingCommands,
    },
}

#[derive(Subcommand, Debug)]
enum RatingCommands {
    /// Set the average rating for an article URL
    Put { url: String, rating: f64 },
    /// Print every stored rating
    List,
}

impl Cli {
    fn sources_config(&self) -> SourcesConfig {
        SourcesConfig {
            plos_listing_url: self.plos_url.clone(),
            request_timeout: self.request_timeout.0,
            ..SourcesConfig::default()
        }
    }

    fn scorer_config(&self) -> ScorerConfig {
        let kind = self.scorer.unwrap_or(if self.scorer_url.is_some() {
            ScorerKind::Remote
        } else {
            ScorerKind::Lexical
        });
        ScorerConfig {
            kind,
            endpoint: self.scorer_url.clone(),
            timeout: self.request_timeout.0,
        }
    }

    fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            source_timeout: self.source_timeout.map(|d| d.0),
            ..AggregatorConfig::default()
        }
    }
}

async fn build_state(cli: &Cli, store: Arc<dyn RatingBackend>) -> anyhow::Result<AppState> {
    let registry = SourceRegistry::new(&cli.sources_config()).context("building source adapters")?;
    let scorer = create_scorer(&cli.scorer_config()).context("configuring similarity scorer")?;
    let aggregator = Aggregator::new(&registry, scorer, store.into_store(), cli.aggregator_config());
    Ok(AppState::new(aggregator, registry))
}

fn resolve_source(registry: &SourceRegistry, source: Option<Source>, url: &str) -> anyhow::Result<Source> {
    match source.or_else(|| registry.source_for_url(url)) {
        Some(source) => Ok(source),
        None => bail!("Cannot tell which source serves '{}'; pass --source", url),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let store = create_store(cli.store, cli.store_url.as_deref())
        .await
        .context("opening rating store")?;

    match &cli.command {
        Commands::Search { args } => {
            let query = args.to_query()?;
            let state = build_state(&cli, store).await?;
            match state.aggregator.aggregate(&query).await? {
                AggregationOutcome::Ranked(articles) => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "articles": articles }))?);
                }
                AggregationOutcome::NoResults => eprintln!("No articles found."),
            }
        }
        Commands::Abstract { source, url } => {
            let registry = SourceRegistry::new(&cli.sources_config())?;
            let source = resolve_source(&registry, *source, url)?;
            let summary = registry.fetch_abstract(source, url).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Fulltext { source, url } => {
            let registry = SourceRegistry::new(&cli.sources_config())?;
            let source = resolve_source(&registry, *source, url)?;
            let document = registry.fetch_detail(source, url).await?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        Commands::Serve { bind } => {
            let state = build_state(&cli, store).await?;
            info!("🚀 Starting scholia API");
            sc_web::serve(state, *bind).await?;
        }
        Commands::Ratings { command } => match command {
            RatingCommands::Put { url, rating } => {
                if !rating.is_finite() || *rating < 0.0 {
                    bail!("Rating must be a non-negative number, got {}", rating);
                }
                let record = RatingRecord {
                    url: url.clone(),
                    average_rating: *rating,
                };
                store.clone().into_writer().put_rating(&record).await?;
                info!("⭐ Stored rating {} for {}", rating, url);
            }
            RatingCommands::List => {
                let ratings = store.into_store().scan_all().await?;
                for record in ratings {
                    println!("{:.2}\t{}", record.average_rating, record.url);
                }
            }
        },
    }

    Ok(())
}
