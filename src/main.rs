//! # Traffic Collision News
//!
//! Collects local traffic news from FOX 5 San Diego and NBC 7 San Diego,
//! keeps the articles that report a specific traffic collision, and serves
//! them as JSON.
//!
//! ## Usage
//!
//! ```sh
//! traffic_collision_news collect            # one collector run
//! traffic_collision_news serve              # read API on 0.0.0.0:8080
//! ```
//!
//! ## Architecture
//!
//! A collector run is a sequential pipeline:
//! 1. **Fetching**: list each selected source, then fetch every article's body text
//! 2. **Classifying**: run each article through the relevance engine behind a
//!    fixed-window rate limiter (keyword stems, or Gemini structured output)
//! 3. **Persisting**: merge into the stored CSV dataset, first occurrence of an
//!    identity wins, and write it back atomically
//!
//! The read service re-reads the dataset on every request.

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod batch;
mod cli;
mod error;
mod models;
mod pipeline;
mod relevance;
mod scrapers;
mod server;
mod store;
mod utils;

use api::{GeminiClient, RetryGenerate};
use batch::{BatchProcessor, RateLimiter};
use cli::{Cli, CollectArgs, Command, StrategyKind};
use models::ArticleRow;
use pipeline::Collector;
use relevance::{KeywordClassifier, LlmClassifier, RelevanceStrategy};
use scrapers::NewsSource;
use scrapers::body::BodyFetcher;
use store::CsvFileStore;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

type Strategy = RelevanceStrategy<RetryGenerate<GeminiClient>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();

    let result = match args.command {
        Command::Collect(args) => collect(args).await,
        Command::Serve(args) => {
            let store = CsvFileStore::new(args.data_file);
            Ok(server::serve(args.bind, store).await?)
        }
    };

    if let Err(ref e) = result {
        error!(error = %e, "Run failed");
    }
    result
}

async fn collect(args: CollectArgs) -> Result<(), Box<dyn Error>> {
    let start_time = std::time::Instant::now();
    info!(source = ?args.source, strategy = ?args.strategy, dry_run = args.dry_run, "Collector starting");

    let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
    let strategy = build_strategy(&args, http.clone())?;

    let adapters = args
        .source
        .sources()
        .into_iter()
        .map(|source| NewsSource::new(source, http.clone()))
        .collect::<Vec<_>>();
    let processor = BatchProcessor::new(strategy, RateLimiter::per_minute(args.requests_per_minute));
    let store = CsvFileStore::new(&args.data_file);

    let mut collector = Collector::new(adapters, BodyFetcher::new(http), processor, store);
    let report = collector.run(!args.dry_run).await?;

    if args.dry_run {
        let rows = report.articles.iter().map(ArticleRow::from).collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    }

    let elapsed = start_time.elapsed();
    info!(
        fetched = report.fetched,
        relevant = report.relevant,
        persisted = ?report.persisted,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

fn build_strategy(args: &CollectArgs, http: reqwest::Client) -> Result<Strategy, Box<dyn Error>> {
    match args.strategy {
        StrategyKind::Keywords => {
            let classifier = match &args.keywords {
                Some(path) => {
                    info!(path = %path.display(), "Loading keyword table");
                    KeywordClassifier::from_yaml_file(path)?
                }
                None => KeywordClassifier::default(),
            };
            Ok(RelevanceStrategy::Keywords(classifier))
        }
        StrategyKind::Llm => {
            let api_key = args
                .gemini_api_key
                .as_deref()
                .filter(|k| !k.trim().is_empty())
                .ok_or("GEMINI_API_KEY (or --gemini-api-key) is required for the llm strategy")?;
            let client = GeminiClient::new(http, api_key, args.model.as_str())
                .with_base_url(&args.gemini_base_url);
            info!(model = %args.model, "Using Gemini relevance engine");
            let generator = RetryGenerate::new(client, args.max_retries, RETRY_BASE_DELAY);
            Ok(RelevanceStrategy::Llm(LlmClassifier::new(generator)))
        }
    }
}
