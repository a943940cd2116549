//! Command-line interface definitions.
//!
//! Two subcommands: `collect` runs the pipeline once, `serve` starts the
//! read-only HTTP service. Every option can also come from the environment
//! (a `.env` file is loaded first).

use crate::api::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::batch::DEFAULT_REQUESTS_PER_MINUTE;
use crate::models::Source;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Collect San Diego traffic-collision news and serve it as JSON.
///
/// # Examples
///
/// ```sh
/// # One collector run with the LLM engine
/// GEMINI_API_KEY=... traffic_collision_news collect
///
/// # Keyword heuristic, FOX 5 only, print instead of saving
/// traffic_collision_news collect --strategy keywords --source fox5 --dry-run
///
/// # Read API
/// traffic_collision_news serve --bind 127.0.0.1:8080
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch, classify and persist one batch of articles
    Collect(CollectArgs),
    /// Serve relevant stored articles over HTTP
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Which sources to fetch
    #[arg(long, value_enum, default_value_t = SourceSelection::All)]
    pub source: SourceSelection,

    /// Relevance engine
    #[arg(long, value_enum, default_value_t = StrategyKind::Llm)]
    pub strategy: StrategyKind,

    /// Print the classified batch as JSON instead of saving it
    #[arg(long)]
    pub dry_run: bool,

    /// Stored dataset (CSV)
    #[arg(short = 'f', long, env = "ARTICLES_FILE", default_value = "articles.csv")]
    pub data_file: PathBuf,

    /// Gemini API key, required by the `llm` strategy
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Gemini API base URL
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub gemini_base_url: String,

    /// Model calls allowed per 60-second window
    #[arg(long, env = "MAX_REQUESTS_PER_MINUTE", default_value_t = DEFAULT_REQUESTS_PER_MINUTE)]
    pub requests_per_minute: u32,

    /// Retries for a failed model call (transport errors, 429 and 5xx only)
    #[arg(long, default_value_t = 3)]
    pub max_retries: usize,

    /// YAML file mapping source names to keyword stems
    #[arg(short, long)]
    pub keywords: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(short, long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Stored dataset (CSV)
    #[arg(short = 'f', long, env = "ARTICLES_FILE", default_value = "articles.csv")]
    pub data_file: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceSelection {
    All,
    Fox5,
    Nbc7,
}

impl SourceSelection {
    /// Sources to fetch, in fetch order.
    pub fn sources(self) -> Vec<Source> {
        match self {
            SourceSelection::All => Source::ALL.to_vec(),
            SourceSelection::Fox5 => vec![Source::Fox5],
            SourceSelection::Nbc7 => vec![Source::Nbc7],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyKind {
    Llm,
    Keywords,
}
