mod config;
mod fetch;
mod markdown;
mod search;
mod serper;

pub const USER_AGENT: &str = concat!("dealscout/", env!("CARGO_PKG_VERSION"));

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use reqwest::Client;
use tracing::info;

use config::{DelayPolicy, SearchPolicy};
use fetch::HttpPageSource;
use search::engine::{self, DEFAULT_NUM_RESULTS, SweepRequest};
use search::report;
use serper::client::SerperClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

/// Multi-source web search for deal research: expands a query, discovers
/// relevant sites, sweeps news/web/images, and rebalances concentrated results.
#[derive(Debug, Parser)]
#[command(name = "dealscout", version)]
struct Cli {
    /// Company, fund, or deal to research
    query: String,

    /// Target result count; drives how many pages each sweep requests
    #[arg(short = 'n', long, default_value_t = DEFAULT_NUM_RESULTS)]
    num_results: usize,

    /// Article to mine for entities, amounts, dates, and related sites
    #[arg(long)]
    url: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// JSON policy file; missing fields keep their defaults
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Provider calls allowed in flight at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Top-domain share above which anchor domains are forced
    #[arg(long)]
    threshold: Option<f64>,

    /// Anchor domain to force when results are concentrated (repeatable)
    #[arg(long = "anchor")]
    anchors: Vec<String>,

    /// Skip pauses between provider calls
    #[arg(long)]
    no_delay: bool,
}

impl Cli {
    fn load_policy(&self) -> Result<SearchPolicy, config::ConfigError> {
        let mut policy = match &self.policy {
            Some(path) => SearchPolicy::from_file(path)?,
            None => SearchPolicy::default(),
        };
        if let Some(concurrency) = self.concurrency {
            policy.concurrency = concurrency;
        }
        if let Some(threshold) = self.threshold {
            policy.concentration_threshold = threshold;
        }
        if !self.anchors.is_empty() {
            policy.anchor_domains = self.anchors.clone();
        }
        if self.no_delay {
            policy.delays = DelayPolicy::none();
        }
        policy.normalize();
        policy.validate()?;
        Ok(policy)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dealscout=info".parse()?),
        )
        .init();

    let policy = cli.load_policy()?;

    let http = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()?;
    let provider = SerperClient::from_env(http.clone())?;
    let pages = HttpPageSource::new(http);

    let request = SweepRequest {
        query: cli.query.clone(),
        num_results: cli.num_results,
        seed_url: cli.url.clone(),
    };
    info!(
        query = %request.query,
        num_results = request.num_results,
        seed = request.seed_url.is_some(),
        "starting deal search"
    );

    let outcome = engine::search(&provider, &pages, &policy, &request)
        .await
        .inspect_err(|e| tracing::error!("search rejected: {e}"))?;

    let rendered = match cli.format {
        OutputFormat::Json => report::format_json(&outcome)?,
        OutputFormat::Markdown => report::format_markdown(&outcome),
    };
    println!("{rendered}");
    Ok(())
}
