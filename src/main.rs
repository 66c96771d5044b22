//! community-research: CLI entrypoint.
//! Runs one research pipeline for a query and prints the report to stdout.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use community_research::grounding::GroundingClient;
use community_research::ingest::config::{load_config_default, load_config_from, ResearchConfig};
use community_research::ingest::providers::reddit::{self, RedditEnricher};
use community_research::ingest::types::FetchResult;
use community_research::ingest::{fetch_parallel, http, providers, Depth};
use community_research::render::{render_report, OutputFormat};
use community_research::research::run_research_seeded;

#[derive(Parser)]
#[command(
    name = "community-research",
    version,
    about = "Aggregate, score and dedupe community findings about a topic",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Topic or question to research.
    query: Option<String>,

    /// Search breadth and per-source timeout.
    #[arg(long, value_enum, default_value_t = Depth::Default)]
    depth: Depth,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Report)]
    format: OutputFormat,

    /// Config file (TOML or JSON). Defaults to $RESEARCH_CONFIG_PATH, then config/research.{toml,json}.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reddit thread to enrich and include in the report. Repeatable.
    #[arg(long = "reddit", value_name = "URL")]
    reddit_urls: Vec<String>,
}

/// Options shared by the raw-output subcommands.
#[derive(Args)]
struct RunArgs {
    /// Limit and timeout preset.
    #[arg(long, value_enum, default_value_t = Depth::Default)]
    depth: Depth,

    /// Config file (TOML or JSON).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// List the built-in sources and the depth presets.
    ListSources,
    /// Fetch one source and print its raw result as JSON.
    Fetch {
        source: String,
        query: String,
        /// Max items; defaults to the depth's limit.
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Fetch several sources in parallel and print the raw results as JSON.
    All {
        query: String,
        /// Comma-separated source names; defaults to the depth's sources.
        #[arg(long, value_delimiter = ',')]
        sources: Vec<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Ask the grounding service only and print its answer as JSON.
    Brave {
        query: String,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Enrich one Reddit thread and print the item as JSON.
    EnrichReddit {
        url: String,
        #[command(flatten)]
        run: RunArgs,
    },
}

/// Logs go to stderr so the report on stdout stays clean.
/// `RESEARCH_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("community_research=info,warn"));
    let json = std::env::var("RESEARCH_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ResearchConfig> {
    match path {
        Some(p) => load_config_from(p),
        None => load_config_default(),
    }
}

fn list_sources() {
    println!("Sources:");
    for name in providers::SOURCE_NAMES {
        println!("  {name}");
    }
    println!("\nDepth presets:");
    for depth in [Depth::Quick, Depth::Default, Depth::Deep] {
        println!(
            "  {:<8} limit {:>2}, timeout {:>2}s: {}",
            depth.as_str(),
            depth.limit(),
            depth.timeout().as_secs(),
            depth.sources().join(", ")
        );
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn check_sources(sources: &[String]) -> Result<()> {
    if let Some(unknown) = sources.iter().find(|s| !providers::SOURCE_NAMES.contains(&s.as_str())) {
        bail!("unknown source {unknown:?} (see `community-research list-sources`)");
    }
    Ok(())
}

async fn fetch_sources(
    query: &str,
    sources: &[String],
    limit: Option<usize>,
    depth: Depth,
    config: &ResearchConfig,
) -> Result<Vec<FetchResult>> {
    let registry = providers::registry(&config.fetch)?;
    Ok(fetch_parallel(
        query,
        &registry,
        sources,
        limit.unwrap_or_else(|| depth.limit()),
        depth.timeout(),
        config.fetch.max_workers,
    )
    .await)
}

async fn run_command(command: Command) -> Result<()> {
    match command {
        Command::ListSources => {
            list_sources();
            Ok(())
        }
        Command::Fetch { source, query, limit, run } => {
            let sources = [source];
            check_sources(&sources)?;
            let config = load_config(run.config.as_ref()).context("loading research config")?;
            let results = fetch_sources(&query, &sources, limit, run.depth, &config).await?;
            match results.first() {
                Some(result) => print_json(result),
                None => bail!("no provider for {:?}", sources[0]),
            }
        }
        Command::All { query, sources, limit, run } => {
            let config = load_config(run.config.as_ref()).context("loading research config")?;
            let sources = if sources.is_empty() {
                run.depth.resolve_sources(&config.fetch)
            } else {
                check_sources(&sources)?;
                sources
            };
            print_json(&fetch_sources(&query, &sources, limit, run.depth, &config).await?)
        }
        Command::Brave { query, run } => {
            let config = load_config(run.config.as_ref()).context("loading research config")?;
            let grounding = GroundingClient::from_env(http::build_client(&config.fetch.user_agent, None)?);
            let (answer, status) = grounding.fetch(&query, run.depth).await;
            print_json(&json!({ "grounded_answer": answer, "source_status": status }))
        }
        Command::EnrichReddit { url, run } => {
            if reddit::extract_reddit_url_info(&url).is_none() {
                bail!("not a reddit thread url: {url}");
            }
            let config = load_config(run.config.as_ref()).context("loading research config")?;
            let enricher = RedditEnricher::from_client(http::build_client(&config.fetch.user_agent, None)?);
            let (item, error) = enricher.enrich_item_with_error(reddit::item_from_url(&url)).await;
            print_json(&json!({ "result": item, "error": error }))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    if let Some(command) = cli.command {
        return run_command(command).await;
    }

    let Some(query) = cli.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
        bail!("a query is required (try `community-research \"rust async runtimes\"`)");
    };

    let config = load_config(cli.config.as_ref()).context("loading research config")?;
    let registry = providers::registry(&config.fetch)?;
    let client = http::build_client(&config.fetch.user_agent, None)?;
    let grounding = GroundingClient::from_env(client.clone());

    let mut seeded = Vec::new();
    if !cli.reddit_urls.is_empty() {
        seeded.push(RedditEnricher::from_client(client).enrich_urls(&cli.reddit_urls).await);
    }

    let report =
        run_research_seeded(query, cli.depth, &registry, &config, Some(&grounding), seeded).await;
    println!("{}", render_report(&report, cli.format)?);
    Ok(())
}
