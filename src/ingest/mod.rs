// src/ingest/mod.rs
pub mod config;
pub mod http;
pub mod providers;
pub mod types;

use futures::stream::{self, StreamExt};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::ingest::config::FetchConfig;
use crate::ingest::types::{FetchResult, SourceProvider};
use crate::schema::SourceStatus;

/// One-time metrics registration.
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("research_fetch_total", "Provider fetches attempted.");
        describe_counter!(
            "research_fetch_errors_total",
            "Provider fetches that failed, timed out or panicked."
        );
        describe_histogram!("research_fetch_ms", "Provider fetch time in milliseconds.");
        describe_counter!("research_items_scored_total", "Items passed through scoring.");
        describe_counter!(
            "research_dedup_removed_total",
            "Items removed as near-duplicates."
        );
    });
}

/// How wide and how long to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    Quick,
    #[default]
    Default,
    Deep,
}

impl Depth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Depth::Quick => "quick",
            Depth::Default => "default",
            Depth::Deep => "deep",
        }
    }

    /// Built-in source set for this depth.
    pub fn sources(&self) -> &'static [&'static str] {
        match self {
            Depth::Quick => &["hackernews", "stackoverflow"],
            Depth::Default => &["hackernews", "stackoverflow", "lobsters", "devto", "wikipedia"],
            Depth::Deep => &[
                "hackernews",
                "stackoverflow",
                "lobsters",
                "devto",
                "arxiv",
                "wikipedia",
                "duckduckgo",
            ],
        }
    }

    /// Per-source item limit.
    pub fn limit(&self) -> usize {
        match self {
            Depth::Quick => 5,
            Depth::Default => 10,
            Depth::Deep => 15,
        }
    }

    /// Per-source timeout.
    pub fn timeout(&self) -> Duration {
        match self {
            Depth::Quick => Duration::from_secs(15),
            Depth::Default => Duration::from_secs(30),
            Depth::Deep => Duration::from_secs(60),
        }
    }

    /// Source names for this depth, honouring a config override.
    pub fn resolve_sources(&self, cfg: &FetchConfig) -> Vec<String> {
        match cfg.sources.get(self.as_str()) {
            Some(list) if !list.is_empty() => list.clone(),
            _ => self.sources().iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Depth {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Ok(Depth::Quick),
            "default" => Ok(Depth::Default),
            "deep" => Ok(Depth::Deep),
            other => Err(anyhow::anyhow!("unknown depth: {other}")),
        }
    }
}

/// Decode entities, strip tags, collapse whitespace and cap the length.
pub fn clean_html_text(s: &str, max_chars: usize) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > max_chars {
        out = out.chars().take(max_chars).collect();
    }
    out
}

async fn run_one(provider: Arc<dyn SourceProvider>, query: String, limit: usize, timeout: Duration) -> FetchResult {
    let name = provider.name();
    let t0 = Instant::now();
    counter!("research_fetch_total", "source" => name).increment(1);

    let mut handle = tokio::spawn(async move { provider.fetch(&query, limit).await });
    let abort = handle.abort_handle();
    let outcome = tokio::time::timeout(timeout, &mut handle).await;
    let ms = t0.elapsed().as_millis() as u64;
    histogram!("research_fetch_ms", "source" => name).record(ms as f64);

    let result = match outcome {
        Ok(Ok(Ok(items))) => FetchResult::ok(name, items, ms),
        Ok(Ok(Err(e))) => FetchResult::failed(name, format!("{e:#}"), ms),
        Ok(Err(join)) => FetchResult::failed(name, format!("provider task failed: {join}"), ms),
        Err(_) => {
            abort.abort();
            FetchResult::failed(name, format!("timed out after {timeout:?}"), ms)
        }
    };

    if result.success {
        tracing::debug!(target: "ingest", provider = name, items = result.items.len(), ms, "fetched");
    } else {
        counter!("research_fetch_errors_total", "source" => name).increment(1);
        tracing::warn!(
            target: "ingest",
            provider = name,
            error = result.error.as_deref().unwrap_or_default(),
            ms,
            "provider error"
        );
    }
    result
}

/// Fetch from every provider named in `sources` on a bounded pool.
///
/// Each provider runs in its own task with `timeout`; errors, timeouts and
/// panics come back as failed results. Names without a provider are skipped.
/// Results follow the order of `sources`.
pub async fn fetch_parallel(
    query: &str,
    providers: &[Arc<dyn SourceProvider>],
    sources: &[String],
    limit: usize,
    timeout: Duration,
    max_workers: usize,
) -> Vec<FetchResult> {
    ensure_metrics_described();

    let selected: Vec<Arc<dyn SourceProvider>> = sources
        .iter()
        .filter_map(|s| match providers.iter().find(|p| p.name() == s.as_str()) {
            Some(p) => Some(Arc::clone(p)),
            None => {
                tracing::warn!(target: "ingest", source = %s, "no provider registered");
                None
            }
        })
        .collect();

    let tasks = selected
        .into_iter()
        .map(|p| run_one(p, query.to_string(), limit, timeout));
    let mut results: Vec<FetchResult> = stream::iter(tasks)
        .buffer_unordered(max_workers.max(1))
        .collect()
        .await;

    results.sort_by_key(|r| {
        sources
            .iter()
            .position(|s| *s == r.source_name)
            .unwrap_or(usize::MAX)
    });
    results
}

/// Depth-driven wrapper around [`fetch_parallel`].
pub async fn fetch_for_depth(
    query: &str,
    providers: &[Arc<dyn SourceProvider>],
    depth: Depth,
    cfg: &FetchConfig,
) -> Vec<FetchResult> {
    let sources = depth.resolve_sources(cfg);
    tracing::info!(
        target: "ingest",
        depth = %depth,
        sources = sources.len(),
        limit = depth.limit(),
        "fetching"
    );
    fetch_parallel(
        query,
        providers,
        &sources,
        depth.limit(),
        depth.timeout(),
        cfg.max_workers,
    )
    .await
}

pub fn convert_to_source_status(results: &[FetchResult]) -> Vec<SourceStatus> {
    results.iter().map(FetchResult::to_status).collect()
}
