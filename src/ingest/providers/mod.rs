// src/ingest/providers/mod.rs
//! Source adapters. Each one either parses a canned body (tests, offline runs)
//! or calls its public API over HTTP.

pub mod arxiv;
pub mod devto;
pub mod duckduckgo;
pub mod hackernews;
pub mod lobsters;
pub mod reddit;
pub mod stackoverflow;
pub mod wikipedia;

use anyhow::{Context, Result};
use std::sync::Arc;
use url::Url;

use crate::dates;
use crate::ingest::config::FetchConfig;
use crate::ingest::http;
use crate::ingest::types::SourceProvider;
use crate::schema::DateConfidence;

/// Where a provider gets its body from.
#[derive(Clone)]
pub enum Mode {
    Fixture(String),
    Http {
        base_url: String,
        client: reqwest::Client,
    },
}

impl Mode {
    pub fn http(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Mode::Http {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Body for one request. `endpoint` builds the full URL from the base.
    pub(crate) async fn body<F>(&self, provider: &'static str, endpoint: F) -> Result<String>
    where
        F: FnOnce(&str) -> Result<Url>,
    {
        match self {
            Mode::Fixture(s) => Ok(s.clone()),
            Mode::Http { base_url, client } => {
                let url = endpoint(base_url)
                    .with_context(|| format!("{provider}: building request url"))?;
                tracing::debug!(target: "ingest", provider, url = %url, "GET");
                http::get_text(client, url.as_str(), provider).await
            }
        }
    }
}

/// `base + path` with the given query pairs, percent-encoded.
pub(crate) fn endpoint(base: &str, path: &str, params: &[(&str, String)]) -> Result<Url> {
    Url::parse_with_params(&format!("{base}{path}"), params).context("invalid endpoint url")
}

/// Calendar date from any timestamp format the APIs use, with its confidence.
pub(crate) fn dated(raw: Option<&str>) -> (Option<String>, DateConfidence) {
    let date = raw.and_then(dates::to_date_string);
    let confidence = dates::date_confidence(date.as_deref(), None, None);
    (date, confidence)
}

/// Same as [`dated`] for unix-second timestamps.
pub(crate) fn dated_ts(ts: Option<i64>) -> (Option<String>, DateConfidence) {
    let date = ts.and_then(dates::timestamp_to_date);
    let confidence = dates::date_confidence(date.as_deref(), None, None);
    (date, confidence)
}

/// Every built-in source name, in presentation order.
pub const SOURCE_NAMES: &[&str] = &[
    hackernews::NAME,
    stackoverflow::NAME,
    lobsters::NAME,
    devto::NAME,
    arxiv::NAME,
    wikipedia::NAME,
    duckduckgo::NAME,
];

/// All live HTTP providers sharing one client.
pub fn registry(cfg: &FetchConfig) -> Result<Vec<Arc<dyn SourceProvider>>> {
    let client = http::build_client(&cfg.user_agent, None)?;
    Ok(vec![
        Arc::new(hackernews::HackerNewsProvider::from_client(client.clone())),
        Arc::new(stackoverflow::StackOverflowProvider::from_client(client.clone())),
        Arc::new(lobsters::LobstersProvider::from_client(client.clone())),
        Arc::new(devto::DevToProvider::from_client(client.clone())),
        Arc::new(arxiv::ArxivProvider::from_client(client.clone())),
        Arc::new(wikipedia::WikipediaProvider::from_client(client.clone())),
        Arc::new(duckduckgo::DuckDuckGoProvider::from_client(client)),
    ])
}
