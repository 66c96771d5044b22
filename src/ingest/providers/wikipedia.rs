// src/ingest/providers/wikipedia.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{endpoint, Mode};
use crate::ingest::clean_html_text;
use crate::ingest::types::SourceProvider;
use crate::schema::{GenericItem, ItemMeta, ResearchItem};

pub const NAME: &str = "wikipedia";
pub const DEFAULT_BASE_URL: &str = "https://en.wikipedia.org";
// reference material, not discussion
const RELEVANCE: f64 = 0.6;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    query: Option<QueryBlock>,
}

#[derive(Debug, Deserialize)]
struct QueryBlock {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    pageid: Option<i64>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

/// Article URL for a page title.
pub fn article_url(title: &str) -> String {
    let slug = title.replace(' ', "_");
    let mut url = String::from("https://en.wikipedia.org/wiki/");
    url.extend(url::form_urlencoded::byte_serialize(slug.as_bytes()));
    url
}

/// Page hits from the MediaWiki search API. Undated.
pub struct WikipediaProvider {
    mode: Mode,
}

impl WikipediaProvider {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            mode: Mode::http(base_url, client),
        }
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self::from_url(DEFAULT_BASE_URL, client)
    }

    pub fn parse(body: &str, limit: usize) -> Result<Vec<ResearchItem>> {
        let resp: ApiResponse = serde_json::from_str(body).context("parsing wikipedia json")?;
        let hits = resp.query.map(|q| q.search).unwrap_or_default();
        Ok(hits
            .into_iter()
            .take(limit)
            .map(|h| {
                GenericItem {
                    snippet: clean_html_text(&h.snippet, 500),
                    source_name: NAME.to_string(),
                    author: String::new(),
                    meta: ItemMeta::new(
                        h.pageid.map(|i| i.to_string()).unwrap_or_default(),
                        article_url(&h.title),
                    )
                    .relevance(RELEVANCE),
                    title: h.title,
                }
                .into()
            })
            .collect())
    }
}

#[async_trait]
impl SourceProvider for WikipediaProvider {
    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<ResearchItem>> {
        let body = self
            .mode
            .body(NAME, |base| {
                endpoint(
                    base,
                    "/w/api.php",
                    &[
                        ("action", "query".to_string()),
                        ("format", "json".to_string()),
                        ("list", "search".to_string()),
                        ("srsearch", query.to_string()),
                        ("srlimit", limit.to_string()),
                    ],
                )
            })
            .await?;
        Self::parse(&body, limit)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
