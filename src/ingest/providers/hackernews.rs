// src/ingest/providers/hackernews.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{dated_ts, endpoint, Mode};
use crate::ingest::types::SourceProvider;
use crate::schema::{Engagement, HackerNewsItem, ItemMeta, ResearchItem};

pub const NAME: &str = "hackernews";
pub const DEFAULT_BASE_URL: &str = "https://hn.algolia.com";
const RELEVANCE: f64 = 0.7;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "objectID", default)]
    object_id: String,
    title: Option<String>,
    url: Option<String>,
    author: Option<String>,
    points: Option<i64>,
    num_comments: Option<i64>,
    created_at_i: Option<i64>,
}

/// Stories from the HN Algolia search API.
pub struct HackerNewsProvider {
    mode: Mode,
}

impl HackerNewsProvider {
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
        let resp: SearchResponse = serde_json::from_str(body).context("parsing hn search json")?;
        Ok(resp
            .hits
            .into_iter()
            .take(limit)
            .map(|hit| {
                let (date, confidence) = dated_ts(hit.created_at_i);
                HackerNewsItem {
                    title: hit.title.unwrap_or_default(),
                    hn_url: format!("https://news.ycombinator.com/item?id={}", hit.object_id),
                    author: hit.author.unwrap_or_default(),
                    meta: ItemMeta::new(hit.object_id, hit.url.unwrap_or_default())
                        .date(date, confidence)
                        .engagement(Engagement {
                            points: hit.points,
                            num_comments: hit.num_comments,
                            ..Default::default()
                        })
                        .relevance(RELEVANCE),
                }
                .into()
            })
            .collect())
    }
}

#[async_trait]
impl SourceProvider for HackerNewsProvider {
    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<ResearchItem>> {
        let body = self
            .mode
            .body(NAME, |base| {
                endpoint(
                    base,
                    "/api/v1/search",
                    &[
                        ("query", query.to_string()),
                        ("tags", "story".to_string()),
                        ("hitsPerPage", limit.to_string()),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SourceKind;

    const FIXTURE: &str = r#"{"hits": [
        {"objectID": "101", "title": "Show HN: A Rust thing", "url": "https://ex.com/a",
         "author": "alice", "points": 120, "num_comments": 40, "created_at_i": 1705312800},
        {"objectID": "102", "title": "Ask HN: no url", "url": null, "author": "bob",
         "points": null, "num_comments": null},
        {"objectID": "103", "title": "third"}
    ]}"#;

    #[test]
    fn parses_hits() {
        let items = HackerNewsProvider::parse(FIXTURE, 2).unwrap();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.kind(), SourceKind::HackerNews);
        assert_eq!(first.id(), "101");
        assert_eq!(first.date(), Some("2024-01-15"));
        assert_eq!(first.engagement().unwrap().points, Some(120));
        assert_eq!(first.relevance(), 0.7);
        match first {
            ResearchItem::HackerNews(hn) => {
                assert_eq!(hn.hn_url, "https://news.ycombinator.com/item?id=101")
            }
            other => panic!("unexpected variant {other:?}"),
        }

        let second = &items[1];
        assert_eq!(second.url(), "");
        assert!(second.engagement().is_none());
        assert!(second.date().is_none());
    }

    #[tokio::test]
    async fn fixture_mode_fetches() {
        let p = HackerNewsProvider::from_fixture(FIXTURE);
        assert_eq!(p.fetch("rust", 10).await.unwrap().len(), 3);
        assert_eq!(p.name(), "hackernews");
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(HackerNewsProvider::parse("<html>", 5).is_err());
    }
}
