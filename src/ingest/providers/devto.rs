// src/ingest/providers/devto.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{dated, endpoint, Mode};
use crate::ingest::types::SourceProvider;
use crate::schema::{Engagement, GenericItem, ItemMeta, ResearchItem};

pub const NAME: &str = "devto";
pub const DEFAULT_BASE_URL: &str = "https://dev.to";
// tag search is looser than free text
const RELEVANCE: f64 = 0.6;

#[derive(Debug, Deserialize)]
struct Article {
    id: Option<i64>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    description: Option<String>,
    published_at: Option<String>,
    positive_reactions_count: Option<i64>,
    comments_count: Option<i64>,
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct User {
    #[serde(default)]
    username: String,
}

/// Dev.to has no free-text search, so the query is squashed into a tag.
pub fn query_to_tag(query: &str) -> String {
    query
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Articles from the Dev.to tag API.
pub struct DevToProvider {
    mode: Mode,
}

impl DevToProvider {
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
        let articles: Vec<Article> = serde_json::from_str(body).context("parsing dev.to json")?;
        Ok(articles
            .into_iter()
            .take(limit)
            .map(|a| {
                let (date, confidence) = dated(a.published_at.as_deref());
                GenericItem {
                    title: a.title,
                    source_name: NAME.to_string(),
                    snippet: a.description.unwrap_or_default(),
                    author: a.user.map(|u| u.username).unwrap_or_default(),
                    meta: ItemMeta::new(a.id.map(|i| i.to_string()).unwrap_or_default(), a.url)
                        .date(date, confidence)
                        .engagement(Engagement {
                            points: a.positive_reactions_count,
                            num_comments: a.comments_count,
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
impl SourceProvider for DevToProvider {
    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<ResearchItem>> {
        let body = self
            .mode
            .body(NAME, |base| {
                endpoint(
                    base,
                    "/api/articles",
                    &[("tag", query_to_tag(query)), ("per_page", limit.to_string())],
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

    #[test]
    fn tag_is_squashed() {
        assert_eq!(query_to_tag("Web Assembly"), "webassembly");
        assert_eq!(query_to_tag("type-script"), "typescript");
    }

    #[test]
    fn parses_articles() {
        let body = r#"[
            {"id": 7, "title": "Intro to WASM", "url": "https://dev.to/u/intro",
             "description": "A gentle intro", "published_at": "2024-02-10T12:00:00Z",
             "positive_reactions_count": 55, "comments_count": 4, "user": {"username": "erin"}},
            {"id": 8, "title": "No user", "url": "https://dev.to/u/x"}
        ]"#;
        let items = DevToProvider::parse(body, 10).unwrap();
        assert_eq!(items.len(), 2);
        match &items[0] {
            ResearchItem::Generic(g) => {
                assert_eq!(g.author, "erin");
                assert_eq!(g.snippet, "A gentle intro");
                assert_eq!(g.meta.date.as_deref(), Some("2024-02-10"));
                assert_eq!(g.meta.relevance, 0.6);
            }
            other => panic!("unexpected variant {other:?}"),
        }
        assert!(items[1].engagement().is_none());
    }
}
