// src/ingest/providers/lobsters.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{dated, endpoint, Mode};
use crate::ingest::types::SourceProvider;
use crate::schema::{Engagement, GenericItem, ItemMeta, ResearchItem};

pub const NAME: &str = "lobsters";
pub const DEFAULT_BASE_URL: &str = "https://lobste.rs";
const RELEVANCE: f64 = 0.7;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Feed {
    List(Vec<Story>),
    Wrapped {
        #[serde(default)]
        results: Vec<Story>,
    },
}

#[derive(Debug, Deserialize)]
struct Story {
    #[serde(default)]
    short_id: String,
    #[serde(default)]
    title: String,
    url: Option<String>,
    score: Option<i64>,
    comment_count: Option<i64>,
    created_at: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    // a username string in newer feeds, an object in older ones
    submitter_user: Option<Value>,
    description_plain: Option<String>,
}

impl Story {
    fn matches(&self, terms: &[String]) -> bool {
        let title = self.title.to_lowercase();
        terms.iter().any(|t| {
            title.contains(t.as_str()) || self.tags.iter().any(|tag| tag.eq_ignore_ascii_case(t))
        })
    }

    fn author(&self) -> String {
        match &self.submitter_user {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Object(o)) => o
                .get("username")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        }
    }
}

/// Hottest stories, filtered client-side by query terms (no search endpoint).
pub struct LobstersProvider {
    mode: Mode,
}

impl LobstersProvider {
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

    pub fn parse(body: &str, query: &str, limit: usize) -> Result<Vec<ResearchItem>> {
        let feed: Feed = serde_json::from_str(body).context("parsing lobsters json")?;
        let stories = match feed {
            Feed::List(v) => v,
            Feed::Wrapped { results } => results,
        };
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();

        Ok(stories
            .into_iter()
            .filter(|s| s.matches(&terms))
            .take(limit)
            .map(|s| {
                let (date, confidence) = dated(s.created_at.as_deref());
                let url = match s.url.as_deref() {
                    Some(u) if !u.is_empty() => u.to_string(),
                    _ => format!("https://lobste.rs/s/{}", s.short_id),
                };
                let author = s.author();
                GenericItem {
                    source_name: NAME.to_string(),
                    snippet: s.description_plain.unwrap_or_default(),
                    author,
                    meta: ItemMeta::new(s.short_id, url)
                        .date(date, confidence)
                        .engagement(Engagement {
                            points: s.score,
                            num_comments: s.comment_count,
                            ..Default::default()
                        })
                        .relevance(RELEVANCE),
                    title: s.title,
                }
                .into()
            })
            .collect())
    }
}

#[async_trait]
impl SourceProvider for LobstersProvider {
    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<ResearchItem>> {
        let body = self
            .mode
            .body(NAME, |base| endpoint(base, "/hottest.json", &[]))
            .await?;
        Self::parse(&body, query, limit)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"[
        {"short_id": "abc123", "title": "Writing a Rust allocator", "url": "https://blog.ex/alloc",
         "score": 42, "comment_count": 9, "created_at": "2024-03-05T10:11:12.000-06:00",
         "tags": ["rust", "performance"], "submitter_user": "carol"},
        {"short_id": "def456", "title": "Text-only post", "url": "",
         "score": 3, "comment_count": 0, "created_at": "2024-03-04T08:00:00.000-06:00",
         "tags": ["rust"], "submitter_user": {"username": "dave"}},
        {"short_id": "zzz999", "title": "Gardening with Go", "url": "https://g.ex",
         "tags": ["go"]}
    ]"#;

    #[test]
    fn filters_by_title_or_tag() {
        let items = LobstersProvider::parse(FIXTURE, "Rust", 10).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].date(), Some("2024-03-05"));
        assert_eq!(items[0].engagement().unwrap().points, Some(42));

        match &items[1] {
            ResearchItem::Generic(g) => {
                assert_eq!(g.meta.url, "https://lobste.rs/s/def456");
                assert_eq!(g.author, "dave");
                assert_eq!(g.source_name, "lobsters");
            }
            other => panic!("unexpected variant {other:?}"),
        }
    }

    #[test]
    fn wrapped_feed_and_no_match() {
        let wrapped = format!(r#"{{"results": {FIXTURE}}}"#);
        assert_eq!(LobstersProvider::parse(&wrapped, "go", 10).unwrap().len(), 1);
        assert!(LobstersProvider::parse(FIXTURE, "haskell", 10).unwrap().is_empty());
    }
}
