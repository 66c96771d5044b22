// src/ingest/providers/duckduckgo.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{endpoint, Mode};
use crate::ingest::types::SourceProvider;
use crate::schema::{GenericItem, ItemMeta, ResearchItem};

pub const NAME: &str = "duckduckgo";
pub const DEFAULT_BASE_URL: &str = "https://api.duckduckgo.com";
// instant answers are supplementary
const ABSTRACT_RELEVANCE: f64 = 0.5;
const TOPIC_RELEVANCE: f64 = 0.4;
const MAX_TOPICS: usize = 3;
const TOPIC_TITLE_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default, rename = "Abstract")]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    // topic groups are nested objects without "Text"; they are skipped
    #[serde(default)]
    related_topics: Vec<Value>,
}

/// Abstract and related topics from the DuckDuckGo instant answer API.
pub struct DuckDuckGoProvider {
    mode: Mode,
}

impl DuckDuckGoProvider {
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

    pub fn parse(body: &str, query: &str) -> Result<Vec<ResearchItem>> {
        let ia: InstantAnswer = serde_json::from_str(body).context("parsing duckduckgo json")?;
        let mut out: Vec<ResearchItem> = Vec::new();

        if !ia.abstract_text.is_empty() {
            let title = if ia.heading.is_empty() {
                query.to_string()
            } else {
                ia.heading
            };
            out.push(
                GenericItem {
                    title,
                    source_name: NAME.to_string(),
                    snippet: ia.abstract_text,
                    author: String::new(),
                    meta: ItemMeta::new("ddg_abstract", ia.abstract_url)
                        .relevance(ABSTRACT_RELEVANCE),
                }
                .into(),
            );
        }

        for topic in ia.related_topics.iter().take(MAX_TOPICS) {
            let Some(text) = topic.get("Text").and_then(Value::as_str) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            let url = topic
                .get("FirstURL")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let id = format!("ddg_topic_{}", out.len());
            out.push(
                GenericItem {
                    title: text.chars().take(TOPIC_TITLE_CHARS).collect(),
                    source_name: NAME.to_string(),
                    snippet: text.to_string(),
                    author: String::new(),
                    meta: ItemMeta::new(id, url).relevance(TOPIC_RELEVANCE),
                }
                .into(),
            );
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for DuckDuckGoProvider {
    /// The instant answer API returns at most one abstract plus a few topics,
    /// so `limit` does not apply.
    async fn fetch(&self, query: &str, _limit: usize) -> Result<Vec<ResearchItem>> {
        let body = self
            .mode
            .body(NAME, |base| {
                endpoint(
                    base,
                    "/",
                    &[
                        ("q", query.to_string()),
                        ("format", "json".to_string()),
                        ("no_html", "1".to_string()),
                    ],
                )
            })
            .await?;
        Self::parse(&body, query)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_abstract_and_topics() {
        let body = r#"{
            "Heading": "Rust (programming language)",
            "Abstract": "Rust is a general-purpose programming language.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Rust_(programming_language)",
            "RelatedTopics": [
                {"Text": "Cargo - the Rust package manager", "FirstURL": "https://duckduckgo.com/Cargo"},
                {"Name": "See also", "Topics": []},
                {"Text": "Ferris - mascot", "FirstURL": "https://duckduckgo.com/Ferris"},
                {"Text": "Fourth, beyond the cap", "FirstURL": "https://duckduckgo.com/4"}
            ]
        }"#;
        let items = DuckDuckGoProvider::parse(body, "rust").unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].id(), "ddg_abstract");
        assert_eq!(items[0].relevance(), 0.5);
        assert_eq!(items[1].id(), "ddg_topic_1");
        assert_eq!(items[1].relevance(), 0.4);
        assert_eq!(items[2].title_or_text(), "Ferris - mascot");
    }

    #[test]
    fn empty_answer_yields_nothing() {
        let items = DuckDuckGoProvider::parse(r#"{"Abstract": "", "RelatedTopics": []}"#, "q").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn missing_heading_falls_back_to_query() {
        let items =
            DuckDuckGoProvider::parse(r#"{"Abstract": "text", "AbstractURL": ""}"#, "my query").unwrap();
        assert_eq!(items[0].title_or_text(), "my query");
    }
}
