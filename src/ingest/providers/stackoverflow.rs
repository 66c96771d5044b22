// src/ingest/providers/stackoverflow.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{dated_ts, endpoint, Mode};
use crate::ingest::clean_html_text;
use crate::ingest::types::SourceProvider;
use crate::schema::{Engagement, ItemMeta, ResearchItem, StackOverflowItem};

pub const NAME: &str = "stackoverflow";
pub const DEFAULT_BASE_URL: &str = "https://api.stackexchange.com";
const RELEVANCE: f64 = 0.7;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct Question {
    question_id: Option<i64>,
    title: Option<String>,
    link: Option<String>,
    score: Option<i64>,
    answer_count: Option<i64>,
    view_count: Option<i64>,
    #[serde(default)]
    is_answered: bool,
    creation_date: Option<i64>,
    #[serde(default)]
    tags: Vec<String>,
}

/// Questions from the Stack Exchange search API.
pub struct StackOverflowProvider {
    mode: Mode,
}

impl StackOverflowProvider {
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
        let resp: SearchResponse =
            serde_json::from_str(body).context("parsing stack exchange json")?;
        Ok(resp
            .items
            .into_iter()
            .take(limit)
            .map(|q| {
                let (date, confidence) = dated_ts(q.creation_date);
                let id = q.question_id.map(|i| i.to_string()).unwrap_or_default();
                StackOverflowItem {
                    // titles come back HTML-escaped
                    title: clean_html_text(q.title.as_deref().unwrap_or_default(), 500),
                    tags: q.tags,
                    top_answers: Vec::new(),
                    meta: ItemMeta::new(id, q.link.unwrap_or_default())
                        .date(date, confidence)
                        .engagement(Engagement {
                            votes: q.score,
                            answer_count: q.answer_count,
                            view_count: q.view_count,
                            // search results carry is_answered, not the accepted flag
                            is_accepted: Some(q.is_answered),
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
impl SourceProvider for StackOverflowProvider {
    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<ResearchItem>> {
        let body = self
            .mode
            .body(NAME, |base| {
                endpoint(
                    base,
                    "/2.3/search",
                    &[
                        ("order", "desc".to_string()),
                        ("sort", "relevance".to_string()),
                        ("intitle", query.to_string()),
                        ("site", "stackoverflow".to_string()),
                        ("pagesize", limit.to_string()),
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
