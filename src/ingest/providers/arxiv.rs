// src/ingest/providers/arxiv.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;

use super::{dated, endpoint, Mode};
use crate::ingest::clean_html_text;
use crate::ingest::types::SourceProvider;
use crate::schema::{GenericItem, ItemMeta, ResearchItem};

pub const NAME: &str = "arxiv";
pub const DEFAULT_BASE_URL: &str = "http://export.arxiv.org";
const RELEVANCE: f64 = 0.7;
const MAX_AUTHORS: usize = 3;
const SNIPPET_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    published: Option<String>,
    #[serde(rename = "author", default)]
    authors: Vec<Author>,
    #[serde(rename = "link", default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@rel")]
    rel: Option<String>,
    #[serde(rename = "@type")]
    kind: Option<String>,
}

impl Entry {
    /// PDF link when present, otherwise the last `alternate` link.
    fn best_url(&self) -> String {
        if let Some(pdf) = self
            .links
            .iter()
            .find(|l| l.kind.as_deref() == Some("application/pdf"))
        {
            return pdf.href.clone();
        }
        self.links
            .iter()
            .rev()
            .find(|l| l.rel.as_deref() == Some("alternate"))
            .map(|l| l.href.clone())
            .unwrap_or_default()
    }
}

/// Papers from the arXiv Atom query API.
pub struct ArxivProvider {
    mode: Mode,
}

impl ArxivProvider {
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
        let feed: Feed = from_str(body).context("parsing arxiv atom xml")?;
        Ok(feed
            .entries
            .into_iter()
            .take(limit)
            .map(|e| {
                let (date, confidence) = dated(e.published.as_deref());
                let url = e.best_url();
                let author = e
                    .authors
                    .iter()
                    .filter_map(|a| a.name.as_deref())
                    .map(str::trim)
                    .take(MAX_AUTHORS)
                    .collect::<Vec<_>>()
                    .join(", ");
                GenericItem {
                    title: clean_html_text(e.title.as_deref().unwrap_or_default(), SNIPPET_CHARS),
                    source_name: NAME.to_string(),
                    snippet: clean_html_text(
                        e.summary.as_deref().unwrap_or_default(),
                        SNIPPET_CHARS,
                    ),
                    author,
                    meta: ItemMeta::new(e.id.unwrap_or_default().trim(), url)
                        .date(date, confidence)
                        .relevance(RELEVANCE),
                }
                .into()
            })
            .collect())
    }
}

#[async_trait]
impl SourceProvider for ArxivProvider {
    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<ResearchItem>> {
        let body = self
            .mode
            .body(NAME, |base| {
                endpoint(
                    base,
                    "/api/query",
                    &[
                        ("search_query", format!("all:{query}")),
                        ("max_results", limit.to_string()),
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

    const FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query</title>
  <id>http://arxiv.org/api/abc</id>
  <entry>
    <id>http://arxiv.org/abs/2401.00001v1</id>
    <updated>2024-01-02T00:00:00Z</updated>
    <published>2024-01-01T18:00:00Z</published>
    <title>Ownership Types
      for Safe Systems Programming</title>
    <summary>  We study borrow checking.  </summary>
    <author><name>A. One</name></author>
    <author><name>B. Two</name></author>
    <author><name>C. Three</name></author>
    <author><name>D. Four</name></author>
    <link href="http://arxiv.org/abs/2401.00001v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2401.00001v1" rel="related" type="application/pdf"/>
    <arxiv:primary_category term="cs.PL" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2401.00002v1</id>
    <title>No pdf</title>
    <link href="http://arxiv.org/abs/2401.00002v1" rel="alternate" type="text/html"/>
  </entry>
</feed>"#;

    #[test]
    fn parses_entries() {
        let items = ArxivProvider::parse(FIXTURE, 10).unwrap();
        assert_eq!(items.len(), 2);
        match &items[0] {
            ResearchItem::Generic(g) => {
                assert_eq!(g.title, "Ownership Types for Safe Systems Programming");
                assert_eq!(g.snippet, "We study borrow checking.");
                assert_eq!(g.author, "A. One, B. Two, C. Three");
                assert_eq!(g.meta.url, "http://arxiv.org/pdf/2401.00001v1");
                assert_eq!(g.meta.id, "http://arxiv.org/abs/2401.00001v1");
                assert_eq!(g.meta.date.as_deref(), Some("2024-01-01"));
                assert!(g.meta.engagement.is_none());
            }
            other => panic!("unexpected variant {other:?}"),
        }
        assert_eq!(items[1].url(), "http://arxiv.org/abs/2401.00002v1");
        assert_eq!(items[1].date(), None);
    }

    #[test]
    fn empty_feed_and_garbage() {
        let empty = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>x</title></feed>"#;
        assert!(ArxivProvider::parse(empty, 5).unwrap().is_empty());
        assert!(ArxivProvider::parse("{not xml", 5).is_err());
    }
}
