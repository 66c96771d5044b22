// src/schema.rs
//! Research item model shared by the source adapters, the scoring core and the
//! renderers.
//!
//! Every finding is a [`ResearchItem`], a sum type with one variant per source
//! category. Common attributes (identity, url, date, relevance, engagement,
//! sub-scores, final score) live in [`ItemMeta`], which each variant payload
//! embeds and which serializes flattened next to the variant-specific fields.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Engagement metrics. Which fields are populated depends on the source family;
/// `None` always means "unknown", never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    // forum / link posts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_comments: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upvote_ratio: Option<f64>,

    // microblog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reposts: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotes: Option<i64>,

    // link aggregators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,

    // Q&A
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_accepted: Option<bool>,
}

impl Engagement {
    /// True when no field carries data.
    pub fn is_empty(&self) -> bool {
        *self == Engagement::default()
    }

    /// Collapse an all-empty record into `None` so items without engagement
    /// never carry a zeroed record.
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// Component scores (0–100) kept for transparency in reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScores {
    pub relevance: u32,
    pub recency: u32,
    pub engagement: u32,
}

/// How much we trust an item's publication date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateConfidence {
    High,
    Med,
    #[default]
    Low,
}

impl DateConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateConfidence::High => "high",
            DateConfidence::Med => "med",
            DateConfidence::Low => "low",
        }
    }
}

impl fmt::Display for DateConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source category of an item. Declaration order is the presentation priority
/// used as a sort tie-breaker (Reddit first, Generic last).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Reddit,
    Twitter,
    HackerNews,
    StackOverflow,
    Generic,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Reddit,
        SourceKind::Twitter,
        SourceKind::HackerNews,
        SourceKind::StackOverflow,
        SourceKind::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Reddit => "reddit",
            SourceKind::Twitter => "twitter",
            SourceKind::HackerNews => "hackernews",
            SourceKind::StackOverflow => "stackoverflow",
            SourceKind::Generic => "generic",
        }
    }

    /// Lower is presented first on ties.
    pub fn priority(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top comment / answer excerpt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub score: i64,
    pub author: String,
    pub excerpt: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub date: Option<String>,
}

/// Attributes shared by every item variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemMeta {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub date_confidence: DateConfidence,
    #[serde(default)]
    pub engagement: Option<Engagement>,
    #[serde(default = "default_relevance")]
    pub relevance: f64,
    #[serde(default)]
    pub why_relevant: String,
    #[serde(default)]
    pub subs: SubScores,
    #[serde(default)]
    pub score: u32,
}

fn default_relevance() -> f64 {
    0.5
}

impl ItemMeta {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            date: None,
            date_confidence: DateConfidence::Low,
            engagement: None,
            relevance: default_relevance(),
            why_relevant: String::new(),
            subs: SubScores::default(),
            score: 0,
        }
    }

    pub fn date(mut self, date: Option<String>, confidence: DateConfidence) -> Self {
        self.date = date;
        self.date_confidence = confidence;
        self
    }

    /// Attach engagement; an all-empty record is stored as `None`.
    pub fn engagement(mut self, engagement: Engagement) -> Self {
        self.engagement = engagement.non_empty();
        self
    }

    pub fn relevance(mut self, relevance: f64) -> Self {
        self.relevance = relevance;
        self
    }

    pub fn score(mut self, score: u32) -> Self {
        self.score = score;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedditItem {
    pub title: String,
    pub subreddit: String,
    #[serde(default)]
    pub top_comments: Vec<Comment>,
    #[serde(flatten)]
    pub meta: ItemMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwitterItem {
    pub text: String,
    pub author_handle: String,
    #[serde(flatten)]
    pub meta: ItemMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HackerNewsItem {
    pub title: String,
    /// Link to the HN discussion thread.
    pub hn_url: String,
    #[serde(default)]
    pub author: String,
    #[serde(flatten)]
    pub meta: ItemMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackOverflowItem {
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub top_answers: Vec<Comment>,
    #[serde(flatten)]
    pub meta: ItemMeta,
}

/// Anything else: Dev.to, Lobsters, arXiv, Wikipedia, instant answers, blogs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericItem {
    pub title: String,
    /// Concrete origin, e.g. "devto", "lobsters", "arxiv", "wikipedia".
    pub source_name: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub author: String,
    #[serde(flatten)]
    pub meta: ItemMeta,
}

/// A finding from any source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source_type", rename_all = "lowercase")]
pub enum ResearchItem {
    Reddit(RedditItem),
    Twitter(TwitterItem),
    HackerNews(HackerNewsItem),
    StackOverflow(StackOverflowItem),
    Generic(GenericItem),
}

impl ResearchItem {
    pub fn kind(&self) -> SourceKind {
        match self {
            ResearchItem::Reddit(_) => SourceKind::Reddit,
            ResearchItem::Twitter(_) => SourceKind::Twitter,
            ResearchItem::HackerNews(_) => SourceKind::HackerNews,
            ResearchItem::StackOverflow(_) => SourceKind::StackOverflow,
            ResearchItem::Generic(_) => SourceKind::Generic,
        }
    }

    pub fn meta(&self) -> &ItemMeta {
        match self {
            ResearchItem::Reddit(it) => &it.meta,
            ResearchItem::Twitter(it) => &it.meta,
            ResearchItem::HackerNews(it) => &it.meta,
            ResearchItem::StackOverflow(it) => &it.meta,
            ResearchItem::Generic(it) => &it.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut ItemMeta {
        match self {
            ResearchItem::Reddit(it) => &mut it.meta,
            ResearchItem::Twitter(it) => &mut it.meta,
            ResearchItem::HackerNews(it) => &mut it.meta,
            ResearchItem::StackOverflow(it) => &mut it.meta,
            ResearchItem::Generic(it) => &mut it.meta,
        }
    }

    pub fn id(&self) -> &str {
        &self.meta().id
    }

    pub fn url(&self) -> &str {
        &self.meta().url
    }

    pub fn date(&self) -> Option<&str> {
        self.meta().date.as_deref()
    }

    pub fn date_confidence(&self) -> DateConfidence {
        self.meta().date_confidence
    }

    pub fn engagement(&self) -> Option<&Engagement> {
        self.meta().engagement.as_ref()
    }

    pub fn relevance(&self) -> f64 {
        self.meta().relevance
    }

    pub fn subs(&self) -> SubScores {
        self.meta().subs
    }

    pub fn score(&self) -> u32 {
        self.meta().score
    }

    /// Title for titled sources, post text for microblog posts.
    pub fn title_or_text(&self) -> &str {
        match self {
            ResearchItem::Reddit(it) => &it.title,
            ResearchItem::Twitter(it) => &it.text,
            ResearchItem::HackerNews(it) => &it.title,
            ResearchItem::StackOverflow(it) => &it.title,
            ResearchItem::Generic(it) => &it.title,
        }
    }
}

macro_rules! impl_from_variant {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for ResearchItem {
            fn from(it: $ty) -> Self {
                ResearchItem::$variant(it)
            }
        }
    };
}

impl_from_variant!(RedditItem, Reddit);
impl_from_variant!(TwitterItem, Twitter);
impl_from_variant!(HackerNewsItem, HackerNews);
impl_from_variant!(StackOverflowItem, StackOverflow);
impl_from_variant!(GenericItem, Generic);

/// Outcome of one source fetch, reported next to the findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceStatus {
    pub source_name: String,
    pub success: bool,
    #[serde(default)]
    pub item_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// One citation inside a grounded answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundedCitation {
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub start_index: Option<u64>,
    #[serde(default)]
    pub end_index: Option<u64>,
    #[serde(default)]
    pub favicon: Option<String>,
}

/// AI-grounded answer with its citations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundedAnswer {
    pub text: String,
    #[serde(default)]
    pub citations: Vec<GroundedCitation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<serde_json::Value>,
}

/// Full research report for one query.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchReport {
    pub topic: String,
    pub query_type: crate::query::QueryType,
    pub depth: crate::ingest::Depth,
    pub generated_at: String,

    pub reddit: Vec<ResearchItem>,
    pub twitter: Vec<ResearchItem>,
    pub hackernews: Vec<ResearchItem>,
    pub stackoverflow: Vec<ResearchItem>,
    pub generic: Vec<ResearchItem>,

    /// Combined, sorted and deduplicated findings.
    pub all_results: Vec<ResearchItem>,
    pub source_status: Vec<SourceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grounded_answer: Option<GroundedAnswer>,
}

impl ResearchReport {
    pub fn new(
        topic: impl Into<String>,
        query_type: crate::query::QueryType,
        depth: crate::ingest::Depth,
    ) -> Self {
        Self {
            topic: topic.into(),
            query_type,
            depth,
            generated_at: chrono::Utc::now().to_rfc3339(),
            reddit: Vec::new(),
            twitter: Vec::new(),
            hackernews: Vec::new(),
            stackoverflow: Vec::new(),
            generic: Vec::new(),
            all_results: Vec::new(),
            source_status: Vec::new(),
            grounded_answer: None,
        }
    }

    /// Number of scored items across every category (before cross-source dedup).
    pub fn total_items(&self) -> usize {
        self.reddit.len()
            + self.twitter.len()
            + self.hackernews.len()
            + self.stackoverflow.len()
            + self.generic.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_engagement_collapses_to_none() {
        let meta = ItemMeta::new("1", "https://example.com").engagement(Engagement::default());
        assert!(meta.engagement.is_none());

        let meta = ItemMeta::new("1", "https://example.com").engagement(Engagement {
            points: Some(0),
            ..Default::default()
        });
        assert_eq!(meta.engagement.unwrap().points, Some(0));
    }

    #[test]
    fn kind_priority_follows_declaration_order() {
        let prios: Vec<u8> = SourceKind::ALL.iter().map(|k| k.priority()).collect();
        assert_eq!(prios, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn serializes_with_source_type_tag_and_flat_meta() {
        let item: ResearchItem = HackerNewsItem {
            title: "Show HN".into(),
            hn_url: "https://news.ycombinator.com/item?id=1".into(),
            author: "pg".into(),
            meta: ItemMeta::new("1", "https://example.com").engagement(Engagement {
                points: Some(10),
                ..Default::default()
            }),
        }
        .into();

        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["source_type"], "hackernews");
        assert_eq!(v["id"], "1");
        assert_eq!(v["date_confidence"], "low");
        assert_eq!(v["engagement"]["points"], 10);
        assert!(v["engagement"].get("votes").is_none());

        let back: ResearchItem = serde_json::from_value(v).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn title_or_text_uses_text_for_microblog() {
        let item: ResearchItem = TwitterItem {
            text: "hello".into(),
            author_handle: "me".into(),
            meta: ItemMeta::new("t1", ""),
        }
        .into();
        assert_eq!(item.title_or_text(), "hello");
        assert_eq!(item.kind(), SourceKind::Twitter);
    }
}
