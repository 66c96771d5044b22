// src/ingest/providers/reddit.rs
//! Reddit thread enrichment.
//!
//! Reddit threads are not searched here; they arrive as URLs (from the caller
//! or the CLI) and are enriched from the thread's public `.json` listing with
//! real engagement, a reliable date and the top comments.

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::time::Instant;
use url::Url;

use super::{endpoint, Mode};
use crate::dates;
use crate::ingest::types::FetchResult;
use crate::schema::{Comment, DateConfidence, Engagement, ItemMeta, RedditItem, ResearchItem};

pub const NAME: &str = "reddit";
pub const DEFAULT_BASE_URL: &str = "https://www.reddit.com";
/// Retried when the main host answers 403.
pub const FALLBACK_BASE_URL: &str = "https://old.reddit.com";
pub const MAX_COMMENTS: usize = 5;
const EXCERPT_CHARS: usize = 500;

static RE_THREAD: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"reddit\.com/r/([^/?#]+)/comments/([^/?#]+)",
        r"/r/([^/?#]+)/comments/([^/?#]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedditUrlInfo {
    pub subreddit: String,
    pub post_id: String,
}

/// Subreddit and post id from a thread URL or a bare `/r/<sub>/comments/<id>` path.
pub fn extract_reddit_url_info(url: &str) -> Option<RedditUrlInfo> {
    RE_THREAD.iter().find_map(|re| {
        re.captures(url).map(|c| RedditUrlInfo {
            subreddit: c[1].to_string(),
            post_id: c[2].to_string(),
        })
    })
}

/// `.json` listing endpoint for a thread, with at most `limit` comments.
pub fn build_reddit_json_url(base: &str, url: &str, limit: usize) -> Option<Url> {
    let info = extract_reddit_url_info(url)?;
    endpoint(
        base,
        &format!("/r/{}/comments/{}.json", info.subreddit, info.post_id),
        &[("limit", limit.to_string())],
    )
    .ok()
}

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    data: ListingData,
}

#[derive(Debug, Default, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    #[serde(default)]
    kind: String,
    #[serde(default)]
    data: ThingData,
}

// Posts (t3) and comments (t1) share one loose shape; "more" stubs parse to defaults.
#[derive(Debug, Default, Deserialize)]
struct ThingData {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    score: Option<i64>,
    upvote_ratio: Option<f64>,
    num_comments: Option<i64>,
    created_utc: Option<f64>,
    #[serde(default)]
    subreddit: String,
    author: Option<String>,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    body: String,
}

/// A thread as read from its `.json` listing.
#[derive(Debug, Clone, PartialEq)]
pub struct RedditPost {
    pub id: String,
    pub title: String,
    pub score: i64,
    pub upvote_ratio: f64,
    pub num_comments: i64,
    pub created_utc: Option<i64>,
    pub subreddit: String,
    pub author: String,
    pub selftext: String,
    pub url: String,
    pub permalink: String,
    /// Highest score first.
    pub top_comments: Vec<Comment>,
}

fn excerpt(body: &str) -> String {
    if body.chars().count() > EXCERPT_CHARS {
        let head: String = body.chars().take(EXCERPT_CHARS - 3).collect();
        format!("{head}...")
    } else {
        body.to_string()
    }
}

fn permalink_url(permalink: &str) -> String {
    if permalink.is_empty() {
        String::new()
    } else {
        format!("https://www.reddit.com{permalink}")
    }
}

/// Parse the two-listing thread body: `[post listing, comment listing]`.
pub fn parse_reddit_post(body: &str) -> Result<RedditPost> {
    let listings: Vec<Listing> = serde_json::from_str(body).context("parsing reddit thread json")?;
    let mut listings = listings.into_iter();
    let (Some(post_listing), Some(comment_listing)) = (listings.next(), listings.next()) else {
        return Err(anyhow!("reddit thread json: expected post and comment listings"));
    };
    let post = post_listing
        .data
        .children
        .into_iter()
        .next()
        .map(|t| t.data)
        .ok_or_else(|| anyhow!("reddit thread json: empty post listing"))?;

    let mut top_comments: Vec<Comment> = comment_listing
        .data
        .children
        .into_iter()
        .take(MAX_COMMENTS)
        .filter(|t| t.kind == "t1" && !t.data.body.is_empty())
        .map(|t| Comment {
            score: t.data.score.unwrap_or(0),
            author: t.data.author.unwrap_or_else(|| "[deleted]".to_string()),
            excerpt: excerpt(&t.data.body),
            url: permalink_url(&t.data.permalink),
            date: t
                .data
                .created_utc
                .and_then(|ts| dates::timestamp_to_date(ts as i64)),
        })
        .collect();
    top_comments.sort_by(|a, b| b.score.cmp(&a.score));

    Ok(RedditPost {
        id: post.id,
        title: post.title,
        score: post.score.unwrap_or(0),
        upvote_ratio: post.upvote_ratio.unwrap_or(0.5),
        num_comments: post.num_comments.unwrap_or(0),
        created_utc: post.created_utc.map(|ts| ts as i64),
        subreddit: post.subreddit,
        author: post.author.unwrap_or_else(|| "[deleted]".to_string()),
        selftext: post.selftext,
        url: post.url,
        permalink: permalink_url(&post.permalink),
        top_comments,
    })
}

/// Apply thread data to an item: engagement, a high-confidence date when the
/// API gave a timestamp, and the top comments. Empty title/subreddit are filled.
pub fn apply_post(mut item: RedditItem, post: RedditPost) -> RedditItem {
    item.meta.engagement = Engagement {
        score: Some(post.score),
        num_comments: Some(post.num_comments),
        upvote_ratio: Some(post.upvote_ratio),
        ..Default::default()
    }
    .non_empty();

    if let Some(date) = post.created_utc.and_then(dates::timestamp_to_date) {
        item.meta.date = Some(date);
        item.meta.date_confidence = DateConfidence::High;
    }
    if item.title.is_empty() {
        item.title = post.title;
    }
    if item.subreddit.is_empty() {
        item.subreddit = post.subreddit;
    }
    item.top_comments = post.top_comments;
    item
}

/// Bare item for a thread URL, ready to be enriched.
pub fn item_from_url(url: &str) -> RedditItem {
    let info = extract_reddit_url_info(url);
    RedditItem {
        title: String::new(),
        subreddit: info.as_ref().map(|i| i.subreddit.clone()).unwrap_or_default(),
        top_comments: Vec::new(),
        meta: ItemMeta::new(
            info.map(|i| i.post_id).unwrap_or_else(|| url.to_string()),
            url,
        ),
    }
}

/// Fetches thread listings and enriches [`RedditItem`]s, one thread at a time.
pub struct RedditEnricher {
    mode: Mode,
    fallback: Option<Mode>,
}

impl RedditEnricher {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
            fallback: None,
        }
    }

    pub fn from_url(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            mode: Mode::http(base_url, client),
            fallback: None,
        }
    }

    /// www.reddit.com, retrying old.reddit.com on 403.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self::from_url(DEFAULT_BASE_URL, client.clone()).with_fallback(FALLBACK_BASE_URL, client)
    }

    pub fn with_fallback(mut self, base_url: &str, client: reqwest::Client) -> Self {
        self.fallback = Some(Mode::http(base_url, client));
        self
    }

    async fn body_from(mode: &Mode, url: &str) -> Result<String> {
        mode.body(NAME, |base| {
            build_reddit_json_url(base, url, MAX_COMMENTS)
                .ok_or_else(|| anyhow!("not a reddit thread url: {url}"))
        })
        .await
    }

    /// Thread data for `url`.
    pub async fn fetch_post(&self, url: &str) -> Result<RedditPost> {
        let body = match (Self::body_from(&self.mode, url).await, &self.fallback) {
            (Err(e), Some(fallback)) if format!("{e:#}").starts_with("HTTP 403") => {
                tracing::debug!(target: "ingest", provider = NAME, url, "403, retrying fallback host");
                Self::body_from(fallback, url).await?
            }
            (res, _) => res?,
        };
        parse_reddit_post(&body)
    }

    /// Enrich one item. On failure the item comes back unchanged with the error.
    pub async fn enrich_item_with_error(&self, item: RedditItem) -> (RedditItem, Option<String>) {
        match self.fetch_post(&item.meta.url).await {
            Ok(post) => (apply_post(item, post), None),
            Err(e) => {
                tracing::warn!(target: "ingest", provider = NAME, url = %item.meta.url, error = ?e, "enrichment failed");
                (item, Some(format!("{e:#}")))
            }
        }
    }

    pub async fn enrich_reddit_item(&self, item: RedditItem) -> RedditItem {
        self.enrich_item_with_error(item).await.0
    }

    /// Enrich every URL into a single fetch result. Threads that fail to
    /// enrich are kept as bare items and the first error is reported.
    pub async fn enrich_urls(&self, urls: &[String]) -> FetchResult {
        let t0 = Instant::now();
        let mut items: Vec<ResearchItem> = Vec::with_capacity(urls.len());
        let mut first_error: Option<String> = None;
        for url in urls {
            let (item, err) = self.enrich_item_with_error(item_from_url(url)).await;
            if first_error.is_none() {
                first_error = err;
            }
            items.push(item.into());
        }
        let mut result = FetchResult::ok(NAME, items, t0.elapsed().as_millis() as u64);
        result.error = first_error;
        result
    }
}
