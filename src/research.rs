// src/research.rs
//! One research run: classify, fetch, score, merge, dedupe.

use std::sync::Arc;
use std::time::Instant;

use crate::dedupe::dedupe_across_sources;
use crate::grounding::GroundingClient;
use crate::ingest::config::ResearchConfig;
use crate::ingest::types::{FetchResult, SourceProvider};
use crate::ingest::{convert_to_source_status, fetch_for_depth, Depth};
use crate::query::detect_query_type;
use crate::schema::{ResearchItem, ResearchReport, SourceKind};
use crate::score::{score_items, sort_all_items};

/// Items from every successful fetch, split by category in fetch order.
#[derive(Debug, Default)]
pub struct CollectedItems {
    pub reddit: Vec<ResearchItem>,
    pub twitter: Vec<ResearchItem>,
    pub hackernews: Vec<ResearchItem>,
    pub stackoverflow: Vec<ResearchItem>,
    pub generic: Vec<ResearchItem>,
}

impl CollectedItems {
    fn bucket(&mut self, kind: SourceKind) -> &mut Vec<ResearchItem> {
        match kind {
            SourceKind::Reddit => &mut self.reddit,
            SourceKind::Twitter => &mut self.twitter,
            SourceKind::HackerNews => &mut self.hackernews,
            SourceKind::StackOverflow => &mut self.stackoverflow,
            SourceKind::Generic => &mut self.generic,
        }
    }
}

/// Failed results contribute nothing.
pub fn collect_all_items(results: &[FetchResult]) -> CollectedItems {
    let mut out = CollectedItems::default();
    for r in results.iter().filter(|r| r.success) {
        for item in &r.items {
            out.bucket(item.kind()).push(item.clone());
        }
    }
    out
}

/// Run the full pipeline for `query`.
///
/// Never fails: provider and grounding errors end up in `source_status`.
pub async fn run_research(
    query: &str,
    depth: Depth,
    providers: &[Arc<dyn SourceProvider>],
    config: &ResearchConfig,
    grounding: Option<&GroundingClient>,
) -> ResearchReport {
    run_research_seeded(query, depth, providers, config, grounding, Vec::new()).await
}

/// [`run_research`] plus results gathered outside the provider fan-out
/// (enriched Reddit threads). Seeded results are scored and reported like any
/// other source.
pub async fn run_research_seeded(
    query: &str,
    depth: Depth,
    providers: &[Arc<dyn SourceProvider>],
    config: &ResearchConfig,
    grounding: Option<&GroundingClient>,
    seeded: Vec<FetchResult>,
) -> ResearchReport {
    let t0 = Instant::now();
    let query_type = detect_query_type(query);
    let max_days = query_type.max_days();
    let mut report = ResearchReport::new(query, query_type, depth);

    let grounding_status = match grounding {
        Some(g) => {
            let (answer, status) = g.fetch(query, depth).await;
            report.grounded_answer = answer;
            Some(status)
        }
        None => None,
    };

    let mut results = fetch_for_depth(query, providers, depth, &config.fetch).await;
    results.extend(seeded);
    report.source_status = convert_to_source_status(&results);
    report.source_status.extend(grounding_status);

    let collected = collect_all_items(&results);
    let w = &config.scoring;
    report.reddit = score_items(collected.reddit, max_days, w);
    report.twitter = score_items(collected.twitter, max_days, w);
    report.hackernews = score_items(collected.hackernews, max_days, w);
    report.stackoverflow = score_items(collected.stackoverflow, max_days, w);
    report.generic = score_items(collected.generic, max_days, w);

    let merged = sort_all_items([
        report.reddit.clone(),
        report.twitter.clone(),
        report.hackernews.clone(),
        report.stackoverflow.clone(),
        report.generic.clone(),
    ]);
    report.all_results = dedupe_across_sources(merged, config.dedupe.threshold);

    tracing::info!(
        target: "research",
        query_type = %query_type,
        depth = %depth,
        sources_ok = report.source_status.iter().filter(|s| s.success).count(),
        sources = report.source_status.len(),
        items = report.total_items(),
        results = report.all_results.len(),
        ms = t0.elapsed().as_millis() as u64,
        "research complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{GenericItem, HackerNewsItem, ItemMeta};

    fn hn(id: &str) -> ResearchItem {
        HackerNewsItem {
            title: format!("hn {id}"),
            hn_url: String::new(),
            author: String::new(),
            meta: ItemMeta::new(id, format!("https://h/{id}")),
        }
        .into()
    }

    fn generic(id: &str) -> ResearchItem {
        GenericItem {
            title: format!("g {id}"),
            source_name: "devto".into(),
            snippet: String::new(),
            author: String::new(),
            meta: ItemMeta::new(id, format!("https://g/{id}")),
        }
        .into()
    }

    #[test]
    fn collect_skips_failures_and_buckets_by_kind() {
        let results = vec![
            FetchResult::ok("hackernews", vec![hn("1"), hn("2")], 5),
            FetchResult::failed("stackoverflow", "HTTP 500: Internal Server Error", 3),
            FetchResult::ok("devto", vec![generic("a")], 7),
        ];
        let c = collect_all_items(&results);
        assert_eq!(c.hackernews.len(), 2);
        assert_eq!(c.generic.len(), 1);
        assert!(c.stackoverflow.is_empty());
        assert!(c.reddit.is_empty() && c.twitter.is_empty());
    }
}
