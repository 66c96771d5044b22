// src/render.rs
//! Report output: full markdown, raw JSON, or a compact context snippet.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;

use crate::dates::format_relative_date;
use crate::schema::{GroundedAnswer, ResearchItem, ResearchReport, SourceStatus};

pub const FINDINGS_TABLE_ROWS: usize = 15;
pub const SOURCE_LIST_LEN: usize = 30;
pub const CONTEXT_FINDINGS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown report.
    #[default]
    Report,
    /// Full report as JSON.
    Json,
    /// Compact JSON summary for embedding elsewhere.
    Context,
}

/// `"hacker news"` → `"Hacker News"`; letters after any non-letter are capitalized.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper_next = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if upper_next {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            upper_next = false;
        } else {
            out.push(c);
            upper_next = true;
        }
    }
    out
}

/// `12345` → `"12,345"`.
fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

/// Compact engagement summary, `-` when nothing is known.
pub fn render_engagement(item: &ResearchItem) -> String {
    let Some(e) = item.engagement() else {
        return "-".to_string();
    };
    let mut parts: Vec<String> = Vec::new();
    if let Some(v) = e.score {
        parts.push(format!("{} pts", thousands(v)));
    }
    if let Some(v) = e.num_comments {
        parts.push(format!("{v} comments"));
    }
    if let Some(v) = e.likes {
        parts.push(format!("{} likes", thousands(v)));
    }
    if let Some(v) = e.reposts {
        parts.push(format!("{} reposts", thousands(v)));
    }
    if let (Some(v), None) = (e.points, e.score) {
        parts.push(format!("{v} points"));
    }
    if let Some(v) = e.votes {
        parts.push(format!("{v} votes"));
    }
    if let Some(v) = e.answer_count {
        parts.push(format!("{v} answers"));
    }
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(", ")
    }
}

pub fn render_source_badge(item: &ResearchItem) -> String {
    match item {
        ResearchItem::Reddit(r) => format!("Reddit r/{}", r.subreddit),
        ResearchItem::Twitter(t) => format!("Twitter @{}", t.author_handle),
        ResearchItem::HackerNews(_) => "HackerNews".to_string(),
        ResearchItem::StackOverflow(_) => "Stack Overflow".to_string(),
        ResearchItem::Generic(g) => title_case(&g.source_name),
    }
}

pub fn item_title(item: &ResearchItem) -> String {
    let t = item.title_or_text();
    match item {
        _ if t.is_empty() => "(no title)".to_string(),
        ResearchItem::Twitter(_) => truncate_with_ellipsis(t, 100),
        _ => t.to_string(),
    }
}

fn truncate_with_ellipsis(s: &str, keep: usize) -> String {
    if s.chars().count() > keep {
        format!("{}...", s.chars().take(keep).collect::<String>())
    } else {
        s.to_string()
    }
}

/// Best link for an item; HN stories link to the discussion.
pub fn item_url(item: &ResearchItem) -> &str {
    match item {
        ResearchItem::HackerNews(h) if !h.hn_url.is_empty() => h.hn_url.as_str(),
        _ => item.url(),
    }
}

pub fn render_findings_table(items: &[ResearchItem], max_items: usize) -> String {
    if items.is_empty() {
        return "*No findings*\n".to_string();
    }
    let mut out = String::from(
        "| Rank | Score | Finding | Source | Engagement |\n|------|-------|---------|--------|------------|\n",
    );
    for (i, item) in items.iter().take(max_items).enumerate() {
        let title = truncate(&item_title(item), 60).replace('|', "\\|");
        let url = item_url(item);
        let finding = if url.is_empty() {
            title
        } else {
            format!("[{title}]({url})")
        };
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            i + 1,
            item.score(),
            finding,
            render_source_badge(item),
            render_engagement(item)
        );
    }
    out
}

pub fn render_source_status(statuses: &[SourceStatus]) -> String {
    if statuses.is_empty() {
        return String::new();
    }
    let mut out = String::from(
        "\n## Source Reliability\n\n| Source | Status | Results | Duration | Notes |\n|--------|--------|---------|----------|-------|\n",
    );
    for s in statuses {
        let duration = match s.duration_ms {
            Some(ms) if ms > 0 => format!("{ms}ms"),
            _ => "-".to_string(),
        };
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            title_case(&s.source_name),
            if s.success { "OK" } else { "FAIL" },
            s.item_count,
            duration,
            s.error.as_deref().unwrap_or("-")
        );
    }
    out
}

pub fn render_grounded_answer(answer: Option<&GroundedAnswer>) -> String {
    let Some(answer) = answer.filter(|a| !a.text.trim().is_empty()) else {
        return String::new();
    };
    let mut out = format!("\n## Grounded Answer\n\n{}\n", answer.text.trim());
    if !answer.citations.is_empty() {
        out.push_str("\n**Citations:**\n");
        for c in &answer.citations {
            let label = c
                .number
                .map(|n| format!("[{n}]"))
                .unwrap_or_else(|| "-".to_string());
            let snippet = truncate(c.snippet.replace('\n', " ").trim(), 200);
            let _ = writeln!(out, "- {label} {} - {snippet}", c.url);
        }
    }
    out
}

fn render_reddit_section(items: &[ResearchItem]) -> String {
    let mut out = String::new();
    for item in items.iter().take(10) {
        let ResearchItem::Reddit(r) = item else { continue };
        let _ = writeln!(
            out,
            "- [{}]({}) (r/{}, {}, {})",
            r.title,
            r.meta.url,
            r.subreddit,
            render_engagement(item),
            format_relative_date(r.meta.date.as_deref())
        );
        for c in r.top_comments.iter().take(3) {
            let _ = writeln!(
                out,
                "  - **{}** ({} pts): {}",
                c.author,
                c.score,
                truncate_with_ellipsis(&c.excerpt, 200)
            );
        }
    }
    if out.is_empty() {
        out
    } else {
        format!("\n### Reddit\n\n{out}")
    }
}

fn render_twitter_section(items: &[ResearchItem]) -> String {
    let mut out = String::new();
    for item in items.iter().take(10) {
        let ResearchItem::Twitter(t) = item else { continue };
        let _ = writeln!(
            out,
            "- **@{}**: \"{}\" ([link]({}), {}, {})",
            t.author_handle,
            truncate_with_ellipsis(&t.text, 150),
            t.meta.url,
            render_engagement(item),
            format_relative_date(t.meta.date.as_deref())
        );
    }
    if out.is_empty() {
        out
    } else {
        format!("\n### Twitter/X\n\n{out}")
    }
}

fn render_community_section(hn: &[ResearchItem], so: &[ResearchItem]) -> String {
    if hn.is_empty() && so.is_empty() {
        return String::new();
    }
    let mut out = String::from("\n### Community (HN/Stack Overflow)\n\n");
    if !hn.is_empty() {
        out.push_str("**HackerNews:**\n\n");
        for item in hn.iter().take(5) {
            let _ = writeln!(
                out,
                "- [{}]({}) ({}, {})",
                item.title_or_text(),
                item_url(item),
                render_engagement(item),
                format_relative_date(item.date())
            );
        }
    }
    if !so.is_empty() {
        if !hn.is_empty() {
            out.push('\n');
        }
        out.push_str("**Stack Overflow:**\n\n");
        for item in so.iter().take(5) {
            let tags = match item {
                ResearchItem::StackOverflow(q) => q.tags.iter().take(3).cloned().collect::<Vec<_>>().join(", "),
                _ => String::new(),
            };
            let _ = writeln!(
                out,
                "- [{}]({}) ({}, tags: {})",
                item.title_or_text(),
                item.url(),
                render_engagement(item),
                tags
            );
        }
    }
    out
}

fn render_generic_section(items: &[ResearchItem]) -> String {
    // grouped by concrete source, in order of first appearance
    let mut order: Vec<&str> = Vec::new();
    let mut groups: BTreeMap<&str, Vec<&ResearchItem>> = BTreeMap::new();
    for item in items {
        let ResearchItem::Generic(g) = item else { continue };
        let key = g.source_name.as_str();
        if !groups.contains_key(key) {
            order.push(key);
        }
        groups.entry(key).or_default().push(item);
    }
    if order.is_empty() {
        return String::new();
    }

    let mut out = String::from("\n### Other Sources\n\n");
    for source in order {
        let _ = writeln!(out, "**{}:**\n", title_case(source));
        for item in groups[source].iter().take(5) {
            let _ = writeln!(
                out,
                "- [{}]({}) ({}, {})",
                item.title_or_text(),
                item.url(),
                render_engagement(item),
                format_relative_date(item.date())
            );
        }
        out.push('\n');
    }
    out
}

pub fn render_markdown_report(report: &ResearchReport) -> String {
    let mut out = String::new();
    let generated = report.generated_at.get(..10).unwrap_or(&report.generated_at);
    let _ = writeln!(out, "# Research: {}\n", report.topic);
    let _ = writeln!(
        out,
        "**Query Type:** {} | **Depth:** {} | **Generated:** {}\n",
        report.query_type, report.depth, generated
    );

    let ok = report.source_status.iter().filter(|s| s.success).count();
    let _ = writeln!(
        out,
        "\n## Summary\n\nFound {} results from {}/{} sources.\n",
        report.total_items(),
        ok,
        report.source_status.len()
    );

    out.push_str(&render_grounded_answer(report.grounded_answer.as_ref()));

    out.push_str("\n## Top Findings (Ranked by Score)\n\n");
    out.push_str(&render_findings_table(&report.all_results, FINDINGS_TABLE_ROWS));

    out.push_str(&render_reddit_section(&report.reddit));
    out.push_str(&render_twitter_section(&report.twitter));
    out.push_str(&render_community_section(&report.hackernews, &report.stackoverflow));
    out.push_str(&render_generic_section(&report.generic));
    out.push_str(&render_source_status(&report.source_status));

    out.push_str("\n## All Sources\n\n");
    let mut seen: HashSet<&str> = HashSet::new();
    let mut n = 1;
    for item in report.all_results.iter().take(SOURCE_LIST_LEN) {
        let url = item_url(item);
        if url.is_empty() || !seen.insert(url) {
            continue;
        }
        let _ = writeln!(
            out,
            "{n}. [{}]({url}) - {} confidence, {}",
            item_title(item),
            item.date_confidence(),
            item.date().unwrap_or("unknown")
        );
        n += 1;
    }
    out
}

pub fn render_json(report: &ResearchReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("serializing report")
}

#[derive(Debug, Serialize)]
struct ContextFinding {
    text: String,
    source: String,
    url: String,
    score: u32,
    engagement: String,
}

#[derive(Debug, Serialize)]
struct ContextSnippet<'a> {
    topic: &'a str,
    query_type: crate::query::QueryType,
    timestamp: &'a str,
    top_findings: Vec<ContextFinding>,
    sources_searched: usize,
    sources_successful: usize,
}

/// Compact JSON for other tools to consume without re-running the research.
pub fn render_context(report: &ResearchReport) -> Result<String> {
    let snippet = ContextSnippet {
        topic: &report.topic,
        query_type: report.query_type,
        timestamp: &report.generated_at,
        top_findings: report
            .all_results
            .iter()
            .take(CONTEXT_FINDINGS)
            .map(|item| ContextFinding {
                text: item_title(item),
                source: render_source_badge(item),
                url: item_url(item).to_string(),
                score: item.score(),
                engagement: render_engagement(item),
            })
            .collect(),
        sources_searched: report.source_status.len(),
        sources_successful: report.source_status.iter().filter(|s| s.success).count(),
    };
    serde_json::to_string_pretty(&snippet).context("serializing context snippet")
}

pub fn render_report(report: &ResearchReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Report => Ok(render_markdown_report(report)),
        OutputFormat::Json => render_json(report),
        OutputFormat::Context => render_context(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::Depth;
    use crate::query::QueryType;
    use crate::schema::{
        DateConfidence, Engagement, GenericItem, GroundedCitation, HackerNewsItem, ItemMeta,
    };

    fn hn(id: &str, score: u32) -> ResearchItem {
        HackerNewsItem {
            title: format!("Story {id} | piped"),
            hn_url: format!("https://news.ycombinator.com/item?id={id}"),
            author: "a".into(),
            meta: ItemMeta::new(id, format!("https://ex.com/{id}"))
                .date(Some("2024-01-15".into()), DateConfidence::High)
                .engagement(Engagement {
                    points: Some(1200),
                    num_comments: Some(30),
                    ..Default::default()
                })
                .score(score),
        }
        .into()
    }

    fn report() -> ResearchReport {
        let mut r = ResearchReport::new("rust async", QueryType::General, Depth::Quick);
        let items = vec![hn("1", 80), hn("2", 60)];
        r.hackernews = items.clone();
        r.all_results = items;
        r.source_status = vec![
            SourceStatus {
                source_name: "hackernews".into(),
                success: true,
                item_count: 2,
                error: None,
                duration_ms: Some(120),
            },
            SourceStatus {
                source_name: "stackoverflow".into(),
                success: false,
                item_count: 0,
                error: Some("HTTP 503: Service Unavailable".into()),
                duration_ms: Some(40),
            },
        ];
        r
    }

    #[test]
    fn helpers() {
        assert_eq!(thousands(1234567), "1,234,567");
        assert_eq!(thousands(-1000), "-1,000");
        assert_eq!(thousands(999), "999");
        assert_eq!(title_case("brave_grounding"), "Brave_Grounding");
        assert_eq!(title_case("devto"), "Devto");
        assert_eq!(truncate("abcdefgh", 6), "abc...");
    }

    #[test]
    fn engagement_summary() {
        assert_eq!(render_engagement(&hn("1", 0)), "30 comments, 1200 points");
        let bare: ResearchItem = GenericItem {
            title: "t".into(),
            source_name: "wikipedia".into(),
            snippet: String::new(),
            author: String::new(),
            meta: ItemMeta::new("w", "https://w"),
        }
        .into();
        assert_eq!(render_engagement(&bare), "-");
        assert_eq!(render_source_badge(&bare), "Wikipedia");
    }

    #[test]
    fn markdown_has_sections() {
        let md = render_markdown_report(&report());
        assert!(md.starts_with("# Research: rust async"));
        assert!(md.contains("**Query Type:** GENERAL | **Depth:** quick"));
        assert!(md.contains("Found 2 results from 1/2 sources."));
        assert!(md.contains("| 1 | 80 | [Story 1 \\| piped](https://news.ycombinator.com/item?id=1)"));
        assert!(md.contains("| Stackoverflow | FAIL | 0 | 40ms | HTTP 503: Service Unavailable |"));
        assert!(md.contains("**HackerNews:**"));
        assert!(md.contains("1. [Story 1 | piped](https://news.ycombinator.com/item?id=1) - high confidence, 2024-01-15"));
        assert!(!md.contains("## Grounded Answer"));
    }

    #[test]
    fn grounded_answer_section() {
        let answer = GroundedAnswer {
            text: "Use tokio.".into(),
            citations: vec![GroundedCitation {
                number: Some(1),
                url: "https://tokio.rs".into(),
                snippet: "runtime\nfor rust".into(),
                start_index: None,
                end_index: None,
                favicon: None,
            }],
            usage: None,
        };
        let out = render_grounded_answer(Some(&answer));
        assert!(out.contains("## Grounded Answer"));
        assert!(out.contains("- [1] https://tokio.rs - runtime for rust"));
    }

    #[test]
    fn empty_report_renders() {
        let r = ResearchReport::new("nothing", QueryType::News, Depth::Default);
        let md = render_markdown_report(&r);
        assert!(md.contains("*No findings*"));
        assert!(md.contains("Found 0 results from 0/0 sources."));
    }

    #[test]
    fn json_and_context() {
        let r = report();
        let v: serde_json::Value = serde_json::from_str(&render_json(&r).unwrap()).unwrap();
        assert_eq!(v["depth"], "quick");
        assert_eq!(v["all_results"][0]["source_type"], "hackernews");

        let c: serde_json::Value =
            serde_json::from_str(&render_report(&r, OutputFormat::Context).unwrap()).unwrap();
        assert_eq!(c["query_type"], "GENERAL");
        assert_eq!(c["top_findings"].as_array().unwrap().len(), 2);
        assert_eq!(c["top_findings"][0]["source"], "HackerNews");
        assert_eq!(c["sources_successful"], 1);
    }
}
