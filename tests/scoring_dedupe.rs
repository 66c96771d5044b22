// tests/scoring_dedupe.rs
use chrono::{Duration, NaiveDate};
use std::io::Write;

use community_research::dedupe::{
    dedupe_across_sources, dedupe_by_source, normalize_url, DEFAULT_THRESHOLD,
};
use community_research::ingest::config::load_config_from;
use community_research::schema::{
    DateConfidence, Engagement, GenericItem, HackerNewsItem, ItemMeta, RedditItem, ResearchItem,
    SourceKind,
};
use community_research::score::{score_items_at, sort_all_items, ScoringWeights};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

fn ago(days: i64) -> Option<String> {
    Some((today() - Duration::days(days)).format("%Y-%m-%d").to_string())
}

fn reddit(id: &str, url: &str, score: i64, comments: i64, rel: f64, age: i64) -> ResearchItem {
    RedditItem {
        title: format!("reddit thread {id}"),
        subreddit: "rust".into(),
        top_comments: Vec::new(),
        meta: ItemMeta::new(id, url)
            .date(ago(age), DateConfidence::High)
            .engagement(Engagement {
                score: Some(score),
                num_comments: Some(comments),
                upvote_ratio: Some(0.9),
                ..Default::default()
            })
            .relevance(rel),
    }
    .into()
}

fn hn_scored(id: &str, title: &str, url: &str, score: u32) -> ResearchItem {
    HackerNewsItem {
        title: title.into(),
        hn_url: String::new(),
        author: String::new(),
        meta: ItemMeta::new(id, url).score(score),
    }
    .into()
}

#[test]
fn stronger_fresher_thread_ranks_first() {
    let items = vec![
        reddit("b", "https://reddit.com/b", 3, 1, 0.5, 200),
        reddit("a", "https://reddit.com/a", 900, 300, 0.9, 2),
    ];
    let scored = score_items_at(items, 365, &ScoringWeights::default(), today());
    let ranked = sort_all_items([scored]);

    assert_eq!(ranked[0].id(), "a");
    assert!(ranked[0].score() > ranked[1].score());
    assert_eq!(ranked[0].subs().engagement, 100);
    assert_eq!(ranked[1].subs().engagement, 0);
}

#[test]
fn generic_without_engagement_uses_reweighted_formula() {
    let item: ResearchItem = GenericItem {
        title: "Some wiki page".into(),
        source_name: "wikipedia".into(),
        snippet: String::new(),
        author: String::new(),
        meta: ItemMeta::new("w", "https://en.wikipedia.org/wiki/X")
            .date(ago(7), DateConfidence::High)
            .relevance(0.7),
    }
    .into();
    let scored = score_items_at(vec![item], 365, &ScoringWeights::default(), today());

    // 0.55*70 + 0.45*98 + 5 - 15
    assert_eq!(scored[0].subs().recency, 98);
    assert_eq!(scored[0].score(), 72);
}

#[test]
fn same_story_on_two_sources_keeps_higher_score() {
    let reddit_copy: ResearchItem = RedditItem {
        title: "A new borrow checker".into(),
        subreddit: "rust".into(),
        top_comments: Vec::new(),
        meta: ItemMeta::new("r1", "https://Blog.Example.com/post/?utm_source=reddit&ref=front")
            .score(80),
    }
    .into();
    let hn_copy = hn_scored("h1", "Polonius lands", "https://blog.example.com/post", 60);
    let other = hn_scored("h2", "Unrelated", "https://other.example.com/", 70);

    let merged = sort_all_items([vec![reddit_copy], vec![hn_copy, other]]);
    let out = dedupe_across_sources(merged, DEFAULT_THRESHOLD);

    let ids: Vec<&str> = out.iter().map(|i| i.id()).collect();
    assert_eq!(ids, vec!["r1", "h2"]);

    // idempotent
    let again = dedupe_across_sources(out.clone(), DEFAULT_THRESHOLD);
    assert_eq!(again, out);
}

#[test]
fn near_identical_titles_merge_within_a_source() {
    let items = vec![
        hn_scored("1", "Rust 1.80 released with LazyCell", "https://a.test/1", 50),
        hn_scored("2", "Rust 1.80 released, with LazyCell!", "https://b.test/2", 55),
        hn_scored("3", "Go 1.23 iterators", "https://c.test/3", 10),
    ];
    let groups = dedupe_by_source(items, DEFAULT_THRESHOLD);
    let hn = &groups[&SourceKind::HackerNews];
    let ids: Vec<&str> = hn.iter().map(|i| i.id()).collect();
    assert_eq!(ids, vec!["2", "3"]);
}

#[test]
fn url_normalization_is_stable() {
    let raw = "HTTPS://Example.COM/a/b/?z=1&utm_campaign=x&a=&b=2#frag";
    let once = normalize_url(raw);
    assert_eq!(once, "https://example.com/a/b?b=2&z=1");
    assert_eq!(normalize_url(&once), once);
    assert_eq!(normalize_url("not a url"), "not a url");
}

#[test]
fn weights_from_config_file_change_scores() {
    let mut f = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(f, "[scoring]\nhigh_confidence_bonus = 0.0\nlow_confidence_penalty = 0.0").unwrap();
    let cfg = load_config_from(f.path()).unwrap();

    let item = || reddit("a", "https://r/a", 10, 2, 0.8, 30);
    let default = score_items_at(vec![item()], 365, &ScoringWeights::default(), today());
    let custom = score_items_at(vec![item()], 365, &cfg.scoring, today());
    assert_eq!(default[0].score(), custom[0].score() + 5);
}
