// src/dedupe.rs
//! Near-duplicate removal across findings.
//!
//! Two items match when their normalized URLs are equal, or when the Jaccard
//! similarity of their display-text character 3-grams reaches the threshold.
//! For each matching pair the higher-scored item survives; on equal scores the
//! earlier one does. Items are only ever removed, never merged.

use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use url::{form_urlencoded, Url};

use crate::schema::{ResearchItem, SourceKind};

/// Default Jaccard threshold for text similarity.
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Query parameters that only carry tracking data. Compared case-insensitively.
pub const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "ref",
    "source",
    "fbclid",
    "gclid",
    "cid",
    "mc_cid",
    "mc_eid",
    "_ga",
    "_gl",
    "hsCtaTracking",
    "mkt_tok",
    "trk",
    "trkCampaign",
];

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.iter().any(|p| p.eq_ignore_ascii_case(key))
}

/// Canonical form of a URL for equality checks.
///
/// Drops tracking and blank-valued query params, sorts the rest, lowercases the
/// host, strips trailing slashes (root stays `/`) and drops the fragment.
/// Unparseable input falls back to a lowercase copy. Never fails; applying it
/// twice yields the same string.
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    let parsed = match Url::parse(raw) {
        Ok(u) if !u.cannot_be_a_base() && u.host_str().is_some() => u,
        _ => return raw.to_lowercase(),
    };

    let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
    let authority = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    };

    let path = parsed.path().trim_end_matches('/');
    let path = if path.is_empty() { "/" } else { path };

    let mut params: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, v)| !v.is_empty() && !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort();

    let mut out = format!("{}://{}{}", parsed.scheme(), authority, path);
    if !params.is_empty() {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        out.push('?');
        out.push_str(&query);
    }
    out
}

static RE_NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Lowercase, punctuation to spaces, collapse whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    let lower = s.to_lowercase();
    let spaced = RE_NON_WORD.replace_all(&lower, " ");
    RE_WS.replace_all(&spaced, " ").trim().to_string()
}

/// Character n-grams of the normalized text. Text shorter than `n` yields a
/// single gram of itself; empty text yields none.
pub fn get_ngrams(text: &str, n: usize) -> HashSet<String> {
    let norm = normalize_text(text);
    let chars: Vec<char> = norm.chars().collect();
    if chars.is_empty() {
        return HashSet::new();
    }
    if n == 0 || chars.len() < n {
        return HashSet::from([norm]);
    }
    chars.windows(n).map(|w| w.iter().collect()).collect()
}

/// |A ∩ B| / |A ∪ B|; 0 when either side is empty.
pub fn jaccard_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}

pub fn items_match_by_url(a: &ResearchItem, b: &ResearchItem) -> bool {
    let ua = normalize_url(a.url());
    let ub = normalize_url(b.url());
    !ua.is_empty() && ua == ub
}

/// Text match on 3-gram Jaccard. Empty text never matches, whatever the threshold.
pub fn items_similar_by_text(a: &ResearchItem, b: &ResearchItem, threshold: f64) -> bool {
    let ga = get_ngrams(a.title_or_text(), 3);
    let gb = get_ngrams(b.title_or_text(), 3);
    grams_similar(&ga, &gb, threshold)
}

fn grams_similar(a: &HashSet<String>, b: &HashSet<String>, threshold: f64) -> bool {
    !a.is_empty() && !b.is_empty() && jaccard_similarity(a, b) >= threshold
}

/// All `(i, j)` with `i < j` that look like the same content.
pub fn find_duplicate_pairs(items: &[ResearchItem], threshold: f64) -> Vec<(usize, usize)> {
    let urls: Vec<String> = items.iter().map(|it| normalize_url(it.url())).collect();
    let grams: Vec<HashSet<String>> = items
        .iter()
        .map(|it| get_ngrams(it.title_or_text(), 3))
        .collect();

    let mut pairs = Vec::new();
    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            if !urls[i].is_empty() && urls[i] == urls[j] {
                pairs.push((i, j));
                continue;
            }
            if grams_similar(&grams[i], &grams[j], threshold) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Remove near-duplicates, keeping the higher-scored item of each pair.
/// Surviving items keep their original relative order.
pub fn dedupe_items(items: Vec<ResearchItem>, threshold: f64) -> Vec<ResearchItem> {
    if items.len() <= 1 {
        return items;
    }

    let mut removed = vec![false; items.len()];
    for (i, j) in find_duplicate_pairs(&items, threshold) {
        if items[i].score() >= items[j].score() {
            removed[j] = true;
        } else {
            removed[i] = true;
        }
    }

    let before = items.len();
    let kept: Vec<ResearchItem> = items
        .into_iter()
        .zip(removed)
        .filter_map(|(it, gone)| (!gone).then_some(it))
        .collect();

    let dropped = before - kept.len();
    if dropped > 0 {
        counter!("research_dedup_removed_total").increment(dropped as u64);
        tracing::debug!(target: "dedupe", before, after = kept.len(), "removed near-duplicates");
    }
    kept
}

/// Group by source category and dedupe within each group.
pub fn dedupe_by_source(
    items: Vec<ResearchItem>,
    threshold: f64,
) -> BTreeMap<SourceKind, Vec<ResearchItem>> {
    let mut groups: BTreeMap<SourceKind, Vec<ResearchItem>> = BTreeMap::new();
    for it in items {
        groups.entry(it.kind()).or_default().push(it);
    }
    groups
        .into_iter()
        .map(|(kind, group)| (kind, dedupe_items(group, threshold)))
        .collect()
}

/// Dedupe the combined list, so the same story on two sources appears once.
pub fn dedupe_across_sources(items: Vec<ResearchItem>, threshold: f64) -> Vec<ResearchItem> {
    dedupe_items(items, threshold)
}
