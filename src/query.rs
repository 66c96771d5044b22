// src/query.rs
//! Query classification and subject extraction.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dates::{DEFAULT_MAX_DAYS, NEWS_MAX_DAYS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    Recommendations,
    News,
    HowTo,
    Comparison,
    General,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Recommendations => "RECOMMENDATIONS",
            QueryType::News => "NEWS",
            QueryType::HowTo => "HOW_TO",
            QueryType::Comparison => "COMPARISON",
            QueryType::General => "GENERAL",
        }
    }

    /// Recency window in days for scoring results of this query type.
    pub fn max_days(&self) -> u32 {
        match self {
            QueryType::News => NEWS_MAX_DAYS,
            _ => DEFAULT_MAX_DAYS,
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

// Checked in order; first group with a hit wins.
static QUERY_PATTERNS: Lazy<Vec<(QueryType, Vec<Regex>)>> = Lazy::new(|| {
    vec![
        (
            QueryType::Recommendations,
            compile(&[
                r"\bbest\b",
                r"\btop\b",
                r"\brecommend",
                r"\bwhich\s+\w+\s+should",
                r"\bwhat\s+.*\s+good\s+for",
                r"\bfavorite\b",
                r"\bpopular\b",
            ]),
        ),
        (
            QueryType::News,
            compile(&[
                r"\bwhat'?s\s+happening",
                r"\blatest\b",
                r"\bnews\b",
                r"\btoday\b",
                r"\bthis\s+week\b",
                r"\brecent\b",
                r"\bannounce",
                r"\brelease\b",
            ]),
        ),
        (
            QueryType::HowTo,
            compile(&[
                r"\bhow\s+to\b",
                r"\btutorial\b",
                r"\bguide\b",
                r"\blearn\b",
                r"\bimplement\b",
                r"\bsetup\b",
                r"\binstall\b",
                r"\bconfigure\b",
            ]),
        ),
        (
            QueryType::Comparison,
            compile(&[
                r"\bvs\.?\b",
                r"\bcompare\b",
                r"\bdifference\s+between\b",
                r"\bwhich\s+is\s+better\b",
                r"\bpros\s+and\s+cons\b",
            ]),
        ),
    ]
});

static NOISE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\bbest\b",
        r"\btop\b",
        r"\blatest\b",
        r"\bhow\s+to\b",
        r"\bwhat\s+is\b",
        r"\bwhat\s+are\b",
        r"\btutorial\b",
        r"\bguide\b",
        r"\bfor\s+beginners?\b",
        r"\bin\s+\d{4}\b",
    ])
});

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub fn detect_query_type(query: &str) -> QueryType {
    let q = query.to_lowercase();
    QUERY_PATTERNS
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(&q)))
        .map(|(ty, _)| *ty)
        .unwrap_or(QueryType::General)
}

/// Lowercased query with noise words removed; the original query when nothing
/// is left.
pub fn extract_core_subject(query: &str) -> String {
    let mut subject = query.to_lowercase();
    for re in NOISE_PATTERNS.iter() {
        subject = re.replace_all(&subject, "").into_owned();
    }
    let subject = RE_WS.replace_all(&subject, " ").trim().to_string();
    if subject.is_empty() {
        query.to_string()
    } else {
        subject
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_types_in_priority_order() {
        assert_eq!(detect_query_type("best Python web frameworks"), QueryType::Recommendations);
        assert_eq!(detect_query_type("kubernetes news"), QueryType::News);
        assert_eq!(detect_query_type("How to configure nginx"), QueryType::HowTo);
        assert_eq!(detect_query_type("React vs Vue"), QueryType::Comparison);
        assert_eq!(detect_query_type("rust borrow checker"), QueryType::General);
        // recommendations beat news
        assert_eq!(detect_query_type("best latest laptops"), QueryType::Recommendations);
    }

    #[test]
    fn news_uses_short_window() {
        assert_eq!(QueryType::News.max_days(), 30);
        assert_eq!(QueryType::HowTo.max_days(), 365);
    }

    #[test]
    fn serializes_screaming_snake() {
        assert_eq!(serde_json::to_string(&QueryType::HowTo).unwrap(), "\"HOW_TO\"");
        assert_eq!(QueryType::Comparison.to_string(), "COMPARISON");
    }

    #[test]
    fn core_subject_strips_noise() {
        assert_eq!(extract_core_subject("Best Rust web frameworks in 2025"), "rust web frameworks");
        assert_eq!(extract_core_subject("how to learn Go for beginners"), "learn go");
        assert_eq!(extract_core_subject("Best"), "Best");
    }
}
