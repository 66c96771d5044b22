// src/score/sort.rs
//! Total order over a combined, multi-source result list.

use chrono::NaiveDate;
use std::cmp::Ordering;

use crate::schema::ResearchItem;

fn sort_date(item: &ResearchItem) -> Option<NaiveDate> {
    item.date()
        .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
}

/// Ranking comparator: score desc, date desc (missing or invalid dates sort as
/// oldest), source priority, then title.
pub fn compare_items(a: &ResearchItem, b: &ResearchItem) -> Ordering {
    b.score()
        .cmp(&a.score())
        // None < Some(_), so reversing puts undated items last
        .then_with(|| sort_date(b).cmp(&sort_date(a)))
        .then_with(|| a.kind().priority().cmp(&b.kind().priority()))
        .then_with(|| a.title_or_text().cmp(b.title_or_text()))
}

/// Stable sort of the combined list.
pub fn sort_items(mut items: Vec<ResearchItem>) -> Vec<ResearchItem> {
    items.sort_by(compare_items);
    items
}

/// Concatenate per-category lists and sort the result.
pub fn sort_all_items<I>(lists: I) -> Vec<ResearchItem>
where
    I: IntoIterator<Item = Vec<ResearchItem>>,
{
    sort_items(lists.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{GenericItem, HackerNewsItem, ItemMeta, RedditItem};

    fn reddit(title: &str, score: u32, date: Option<&str>) -> ResearchItem {
        RedditItem {
            title: title.into(),
            subreddit: "rust".into(),
            top_comments: vec![],
            meta: ItemMeta::new(title, "")
                .date(date.map(String::from), Default::default())
                .score(score),
        }
        .into()
    }

    fn hn(title: &str, score: u32, date: Option<&str>) -> ResearchItem {
        HackerNewsItem {
            title: title.into(),
            hn_url: String::new(),
            author: String::new(),
            meta: ItemMeta::new(title, "")
                .date(date.map(String::from), Default::default())
                .score(score),
        }
        .into()
    }

    fn titles(items: &[ResearchItem]) -> Vec<&str> {
        items.iter().map(|i| i.title_or_text()).collect()
    }

    #[test]
    fn higher_score_first() {
        let out = sort_items(vec![reddit("low", 10, None), reddit("high", 90, None)]);
        assert_eq!(titles(&out), vec!["high", "low"]);
    }

    #[test]
    fn newer_date_breaks_score_ties_and_undated_is_oldest() {
        let out = sort_items(vec![
            reddit("undated", 50, None),
            reddit("bad", 50, Some("yesterday")),
            reddit("old", 50, Some("2020-01-01")),
            reddit("new", 50, Some("2024-05-01")),
        ]);
        assert_eq!(&titles(&out)[..2], &["new", "old"]);
    }

    #[test]
    fn source_priority_then_title() {
        let out = sort_items(vec![
            hn("a", 50, Some("2024-01-01")),
            reddit("z", 50, Some("2024-01-01")),
            reddit("b", 50, Some("2024-01-01")),
        ]);
        assert_eq!(titles(&out), vec!["b", "z", "a"]);
    }

    #[test]
    fn merges_lists() {
        let g: ResearchItem = GenericItem {
            title: "g".into(),
            source_name: "devto".into(),
            snippet: String::new(),
            author: String::new(),
            meta: ItemMeta::new("g", "").score(70),
        }
        .into();
        let out = sort_all_items(vec![vec![reddit("r", 40, None)], vec![], vec![g]]);
        assert_eq!(titles(&out), vec!["g", "r"]);
        assert!(sort_all_items(Vec::<Vec<ResearchItem>>::new()).is_empty());
    }
}
