// src/score/engagement.rs
//! Per-source engagement formulas and batch normalization.
//!
//! Each source family folds its own counters into one raw value with a
//! weighted sum of `ln(1 + x)` terms (weights sum to 1.0). A missing counter
//! contributes 0; only the absence of every category-defining counter makes
//! the result unknown (`None`).

use crate::schema::{Engagement, SourceKind};

/// `ln(1 + x)`, treating absent and negative counts as 0.
pub fn log1p_safe(x: Option<i64>) -> f64 {
    match x {
        Some(v) if v > 0 => (v as f64).ln_1p(),
        _ => 0.0,
    }
}

/// `0.55*ln(1+score) + 0.40*ln(1+comments) + 0.05*(upvote_ratio*10)`
pub fn reddit_raw(e: Option<&Engagement>) -> Option<f64> {
    let e = e?;
    if e.score.is_none() && e.num_comments.is_none() {
        return None;
    }
    let ratio = e.upvote_ratio.unwrap_or(0.5) * 10.0;
    Some(0.55 * log1p_safe(e.score) + 0.40 * log1p_safe(e.num_comments) + 0.05 * ratio)
}

/// `0.55*ln(1+likes) + 0.25*ln(1+reposts) + 0.15*ln(1+replies) + 0.05*ln(1+quotes)`
pub fn twitter_raw(e: Option<&Engagement>) -> Option<f64> {
    let e = e?;
    if e.likes.is_none() && e.reposts.is_none() {
        return None;
    }
    Some(
        0.55 * log1p_safe(e.likes)
            + 0.25 * log1p_safe(e.reposts)
            + 0.15 * log1p_safe(e.replies)
            + 0.05 * log1p_safe(e.quotes),
    )
}

/// `0.60*ln(1+points) + 0.40*ln(1+comments)`
pub fn hackernews_raw(e: Option<&Engagement>) -> Option<f64> {
    let e = e?;
    if e.points.is_none() && e.num_comments.is_none() {
        return None;
    }
    Some(0.60 * log1p_safe(e.points) + 0.40 * log1p_safe(e.num_comments))
}

/// `0.40*ln(1+votes) + 0.30*ln(1+answers) + 0.20*ln(1+views/100) + 0.10*(10 if accepted)`
pub fn stackoverflow_raw(e: Option<&Engagement>) -> Option<f64> {
    let e = e?;
    if e.votes.is_none() && e.answer_count.is_none() {
        return None;
    }
    // views are scaled down before the log; integer division floors
    let views = e.view_count.map(|v| v.max(0) / 100);
    let accepted = if e.is_accepted.unwrap_or(false) { 10.0 } else { 0.0 };
    Some(
        0.40 * log1p_safe(e.votes)
            + 0.30 * log1p_safe(e.answer_count)
            + 0.20 * log1p_safe(views)
            + 0.10 * accepted,
    )
}

/// `ln(1+points)`, falling back to `ln(1+votes)`.
pub fn generic_raw(e: Option<&Engagement>) -> Option<f64> {
    let e = e?;
    if e.points.is_some() {
        return Some(log1p_safe(e.points));
    }
    if e.votes.is_some() {
        return Some(log1p_safe(e.votes));
    }
    None
}

/// Dispatch to the formula for `kind`.
pub fn engagement_raw(kind: SourceKind, e: Option<&Engagement>) -> Option<f64> {
    match kind {
        SourceKind::Reddit => reddit_raw(e),
        SourceKind::Twitter => twitter_raw(e),
        SourceKind::HackerNews => hackernews_raw(e),
        SourceKind::StackOverflow => stackoverflow_raw(e),
        SourceKind::Generic => generic_raw(e),
    }
}

/// Min/max rescale the known values to 0–100; unknowns stay `None`.
/// When every known value is equal, each becomes exactly 50.
pub fn normalize_to_100(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let known = values.iter().flatten().copied();
    let (min, max) = known.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        // nothing known
        return values.to_vec();
    }

    let range = max - min;
    values
        .iter()
        .map(|v| {
            v.map(|v| {
                if range == 0.0 {
                    50.0
                } else {
                    (v - min) / range * 100.0
                }
            })
        })
        .collect()
}
