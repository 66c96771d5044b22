// src/score/composite.rs
//! Composite score: relevance + recency + normalized engagement, weighted by
//! source tier, adjusted for date confidence, bounded to 0–100.
//!
//! Tiers:
//! - Primary (Reddit, Twitter): engagement-native; -10 when engagement is unknown.
//! - Secondary (HN, Stack Overflow): same formula plus a flat tier-2 discount.
//! - Generic: data-dependent. With points/votes it is treated like tier 2;
//!   without, engagement is dropped and a larger no-engagement penalty applies.

use chrono::NaiveDate;
use metrics::counter;
use std::collections::BTreeMap;

use super::engagement::{engagement_raw, normalize_to_100};
use super::weights::ScoringWeights;
use crate::dates::{recency_score_at, today_utc};
use crate::schema::{ResearchItem, SourceKind, SubScores};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    Primary,
    Secondary,
    Generic,
}

impl Tier {
    pub fn of(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Reddit | SourceKind::Twitter => Tier::Primary,
            SourceKind::HackerNews | SourceKind::StackOverflow => Tier::Secondary,
            SourceKind::Generic => Tier::Generic,
        }
    }
}

/// Clamp an externally supplied relevance into [0, 1]; NaN becomes 0.
pub fn clamp_relevance(relevance: f64) -> f64 {
    if relevance.is_nan() {
        0.0
    } else {
        relevance.clamp(0.0, 1.0)
    }
}

/// Unbounded overall score before the date-confidence adjustment.
fn tier_score(
    tier: Tier,
    subs: &SubScores,
    engagement_known: bool,
    w: &ScoringWeights,
) -> f64 {
    let rel = f64::from(subs.relevance);
    let rec = f64::from(subs.recency);
    let eng = f64::from(subs.engagement);
    let with_engagement =
        w.weight_relevance * rel + w.weight_recency * rec + w.weight_engagement * eng;

    match tier {
        Tier::Primary | Tier::Secondary => {
            let mut overall = with_engagement;
            if !engagement_known {
                overall -= w.unknown_engagement_penalty;
            }
            if tier == Tier::Secondary {
                overall -= w.tier2_penalty;
            }
            overall
        }
        Tier::Generic if engagement_known => with_engagement - w.tier2_penalty,
        Tier::Generic => {
            w.no_engagement_weight_relevance * rel + w.no_engagement_weight_recency * rec
                - w.no_engagement_penalty
        }
    }
}

/// Score a batch against today's UTC date.
pub fn score_items(
    items: Vec<ResearchItem>,
    max_days: u32,
    weights: &ScoringWeights,
) -> Vec<ResearchItem> {
    score_items_at(items, max_days, weights, today_utc())
}

/// Fill `subs` and `score` for every item and return the scored batch in the
/// same order.
///
/// Engagement is normalized within each source category of the batch, so a
/// batch may mix categories without one family's counters skewing another's.
pub fn score_items_at(
    mut items: Vec<ResearchItem>,
    max_days: u32,
    weights: &ScoringWeights,
    today: NaiveDate,
) -> Vec<ResearchItem> {
    if items.is_empty() {
        return items;
    }

    let raw: Vec<Option<f64>> = items
        .iter()
        .map(|it| engagement_raw(it.kind(), it.engagement()))
        .collect();

    let mut by_kind: BTreeMap<SourceKind, Vec<usize>> = BTreeMap::new();
    for (idx, it) in items.iter().enumerate() {
        by_kind.entry(it.kind()).or_default().push(idx);
    }

    let mut normalized: Vec<Option<f64>> = vec![None; items.len()];
    for idxs in by_kind.values() {
        let batch: Vec<Option<f64>> = idxs.iter().map(|&i| raw[i]).collect();
        for (&i, v) in idxs.iter().zip(normalize_to_100(&batch)) {
            normalized[i] = v;
        }
    }

    for (idx, item) in items.iter_mut().enumerate() {
        let tier = Tier::of(item.kind());
        let meta = item.meta_mut();

        let relevance = clamp_relevance(meta.relevance);
        if relevance != meta.relevance {
            tracing::warn!(
                target: "score",
                id = %meta.id,
                relevance = meta.relevance,
                "relevance outside [0,1]; clamped"
            );
            meta.relevance = relevance;
        }

        let engagement_known = normalized[idx].is_some();
        let subs = SubScores {
            relevance: (relevance * 100.0).round() as u32,
            recency: recency_score_at(meta.date.as_deref(), max_days, today),
            // generic items without engagement are scored on relevance and recency only
            engagement: match normalized[idx] {
                Some(v) => v as u32,
                None if tier == Tier::Generic => 0,
                None => weights.default_engagement,
            },
        };

        let overall = tier_score(tier, &subs, engagement_known, weights)
            + weights.date_adjustment(meta.date_confidence);

        meta.subs = subs;
        meta.score = overall.clamp(0.0, 100.0) as u32;
    }

    counter!("research_items_scored_total").increment(items.len() as u64);
    tracing::debug!(
        target: "score",
        items = items.len(),
        categories = by_kind.len(),
        max_days,
        "scored batch"
    );

    items
}
