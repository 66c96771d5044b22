// src/score/weights.rs
//! Scoring weights and penalties.
//!
//! TOML shape (every key optional, missing keys keep the defaults):
//! ```toml
//! [scoring]
//! weight_relevance = 0.45
//! weight_recency = 0.25
//! weight_engagement = 0.30
//! no_engagement_weight_relevance = 0.55
//! no_engagement_weight_recency = 0.45
//! no_engagement_penalty = 15.0
//! tier2_penalty = 5.0
//! unknown_engagement_penalty = 10.0
//! default_engagement = 35
//! high_confidence_bonus = 5.0
//! med_confidence_penalty = 0.0
//! low_confidence_penalty = 15.0
//! ```

use serde::{Deserialize, Serialize};

use crate::schema::DateConfidence;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Formula used whenever engagement takes part (tier 1, tier 2, generic with data).
    pub weight_relevance: f64,
    pub weight_recency: f64,
    pub weight_engagement: f64,

    /// Reweighted formula for generic items without any engagement signal.
    pub no_engagement_weight_relevance: f64,
    pub no_engagement_weight_recency: f64,
    pub no_engagement_penalty: f64,

    /// Flat discount for curated-but-secondary engagement (HN, Stack Overflow,
    /// generic items that do carry points/votes).
    pub tier2_penalty: f64,
    pub unknown_engagement_penalty: f64,
    /// Engagement sub-score used when an item's engagement is unknown.
    pub default_engagement: u32,

    pub high_confidence_bonus: f64,
    pub med_confidence_penalty: f64,
    pub low_confidence_penalty: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            weight_relevance: 0.45,
            weight_recency: 0.25,
            weight_engagement: 0.30,
            no_engagement_weight_relevance: 0.55,
            no_engagement_weight_recency: 0.45,
            no_engagement_penalty: 15.0,
            tier2_penalty: 5.0,
            unknown_engagement_penalty: 10.0,
            default_engagement: 35,
            high_confidence_bonus: 5.0,
            med_confidence_penalty: 0.0,
            low_confidence_penalty: 15.0,
        }
    }
}

impl ScoringWeights {
    /// Signed score adjustment for a date-confidence level.
    pub fn date_adjustment(&self, confidence: DateConfidence) -> f64 {
        match confidence {
            DateConfidence::High => self.high_confidence_bonus,
            DateConfidence::Med => -self.med_confidence_penalty,
            DateConfidence::Low => -self.low_confidence_penalty,
        }
    }

    /// Clamp the default engagement into the 0–100 sub-score range.
    pub(crate) fn sanitized(mut self) -> Self {
        self.default_engagement = self.default_engagement.min(100);
        self
    }
}
