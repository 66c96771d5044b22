// src/score/mod.rs
//! Scoring core: per-source engagement, composite tiered score, ranking.

pub mod composite;
pub mod engagement;
pub mod sort;
pub mod weights;

pub use composite::{score_items, score_items_at, Tier};
pub use sort::{compare_items, sort_all_items, sort_items};
pub use weights::ScoringWeights;
