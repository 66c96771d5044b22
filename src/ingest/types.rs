// src/ingest/types.rs
use anyhow::Result;
use serde::Serialize;

use crate::schema::{ResearchItem, SourceStatus};

/// One findings source (HN, Stack Overflow, arXiv, ...).
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    /// Fetch up to `limit` items for `query`.
    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<ResearchItem>>;
    /// Registry key, e.g. "hackernews".
    fn name(&self) -> &'static str;
}

/// Outcome of one provider call inside the fetch pool.
#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub source_name: String,
    pub items: Vec<ResearchItem>,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl FetchResult {
    pub fn ok(source_name: impl Into<String>, items: Vec<ResearchItem>, duration_ms: u64) -> Self {
        Self {
            source_name: source_name.into(),
            items,
            success: true,
            error: None,
            duration_ms,
        }
    }

    pub fn failed(source_name: impl Into<String>, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            source_name: source_name.into(),
            items: Vec::new(),
            success: false,
            error: Some(error.into()),
            duration_ms,
        }
    }

    pub fn to_status(&self) -> SourceStatus {
        SourceStatus {
            source_name: self.source_name.clone(),
            success: self.success,
            item_count: self.items.len(),
            error: self.error.clone(),
            duration_ms: Some(self.duration_ms),
        }
    }
}
