// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod dates;
pub mod dedupe;
pub mod grounding;
pub mod ingest;
pub mod query;
pub mod render;
pub mod research;
pub mod schema;
pub mod score;

// ---- Re-exports for stable public API ----
pub use crate::ingest::config::ResearchConfig;
pub use crate::ingest::Depth;
pub use crate::render::{render_report, OutputFormat};
pub use crate::research::run_research;
pub use crate::schema::{ResearchItem, ResearchReport};
