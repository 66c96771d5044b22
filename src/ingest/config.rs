// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dedupe::DEFAULT_THRESHOLD;
use crate::ingest::http::DEFAULT_USER_AGENT;
use crate::score::ScoringWeights;

pub const ENV_PATH: &str = "RESEARCH_CONFIG_PATH";
pub const ENV_BRAVE_API_KEY: &str = "BRAVE_API_KEY";

/// Full runtime configuration. Every section and key is optional.
///
/// ```toml
/// [scoring]
/// tier2_penalty = 5.0
///
/// [dedupe]
/// threshold = 0.7
///
/// [fetch]
/// max_workers = 5
/// user_agent = "Scout Research Agent/1.0"
///
/// [fetch.sources]
/// quick = ["hackernews"]
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    pub scoring: ScoringWeights,
    pub dedupe: DedupeConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupeConfig {
    pub threshold: f64,
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub max_workers: usize,
    pub user_agent: String,
    /// Per-depth source overrides keyed by depth name ("quick", "default", "deep").
    pub sources: BTreeMap<String, Vec<String>>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_workers: 5,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            sources: BTreeMap::new(),
        }
    }
}

impl ResearchConfig {
    /// Clamp values into their valid ranges.
    pub fn sanitized(mut self) -> Self {
        self.scoring = self.scoring.sanitized();
        let t = self.dedupe.threshold;
        self.dedupe.threshold = if t.is_nan() {
            DEFAULT_THRESHOLD
        } else {
            t.clamp(0.0, 1.0)
        };
        self.fetch.max_workers = self.fetch.max_workers.max(1);
        if self.fetch.user_agent.trim().is_empty() {
            self.fetch.user_agent = DEFAULT_USER_AGENT.to_string();
        }
        for list in self.fetch.sources.values_mut() {
            *list = clean_list(std::mem::take(list));
        }
        self
    }
}

/// Brave grounding key from the environment, if set and non-blank.
pub fn brave_api_key() -> Option<String> {
    std::env::var(ENV_BRAVE_API_KEY)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<ResearchConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading research config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing research config {}", path.display()))
}

/// Load config using env var + fallbacks:
/// 1) $RESEARCH_CONFIG_PATH
/// 2) config/research.toml
/// 3) config/research.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<ResearchConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("{ENV_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/research.toml");
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from("config/research.json");
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Ok(ResearchConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<ResearchConfig> {
    let try_json_first = hint_ext == "json" || s.trim_start().starts_with('{');
    let parsed = if try_json_first {
        parse_json(s).or_else(|_| parse_toml(s))
    } else {
        parse_toml(s).or_else(|_| parse_json(s))
    };
    parsed
        .map(ResearchConfig::sanitized)
        .map_err(|_| anyhow!("unsupported research config format"))
}

fn parse_toml(s: &str) -> Result<ResearchConfig> {
    Ok(toml::from_str(s)?)
}

fn parse_json(s: &str) -> Result<ResearchConfig> {
    Ok(serde_json::from_str(s)?)
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim().to_ascii_lowercase();
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}
