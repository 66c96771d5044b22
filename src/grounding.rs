// src/grounding.rs
//! Brave AI grounding: one cited answer per query, attached to the report.
//!
//! The endpoint streams OpenAI-style chat deltas as SSE `data:` lines; a
//! non-streaming JSON body is accepted too. Citations and usage arrive inline
//! as `<citation>{json}</citation>` and `<usage>{json}</usage>` tags.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

use crate::ingest::Depth;
use crate::schema::{GroundedAnswer, GroundedCitation, SourceStatus};

pub const SOURCE_NAME: &str = "brave_grounding";
pub const DEFAULT_ENDPOINT: &str = "https://api.search.brave.com/res/v1/chat/completions";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const MISSING_KEY_ERROR: &str = "missing_brave_api_key";

static RE_CITATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<citation>(.*?)</citation>").unwrap());
static RE_USAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<usage>(.*?)</usage>").unwrap());
static RE_ENUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?enum_item>").unwrap());

/// Request body; deep research is only requested at `deep` depth.
pub fn build_payload(query: &str, depth: Depth) -> Value {
    let mut payload = json!({
        "model": "brave",
        "stream": true,
        "messages": [{"role": "user", "content": query}],
        "enable_citations": true,
    });
    if depth == Depth::Deep {
        payload["enable_research"] = Value::Bool(true);
    }
    payload
}

fn first_choice_content<'a>(payload: &'a Value, field: &str) -> Option<&'a str> {
    payload
        .get("choices")?
        .get(0)?
        .get(field)?
        .get("content")?
        .as_str()
}

/// Concatenate the answer text from an SSE stream (or a plain JSON body).
/// Malformed lines are skipped; `[DONE]` ends the stream.
pub fn collect_stream_text(body: &str) -> String {
    let mut out = String::new();
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (data, field) = match line.strip_prefix("data:") {
            Some(rest) => (rest.trim(), "delta"),
            None => (line, "message"),
        };
        if data == "[DONE]" {
            break;
        }
        let Ok(payload) = serde_json::from_str::<Value>(data) else {
            continue;
        };
        if let Some(content) = first_choice_content(&payload, field) {
            out.push_str(content);
        }
    }
    out
}

/// Split grounded text into clean answer text, citations and usage.
pub fn parse_grounding_text(text: &str) -> (String, Vec<GroundedCitation>, Option<Value>) {
    let citations = RE_CITATION
        .captures_iter(text)
        .filter_map(|c| serde_json::from_str::<Value>(&c[1]).ok())
        .map(|p| GroundedCitation {
            number: p.get("number").and_then(Value::as_u64).map(|n| n as u32),
            url: p.get("url").and_then(Value::as_str).unwrap_or_default().to_string(),
            snippet: p
                .get("snippet")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            start_index: p.get("start_index").and_then(Value::as_u64),
            end_index: p.get("end_index").and_then(Value::as_u64),
            favicon: p.get("favicon").and_then(Value::as_str).map(String::from),
        })
        .collect();

    let usage = RE_USAGE
        .captures(text)
        .and_then(|c| serde_json::from_str::<Value>(&c[1]).ok());

    let cleaned = RE_CITATION.replace_all(text, "");
    let cleaned = RE_USAGE.replace_all(&cleaned, "");
    let cleaned = RE_ENUM.replace_all(&cleaned, "");
    (cleaned.trim().to_string(), citations, usage)
}

pub struct GroundingClient {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GroundingClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()),
            client,
        }
    }

    /// Brave endpoint with the key from `BRAVE_API_KEY`.
    pub fn from_env(client: reqwest::Client) -> Self {
        Self::new(DEFAULT_ENDPOINT, crate::ingest::config::brave_api_key(), client)
    }

    async fn request(&self, api_key: &str, query: &str, depth: Depth) -> Result<String> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header("X-Subscription-Token", api_key)
            .timeout(DEFAULT_TIMEOUT)
            .json(&build_payload(query, depth))
            .send()
            .await
            .context("brave grounding post()")?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown")
            );
        }
        resp.text().await.context("brave grounding .text()")
    }

    /// Never fails: errors become a failed status next to a `None` answer.
    pub async fn fetch(&self, query: &str, depth: Depth) -> (Option<GroundedAnswer>, SourceStatus) {
        let Some(api_key) = self.api_key.as_deref() else {
            return (
                None,
                SourceStatus {
                    source_name: SOURCE_NAME.to_string(),
                    success: false,
                    item_count: 0,
                    error: Some(MISSING_KEY_ERROR.to_string()),
                    duration_ms: None,
                },
            );
        };

        let t0 = Instant::now();
        let outcome = self.request(api_key, query, depth).await;
        let ms = t0.elapsed().as_millis() as u64;

        match outcome {
            Ok(body) => {
                let (text, citations, usage) = parse_grounding_text(&collect_stream_text(&body));
                tracing::info!(target: "research", citations = citations.len(), ms, "grounded answer");
                let status = SourceStatus {
                    source_name: SOURCE_NAME.to_string(),
                    success: true,
                    item_count: citations.len(),
                    error: None,
                    duration_ms: Some(ms),
                };
                (Some(GroundedAnswer { text, citations, usage }), status)
            }
            Err(e) => {
                tracing::warn!(target: "research", error = ?e, "grounding failed");
                (
                    None,
                    SourceStatus {
                        source_name: SOURCE_NAME.to_string(),
                        success: false,
                        item_count: 0,
                        error: Some(format!("{e:#}")),
                        duration_ms: Some(ms),
                    },
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_citations_usage_and_strips_tags() {
        let text = concat!(
            "Rust is memory safe.",
            r#"<citation>{"number": 1, "url": "https://rust-lang.org", "snippet": "safe", "start_index": 0, "end_index": 20}</citation>"#,
            "<enum_item>Fast</enum_item>",
            "<citation>not json</citation>",
            r#"<usage>{"input_tokens": 12}</usage>"#,
        );
        let (clean, cites, usage) = parse_grounding_text(text);
        assert_eq!(clean, "Rust is memory safe.Fast");
        assert_eq!(cites.len(), 1);
        assert_eq!(cites[0].number, Some(1));
        assert_eq!(cites[0].url, "https://rust-lang.org");
        assert_eq!(cites[0].end_index, Some(20));
        assert_eq!(usage.unwrap()["input_tokens"], 12);
    }

    #[test]
    fn collects_sse_deltas_until_done() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"Hello \"}}]}\n\n\
                    data: not-json\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"world\"}}]}\n\
                    data: [DONE]\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n";
        assert_eq!(collect_stream_text(body), "Hello world");
    }

    #[test]
    fn accepts_plain_json_body() {
        let body = r#"{"choices":[{"message":{"content":"whole answer"}}]}"#;
        assert_eq!(collect_stream_text(body), "whole answer");
    }

    #[test]
    fn payload_enables_research_only_when_deep() {
        assert!(build_payload("q", Depth::Default).get("enable_research").is_none());
        assert_eq!(build_payload("q", Depth::Deep)["enable_research"], true);
    }

    #[tokio::test]
    async fn missing_key_reports_failed_status() {
        let g = GroundingClient::new(DEFAULT_ENDPOINT, Some("  ".into()), reqwest::Client::new());
        let (answer, status) = g.fetch("q", Depth::Quick).await;
        assert!(answer.is_none());
        assert!(!status.success);
        assert_eq!(status.error.as_deref(), Some(MISSING_KEY_ERROR));
    }
}
