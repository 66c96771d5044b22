// src/ingest/http.rs
//! Shared HTTP plumbing for the source adapters.

use anyhow::{anyhow, Context, Result};
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Scout Research Agent/1.0";

/// Client with the research user agent and a JSON accept header.
pub fn build_client(user_agent: &str, timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );
    let mut builder = reqwest::Client::builder()
        .user_agent(user_agent)
        .default_headers(headers);
    if let Some(t) = timeout {
        builder = builder.timeout(t);
    }
    builder.build().context("building http client")
}

/// GET `url` and return the body; non-2xx statuses become `HTTP <code>: <reason>` errors.
pub async fn get_text(client: &reqwest::Client, url: &str, provider: &'static str) -> Result<String> {
    let resp = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(target: "ingest", error = ?e, provider, "provider http error");
            return Err(e).with_context(|| format!("{provider} http get()"));
        }
    };

    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("unknown")
        ));
    }
    resp.text()
        .await
        .with_context(|| format!("{provider} http .text()"))
}
