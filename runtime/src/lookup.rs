// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! Title lookup against the IMDb suggestion endpoint.
//!
//! Free text in, ordered `(identifier, label)` candidates out. Any network
//! or decoding failure yields an empty list, which callers treat as
//! "nothing to attempt".

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where and how titles are looked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupSettings {
    pub base_url: String,
    /// How many candidates are offered for selection.
    pub max_results: usize,
    pub timeout_ms: u64,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            base_url: "https://v2.sg.media-imdb.com".to_string(),
            max_results: 5,
            timeout_ms: 10_000,
        }
    }
}

/// One lookup hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleCandidate {
    /// IMDb identifier (`tt...`).
    pub id: String,
    /// `"Title (Year) - Stars"`.
    pub label: String,
}

impl TitleCandidate {
    /// The bare title, without year and cast.
    pub fn title(&self) -> &str {
        display_title(&self.label)
    }
}

#[derive(Debug, Deserialize)]
struct SuggestionResponse {
    #[serde(default)]
    d: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    #[serde(default)]
    id: String,
    l: Option<String>,
    y: Option<serde_json::Value>,
    s: Option<String>,
}

/// Looks titles up over HTTP.
#[derive(Clone)]
pub struct TitleLookup {
    client: reqwest::Client,
    settings: LookupSettings,
}

impl TitleLookup {
    pub fn new(settings: LookupSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .unwrap_or_default();
        Self { client, settings }
    }

    /// Candidates for `query`, best first. Empty on any failure.
    pub async fn search(&self, query: &str) -> Vec<TitleCandidate> {
        match self.try_search(query).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!("title lookup failed: {e:#}");
                Vec::new()
            }
        }
    }

    async fn try_search(&self, query: &str) -> Result<Vec<TitleCandidate>> {
        let Some(url) = suggestion_url(&self.settings.base_url, query)? else {
            return Ok(Vec::new());
        };
        tracing::debug!("looking up {url}");

        let body: SuggestionResponse = self
            .client
            .get(url)
            .send()
            .await
            .context("suggestion request failed")?
            .error_for_status()
            .context("suggestion endpoint returned an error")?
            .json()
            .await
            .context("suggestion response is not valid JSON")?;

        Ok(candidates(body))
    }
}

/// `{base}/suggestion/{first letter}/{query with spaces as underscores}.json`,
/// or `None` for a blank query.
fn suggestion_url(base: &str, query: &str) -> Result<Option<url::Url>> {
    let key = query.trim().replace(' ', "_");
    let Some(first) = key.chars().next() else {
        return Ok(None);
    };
    let mut url = url::Url::parse(base).with_context(|| format!("invalid lookup base url {base}"))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("lookup base url cannot have a path: {base}"))?
        .pop_if_empty()
        .push("suggestion")
        .push(&first.to_lowercase().to_string())
        .push(&format!("{key}.json"));
    Ok(Some(url))
}

fn candidates(body: SuggestionResponse) -> Vec<TitleCandidate> {
    body.d
        .into_iter()
        .filter(|s| s.id.starts_with("tt"))
        .map(|s| {
            let title = s.l.unwrap_or_else(|| "Unknown".to_string());
            let year = match s.y {
                Some(serde_json::Value::Number(n)) => n.to_string(),
                Some(serde_json::Value::String(y)) => y,
                _ => "??".to_string(),
            };
            let stars = s.s.unwrap_or_default();
            TitleCandidate {
                id: s.id,
                label: format!("{title} ({year}) - {stars}"),
            }
        })
        .collect()
}

/// Text before the first `(`, trimmed.
pub fn display_title(label: &str) -> &str {
    label.split('(').next().unwrap_or(label).trim()
}
