// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! Signal detection: is this URL, document or request a direct media resource?
//!
//! Three signals are recognised:
//! - **URL pattern**: the address carries a media marker (`.m3u8`, `.mp4`)
//!   and no excluded-asset marker (`favicon`, `.png`).
//! - **Content**: the rendered document carries the playlist marker
//!   (`#EXTM3U`), meaning the page itself is a manifest.
//! - **Request**: an outbound request passes the URL-pattern rule; its
//!   headers supply referer, user agent and cookie.
//!
//! The exclusion list is a plain substring test, so a real manifest whose
//! URL happens to contain `favicon` or `.png` is rejected as well.

use crate::config::SniffConfig;
use crate::page::ObservedRequest;
use crate::types::StreamDescriptor;

/// Pure classifier built from the marker lists in [`SniffConfig`].
#[derive(Debug, Clone)]
pub struct SignalDetector {
    media_markers: Vec<String>,
    excluded_markers: Vec<String>,
    playlist_marker: String,
}

impl SignalDetector {
    pub fn new(config: &SniffConfig) -> Self {
        Self {
            media_markers: non_empty(&config.media_markers),
            excluded_markers: non_empty(&config.excluded_markers),
            playlist_marker: config.playlist_marker.clone(),
        }
    }

    /// URL-pattern rule.
    pub fn is_media_url(&self, url: &str) -> bool {
        self.media_markers.iter().any(|m| url.contains(m.as_str()))
            && !self.excluded_markers.iter().any(|m| url.contains(m.as_str()))
    }

    /// Whether `content` is (or embeds) a playlist manifest.
    pub fn is_playlist_content(&self, content: &str) -> bool {
        !self.playlist_marker.is_empty() && content.contains(self.playlist_marker.as_str())
    }

    /// URL-pattern signal applied to the page's own address.
    pub fn from_page_url(&self, page_url: &str, source_address: &str) -> Option<StreamDescriptor> {
        self.is_media_url(page_url)
            .then(|| StreamDescriptor::bare(page_url, source_address))
    }

    /// Content signal. The page address is the resource, the source address the referer.
    pub fn from_content(
        &self,
        page_url: &str,
        content: &str,
        source_address: &str,
    ) -> Option<StreamDescriptor> {
        self.is_playlist_content(content)
            .then(|| StreamDescriptor::bare(page_url, source_address))
    }

    /// Request signal. Missing referer falls back to `page_url`; missing
    /// user agent or cookie become empty strings.
    pub fn from_request(&self, request: &ObservedRequest, page_url: &str) -> Option<StreamDescriptor> {
        if !self.is_media_url(&request.url) {
            return None;
        }
        Some(StreamDescriptor {
            url: request.url.clone(),
            referer: request.header("referer").unwrap_or(page_url).to_string(),
            user_agent: request.header("user-agent").unwrap_or_default().to_string(),
            cookie: request.header("cookie").unwrap_or_default().to_string(),
        })
    }
}

impl Default for SignalDetector {
    fn default() -> Self {
        Self::new(&SniffConfig::default())
    }
}

fn non_empty(markers: &[String]) -> Vec<String> {
    markers.iter().filter(|m| !m.is_empty()).cloned().collect()
}
