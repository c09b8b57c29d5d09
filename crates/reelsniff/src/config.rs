// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! Detection configuration passed explicitly from the orchestrator down to
//! the detector.

use crate::error::SniffError;
use crate::sources::{default_sources, Source};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Script run in every frame to start any `<video>` element.
pub const PLAY_SCRIPT: &str = "const v = document.querySelector('video'); if(v) v.play();";

/// Elements that commonly start playback when clicked.
pub const PLAY_SELECTOR: &str = "button, .play, video, .jw-display-icon-display";

/// Tunables for one discovery run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SniffConfig {
    /// Wait-for-commit budget for the initial navigation.
    pub navigation_timeout_ms: u64,
    /// Poll loop iteration cap per source.
    pub max_iterations: u32,
    /// How long each iteration waits for the network observer.
    pub poll_window_ms: u64,
    /// Per-click budget inside a frame.
    pub click_timeout_ms: u64,
    /// Shared budget per tick for page reads and interaction. A page stuck
    /// behind a JavaScript dialog stops answering; this keeps ticks short.
    pub read_timeout_ms: u64,
    /// Substrings that mark a direct media URL.
    pub media_markers: Vec<String>,
    /// Substrings that disqualify a URL even when a media marker matches.
    pub excluded_markers: Vec<String>,
    /// Marker that identifies HLS playlist content.
    pub playlist_marker: String,
    /// Selector clicked in each frame during interaction.
    pub play_selector: String,
    /// Script evaluated in each frame during interaction.
    pub play_script: String,
    /// Ordered source registry.
    pub sources: Vec<Source>,
}

impl Default for SniffConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: 20_000,
            max_iterations: 30,
            poll_window_ms: 500,
            click_timeout_ms: 100,
            read_timeout_ms: 400,
            media_markers: vec![".m3u8".into(), ".mp4".into()],
            excluded_markers: vec!["favicon".into(), ".png".into()],
            playlist_marker: "#EXTM3U".into(),
            play_selector: PLAY_SELECTOR.into(),
            play_script: PLAY_SCRIPT.into(),
            sources: default_sources(),
        }
    }
}

impl SniffConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn poll_window(&self) -> Duration {
        Duration::from_millis(self.poll_window_ms)
    }

    pub fn click_timeout(&self) -> Duration {
        Duration::from_millis(self.click_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Upper bound on one attempt's poll loop: every tick spends at most one
    /// read budget on the page and one poll window on the network.
    pub fn attempt_budget(&self) -> Duration {
        (self.poll_window() + self.read_timeout()) * self.max_iterations
    }

    /// Reject settings that would make discovery meaningless.
    pub fn validate(&self) -> Result<(), SniffError> {
        if self.max_iterations == 0 {
            return Err(SniffError::Config("max_iterations must be at least 1".into()));
        }
        if self.read_timeout_ms == 0 {
            return Err(SniffError::Config("read_timeout_ms must be at least 1".into()));
        }
        if self.media_markers.iter().all(|m| m.is_empty()) {
            return Err(SniffError::Config("media_markers must not be empty".into()));
        }
        if let Some(s) = self.sources.iter().find(|s| s.url.is_empty()) {
            return Err(SniffError::Config(format!("source '{}' has no url", s.name)));
        }
        Ok(())
    }
}
