// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! Browser bootstrap: locating Chromium and the settings it launches with.
//!
//! The discovery engine only sees a `reelsniff::BrowserPage`; the Chromium
//! implementation of it lives in [`chromium`].

pub mod chromium;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Desktop Chrome user agent presented to embed sites.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// How the browser is launched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Persistent profile directory (cookies, local storage, cache).
    pub profile_dir: PathBuf,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: String,
    /// Explicit Chromium binary; discovered when unset.
    pub executable: Option<PathBuf>,
    /// Timeout for CDP requests in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            profile_dir: PathBuf::from("./browser_data"),
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            executable: None,
            request_timeout_ms: 30_000,
        }
    }
}

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. REELSNIFF_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("REELSNIFF_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. System PATH
    for name in ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 3. Common macOS locations
    if cfg!(target_os = "macos") {
        let common = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ];
        for c in common {
            let path = PathBuf::from(c);
            if path.exists() {
                return Some(path);
            }
        }
    }

    None
}
