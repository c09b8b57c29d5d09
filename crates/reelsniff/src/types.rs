// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core data types shared by the detector, the attempt controller and callers.

use serde::{Deserialize, Serialize};

/// A direct media resource plus the HTTP context needed to fetch it.
///
/// `referer`, `user_agent` and `cookie` are best-effort. Any of them may be
/// empty, in which case the player substitutes its configured default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Playlist manifest or progressive file URL.
    pub url: String,
    /// Referer header value.
    pub referer: String,
    /// User-Agent header value.
    pub user_agent: String,
    /// Cookie header value.
    pub cookie: String,
}

impl StreamDescriptor {
    /// Descriptor with only a URL and referer (no captured headers).
    pub fn bare(url: impl Into<String>, referer: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            referer: referer.into(),
            user_agent: String::new(),
            cookie: String::new(),
        }
    }

    /// `true` when the URL looks like an HLS playlist rather than a progressive file.
    pub fn is_playlist(&self) -> bool {
        self.url.contains(".m3u8")
    }
}

/// Result of one attempt against one source: a stream, or nothing.
///
/// "The source didn't work" is never an error.
pub type AttemptOutcome = Option<StreamDescriptor>;
