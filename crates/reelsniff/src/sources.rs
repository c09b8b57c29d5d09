// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! Source registry: the ordered list of embed endpoints tried per title.

use serde::{Deserialize, Serialize};

/// Placeholder that, when present in a template, is replaced by the identifier.
const ID_PLACEHOLDER: &str = "{id}";

/// One third-party embed endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Display name used in progress output.
    pub name: String,
    /// URL template. The identifier is appended, or substituted for `{id}`.
    pub url: String,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Build the navigable address for `identifier`.
    pub fn address(&self, identifier: &str) -> String {
        if self.url.contains(ID_PLACEHOLDER) {
            self.url.replace(ID_PLACEHOLDER, identifier)
        } else {
            format!("{}{}", self.url, identifier)
        }
    }
}

/// Built-in registry, in priority order.
pub fn default_sources() -> Vec<Source> {
    vec![
        Source::new("VidSrc.net", "https://vidsrc.net/embed/movie/"),
        Source::new("VidSrcMe.ru", "https://vidsrcme.ru/embed/movie/"),
        Source::new("VidSrc.xyz", "https://vidsrc.xyz/embed/movie/"),
        Source::new("VidSrc-Embed", "https://vidsrc-embed.ru/embed/movie/"),
        Source::new("AutoEmbed", "https://autoembed.cc/embed/movie/"),
        Source::new("VidSrc.cc", "https://vidsrc.cc/v2/embed/movie/"),
    ]
}
