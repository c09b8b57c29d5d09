// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration loading and resolution.

use crate::lookup::LookupSettings;
use crate::player::PlayerSettings;
use crate::renderer::BrowserSettings;
use anyhow::{Context, Result};
use reelsniff::SniffConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything the `reelsniff` binary can be configured with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub sniff: SniffConfig,
    pub browser: BrowserSettings,
    pub player: PlayerSettings,
    pub lookup: LookupSettings,
}

impl RuntimeConfig {
    /// Read and validate a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("invalid config {}", path.display()))?;
        config.sniff.validate()?;
        Ok(config)
    }

    /// Load from the resolved path, or fall back to built-in defaults.
    pub fn load(explicit: Option<&str>) -> Result<(Self, Option<PathBuf>)> {
        match resolve_config_path(explicit) {
            Some(path) => Ok((Self::from_file(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }
}

/// Resolve the config file path.
///
/// `--config` wins, then `REELSNIFF_CONFIG`, then `~/.reelsniff/config.json`
/// if it exists. `None` means built-in defaults.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }

    if let Ok(env_path) = std::env::var("REELSNIFF_CONFIG") {
        if !env_path.is_empty() {
            return Some(PathBuf::from(env_path));
        }
    }

    let default = default_config_path()?;
    default.exists().then_some(default)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".reelsniff/config.json"))
}
