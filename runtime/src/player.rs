// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! External player hand-off (mpv).

use crate::renderer::DEFAULT_USER_AGENT;
use anyhow::{Context, Result};
use reelsniff::StreamDescriptor;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Player binary and the fallbacks used for missing stream headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Binary name or path, resolved through `PATH`.
    pub binary: String,
    pub default_user_agent: String,
    pub default_referer: String,
    pub fullscreen: bool,
    /// Extra arguments appended verbatim.
    pub extra_args: Vec<String>,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            binary: "mpv".to_string(),
            default_user_agent: DEFAULT_USER_AGENT.to_string(),
            default_referer: "https://vidsrc.net/".to_string(),
            fullscreen: true,
            extra_args: Vec::new(),
        }
    }
}

/// Resolve the player binary, or fail before any discovery work starts.
pub fn ensure_player_installed(settings: &PlayerSettings) -> Result<PathBuf> {
    which::which(&settings.binary)
        .with_context(|| format!("CRITICAL: {} not installed", settings.binary.to_uppercase()))
}

/// Command-line arguments for playing `stream` titled `title`.
pub fn player_args(stream: &StreamDescriptor, title: &str, settings: &PlayerSettings) -> Vec<String> {
    let user_agent = non_empty_or(&stream.user_agent, &settings.default_user_agent);
    let referer = non_empty_or(&stream.referer, &settings.default_referer);

    let mut header_fields = format!("Referer: {referer},User-Agent: {user_agent}");
    if !stream.cookie.is_empty() {
        header_fields.push_str(&format!(",Cookie: {}", stream.cookie));
    }

    let mut args = vec![
        stream.url.clone(),
        format!("--force-media-title={title}"),
        format!("--user-agent={user_agent}"),
        format!("--referrer={referer}"),
        format!("--http-header-fields={header_fields}"),
    ];
    if settings.fullscreen {
        args.push("--fs".to_string());
    }
    args.push("--msg-level=all=no".to_string());
    args.extend(settings.extra_args.iter().cloned());
    args
}

/// Run the player in the foreground until it exits.
///
/// The exit status is logged, not interpreted.
pub async fn play(stream: &StreamDescriptor, title: &str, settings: &PlayerSettings) -> Result<()> {
    let binary = ensure_player_installed(settings)?;
    let args = player_args(stream, title, settings);
    tracing::info!("launching {} for {}", binary.display(), stream.url);

    let status = tokio::task::spawn_blocking(move || {
        std::process::Command::new(&binary).args(&args).status()
    })
    .await
    .context("player task panicked")?
    .context("failed to start player")?;

    tracing::debug!("player exited with {status}");
    Ok(())
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}
