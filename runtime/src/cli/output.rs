// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! Terminal output helpers and the discovery progress spinner.

use indicatif::{ProgressBar, ProgressStyle};
use reelsniff::progress::{ProgressEventKind, ProgressReceiver};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Whether `--quiet` was given.
pub fn is_quiet() -> bool {
    std::env::var("REELSNIFF_QUIET").is_ok_and(|v| v == "1")
}

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("  Error: failed to encode JSON: {e}"),
    }
}

/// Print a status line unless quiet.
pub fn status(message: &str) {
    if !is_quiet() {
        eprintln!("{message}");
    }
}

/// What the spinner should do for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpinnerUpdate {
    /// Replace the spinner message.
    Message(String),
    /// Print a line above the spinner.
    Line(String),
    /// Stop the spinner and print a final line.
    Finish(String),
}

/// Map a progress event to a spinner update.
pub fn spinner_update(event: &ProgressEventKind) -> SpinnerUpdate {
    match event {
        ProgressEventKind::DiscoveryStarted { identifier, sources } => {
            SpinnerUpdate::Message(format!("Sniffing {identifier} across {sources} sources..."))
        }
        ProgressEventKind::SourceStarted { name, .. } => {
            SpinnerUpdate::Message(format!("Scanning {name}..."))
        }
        ProgressEventKind::SourceFailed { name, .. } => {
            SpinnerUpdate::Line(format!("  -> {name} failed. Switching..."))
        }
        ProgressEventKind::StreamFound { url, .. } => {
            SpinnerUpdate::Finish(format!("Found Stream! {}...", truncate(url, 50)))
        }
        ProgressEventKind::DiscoveryExhausted { .. } => {
            SpinnerUpdate::Finish("All sources failed.".to_string())
        }
        ProgressEventKind::Warning { message } => {
            SpinnerUpdate::Line(format!("  warning: {message}"))
        }
    }
}

/// Render progress events on a stderr spinner until the sender side closes.
pub fn spawn_spinner(mut rx: ProgressReceiver) -> JoinHandle<()> {
    let spinner = if is_quiet() {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(80));

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match spinner_update(&event.event) {
                    SpinnerUpdate::Message(msg) => spinner.set_message(msg),
                    SpinnerUpdate::Line(line) => spinner.println(line),
                    SpinnerUpdate::Finish(line) => {
                        spinner.finish_and_clear();
                        if !is_quiet() {
                            eprintln!("{line}");
                        }
                    }
                },
                Err(RecvError::Lagged(missed)) => {
                    tracing::debug!("spinner lagged, {missed} events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        spinner.finish_and_clear();
    })
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_events() {
        let started = ProgressEventKind::SourceStarted {
            name: "VidSrc.net".into(),
            index: 0,
            total: 6,
        };
        assert_eq!(
            spinner_update(&started),
            SpinnerUpdate::Message("Scanning VidSrc.net...".into())
        );

        let failed = ProgressEventKind::SourceFailed {
            name: "VidSrc.net".into(),
            ticks: 30,
            elapsed_ms: 15_000,
        };
        assert_eq!(
            spinner_update(&failed),
            SpinnerUpdate::Line("  -> VidSrc.net failed. Switching...".into())
        );
    }

    #[test]
    fn test_terminal_events_finish() {
        let exhausted = ProgressEventKind::DiscoveryExhausted { attempted: 6 };
        assert_eq!(
            spinner_update(&exhausted),
            SpinnerUpdate::Finish("All sources failed.".into())
        );

        let found = ProgressEventKind::StreamFound {
            name: "AutoEmbed".into(),
            url: "https://cdn.example/hls/master.m3u8".into(),
            elapsed_ms: 900,
        };
        assert_eq!(
            spinner_update(&found),
            SpinnerUpdate::Finish("Found Stream! https://cdn.example/hls/master.m3u8...".into())
        );
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("ab", 3), "ab");
        assert_eq!(truncate("ééé", 2), "éé");
    }
}
