// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! Discovery orchestrator: walk the source registry until one yields a stream.
//!
//! Sources run strictly one after another on the same page: two half-loaded
//! embed sites clicking and navigating at once would spoil detection for both.

use crate::attempt::AttemptController;
use crate::config::SniffConfig;
use crate::error::SniffError;
use crate::page::BrowserPage;
use crate::progress::{self, ProgressEventKind, ProgressSender};
use crate::sources::Source;
use crate::types::AttemptOutcome;
use std::sync::Arc;

/// Runs one discovery per call against a shared page.
pub struct Discovery {
    controller: AttemptController,
    progress: Option<ProgressSender>,
}

impl Discovery {
    pub fn new(config: SniffConfig) -> Self {
        Self {
            controller: AttemptController::new(config),
            progress: None,
        }
    }

    /// Report progress on `tx`.
    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn config(&self) -> &SniffConfig {
        self.controller.config()
    }

    /// Discover a stream using the configured source registry.
    pub async fn discover(
        &self,
        page: &Arc<dyn BrowserPage>,
        identifier: &str,
    ) -> Result<AttemptOutcome, SniffError> {
        let sources = self.controller.config().sources.clone();
        self.discover_from(page, &sources, identifier).await
    }

    /// Attempt each of `sources` in order and return the first stream.
    ///
    /// `Ok(None)` means every source was tried and none worked. `Err` only
    /// when the browser itself went away.
    pub async fn discover_from(
        &self,
        page: &Arc<dyn BrowserPage>,
        sources: &[Source],
        identifier: &str,
    ) -> Result<AttemptOutcome, SniffError> {
        let run_id = format!("sniff-{}", uuid::Uuid::new_v4());
        let mut seq = 0u64;
        let total = sources.len();

        progress::emit(
            &self.progress,
            &run_id,
            &mut seq,
            ProgressEventKind::DiscoveryStarted {
                identifier: identifier.to_string(),
                sources: total,
            },
        );

        for (index, source) in sources.iter().enumerate() {
            progress::emit(
                &self.progress,
                &run_id,
                &mut seq,
                ProgressEventKind::SourceStarted {
                    name: source.name.clone(),
                    index,
                    total,
                },
            );

            let report = self
                .controller
                .run(page, source, identifier)
                .await
                .map_err(|cause| SniffError::BrowserLost {
                    source_name: source.name.clone(),
                    cause,
                })?;

            for message in &report.warnings {
                progress::emit(
                    &self.progress,
                    &run_id,
                    &mut seq,
                    ProgressEventKind::Warning {
                        message: format!("{}: {message}", source.name),
                    },
                );
            }

            let elapsed_ms = report.elapsed.as_millis() as u64;
            match report.stream {
                Some(stream) => {
                    progress::emit(
                        &self.progress,
                        &run_id,
                        &mut seq,
                        ProgressEventKind::StreamFound {
                            name: source.name.clone(),
                            url: stream.url.clone(),
                            elapsed_ms,
                        },
                    );
                    return Ok(Some(stream));
                }
                None => {
                    tracing::info!("{} failed after {} ticks, switching", source.name, report.ticks);
                    progress::emit(
                        &self.progress,
                        &run_id,
                        &mut seq,
                        ProgressEventKind::SourceFailed {
                            name: source.name.clone(),
                            ticks: report.ticks,
                            elapsed_ms,
                        },
                    );
                }
            }
        }

        progress::emit(
            &self.progress,
            &run_id,
            &mut seq,
            ProgressEventKind::DiscoveryExhausted { attempted: total },
        );
        Ok(None)
    }
}
