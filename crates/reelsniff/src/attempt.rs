// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! Attempt controller: one detection cycle against one source.
//!
//! An attempt moves through `Navigating → Polling → {Found, TimedOut, Failed}`:
//!
//! 1. Two observers are installed on the page: a request observer that
//!    resolves the [`ResultSlot`] on the first qualifying request, and a
//!    navigation guard that sends the main frame back to the source when a
//!    site bounces it to `about:blank`.
//! 2. The page navigates to the source address. Failures here are soft.
//! 3. Up to `max_iterations` ticks: check the slot, check the page URL and
//!    content, run the interaction heuristics, then wait one poll window for
//!    the slot. Page reads and interaction share one read budget per tick.
//! 4. Both observers are released before returning, whatever the outcome.

use crate::config::SniffConfig;
use crate::error::PageResult;
use crate::interact;
use crate::page::{within, BrowserPage, FrameNavigation, ObservedRequest, BLANK_URL};
use crate::signal::SignalDetector;
use crate::slot::ResultSlot;
use crate::sources::Source;
use crate::types::{AttemptOutcome, StreamDescriptor};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::Instrument;

/// Lifecycle of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Navigating,
    Polling,
    Found,
    TimedOut,
    Failed,
}

impl std::fmt::Display for AttemptState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Navigating => write!(f, "navigating"),
            Self::Polling => write!(f, "polling"),
            Self::Found => write!(f, "found"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// How an attempt ended.
#[derive(Debug, Clone)]
pub struct AttemptReport {
    pub state: AttemptState,
    pub stream: Option<StreamDescriptor>,
    /// Poll ticks started before the attempt ended.
    pub ticks: u32,
    pub elapsed: Duration,
    /// Degraded conditions worth surfacing, such as a missing observer.
    pub warnings: Vec<String>,
}

/// Runs attempts against a shared page using one configuration.
#[derive(Debug, Clone)]
pub struct AttemptController {
    config: SniffConfig,
    detector: SignalDetector,
}

impl AttemptController {
    pub fn new(config: SniffConfig) -> Self {
        let detector = SignalDetector::new(&config);
        Self { config, detector }
    }

    pub fn config(&self) -> &SniffConfig {
        &self.config
    }

    /// Try `source` for `identifier` on `page`.
    ///
    /// Returns `Ok(None)` when the source yields nothing within the
    /// iteration cap. `Err` is reserved for a lost browser.
    pub async fn attempt(
        &self,
        page: &Arc<dyn BrowserPage>,
        source: &Source,
        identifier: &str,
    ) -> PageResult<AttemptOutcome> {
        let report = self.run(page, source, identifier).await?;
        Ok(report.stream)
    }

    /// Same as [`attempt`](Self::attempt) but keeps the bookkeeping.
    pub async fn run(
        &self,
        page: &Arc<dyn BrowserPage>,
        source: &Source,
        identifier: &str,
    ) -> PageResult<AttemptReport> {
        let address = source.address(identifier);
        let span = tracing::info_span!("attempt", source = %source.name);

        async {
            let started = Instant::now();
            let slot = Arc::new(ResultSlot::new());
            let mut ticks = 0;

            let mut warnings = Vec::new();

            let result = match ObserverGuard::install(page, &address, &slot, self).await {
                Ok(mut observers) => {
                    warnings.append(&mut observers.warnings);
                    let polled = self.navigate_and_poll(page.as_ref(), &address, &slot, &mut ticks).await;
                    observers.release().await;
                    polled
                }
                Err(e) => Err(e),
            };

            let elapsed = started.elapsed();
            match result {
                Ok(Some(stream)) => {
                    tracing::info!(ticks, "stream found: {}", stream.url);
                    Ok(AttemptReport {
                        state: AttemptState::Found,
                        stream: Some(stream),
                        ticks,
                        elapsed,
                        warnings,
                    })
                }
                Ok(None) => {
                    tracing::info!(ticks, "no stream after {}ms", elapsed.as_millis());
                    Ok(AttemptReport {
                        state: AttemptState::TimedOut,
                        stream: None,
                        ticks,
                        elapsed,
                        warnings,
                    })
                }
                Err(e) => {
                    tracing::warn!(state = %AttemptState::Failed, "attempt aborted: {e}");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn navigate_and_poll(
        &self,
        page: &dyn BrowserPage,
        address: &str,
        slot: &ResultSlot,
        ticks: &mut u32,
    ) -> PageResult<AttemptOutcome> {
        tracing::debug!(state = %AttemptState::Navigating, "navigating to {address}");
        if let Err(e) = page.navigate(address, self.config.navigation_timeout()).await {
            if e.is_fatal() {
                return Err(e);
            }
            tracing::debug!("navigation to {address} did not settle: {e}; polling anyway");
        }

        tracing::debug!(
            state = %AttemptState::Polling,
            "polling up to {} ticks, {}ms at most",
            self.config.max_iterations,
            self.config.attempt_budget().as_millis()
        );
        for _ in 0..self.config.max_iterations {
            *ticks += 1;

            if let Some(found) = slot.get() {
                return Ok(Some(found));
            }

            let deadline = Instant::now() + self.config.read_timeout();
            match self.check_page(page, address, deadline).await {
                Ok(Some(found)) => return Ok(Some(found)),
                Ok(None) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => tracing::debug!("page state unreadable this tick: {e}"),
            }

            let report = interact::poke(page, &self.config, deadline).await?;
            tracing::trace!(?report, "interaction round");

            if let Some(found) = slot.wait_for(self.config.poll_window()).await {
                return Ok(Some(found));
            }
        }

        Ok(None)
    }

    /// URL-pattern and content signals against the page as it is right now.
    async fn check_page(
        &self,
        page: &dyn BrowserPage,
        address: &str,
        deadline: Instant,
    ) -> PageResult<AttemptOutcome> {
        let page_url = within(deadline, "current url", page.current_url()).await?;
        if let Some(found) = self.detector.from_page_url(&page_url, address) {
            return Ok(Some(found));
        }
        let content = within(deadline, "content", page.content()).await?;
        Ok(self.detector.from_content(&page_url, &content, address))
    }
}

/// Owns the observer tasks of one attempt.
///
/// Dropping a task drops its event stream, which unregisters the observer
/// on the page. `release` waits for that to happen; `Drop` covers the
/// cancelled and panicking paths.
struct ObserverGuard {
    tasks: Vec<JoinHandle<()>>,
    warnings: Vec<String>,
}

impl ObserverGuard {
    async fn install(
        page: &Arc<dyn BrowserPage>,
        address: &str,
        slot: &Arc<ResultSlot>,
        controller: &AttemptController,
    ) -> PageResult<Self> {
        let mut guard = Self {
            tasks: Vec::with_capacity(2),
            warnings: Vec::new(),
        };

        match page.observe_requests().await {
            Ok(requests) => guard.tasks.push(tokio::spawn(
                watch_requests(
                    requests,
                    Arc::clone(page),
                    Arc::clone(slot),
                    controller.detector.clone(),
                    controller.config.read_timeout(),
                )
                .in_current_span(),
            )),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!("request observer unavailable, polling only: {e}");
                guard.warnings.push(format!("request observer unavailable: {e}"));
            }
        }

        match page.observe_navigations().await {
            Ok(navigations) => guard.tasks.push(tokio::spawn(
                hold_navigation(
                    navigations,
                    Arc::clone(page),
                    address.to_string(),
                    controller.config.navigation_timeout(),
                )
                .in_current_span(),
            )),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!("navigation guard unavailable: {e}");
                guard.warnings.push(format!("navigation guard unavailable: {e}"));
            }
        }

        Ok(guard)
    }

    async fn release(mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Resolve `slot` with the first qualifying request, then stop listening.
async fn watch_requests(
    mut requests: BoxStream<'static, ObservedRequest>,
    page: Arc<dyn BrowserPage>,
    slot: Arc<ResultSlot>,
    detector: SignalDetector,
    read_timeout: Duration,
) {
    while let Some(request) = requests.next().await {
        if !detector.is_media_url(&request.url) {
            continue;
        }
        let page_url = match request.header("referer") {
            Some(_) => String::new(),
            None => within(Instant::now() + read_timeout, "current url", page.current_url())
                .await
                .unwrap_or_default(),
        };
        if let Some(found) = detector.from_request(&request, &page_url) {
            if slot.resolve(found) {
                tracing::debug!("request observer matched {}", request.url);
            }
            break;
        }
    }
}

/// Send the main frame back to `address` whenever it lands on `about:blank`.
async fn hold_navigation(
    mut navigations: BoxStream<'static, FrameNavigation>,
    page: Arc<dyn BrowserPage>,
    address: String,
    timeout: Duration,
) {
    while let Some(nav) = navigations.next().await {
        if !nav.is_main_frame || nav.url != BLANK_URL {
            continue;
        }
        tracing::debug!("main frame bounced to {BLANK_URL}, returning to {address}");
        if let Err(e) = page.navigate(&address, timeout).await {
            tracing::debug!("re-navigation failed: {e}");
        }
    }
}
