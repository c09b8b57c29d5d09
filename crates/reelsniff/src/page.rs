// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! Browser page abstraction.
//!
//! Defines the `BrowserPage` trait the discovery engine drives. The runtime
//! implements it with chromiumoxide; tests implement it with a scripted page.

use crate::error::{PageError, PageResult};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Address a page sits on before anything loads, and where hijacked navigations land.
pub const BLANK_URL: &str = "about:blank";

/// An outbound request seen on the page's network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
}

impl ObservedRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A frame finished navigating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameNavigation {
    pub url: String,
    pub is_main_frame: bool,
}

/// A frame currently attached to the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameHandle {
    pub id: String,
    pub is_main: bool,
}

/// A single browser page the engine navigates, inspects and pokes at.
///
/// Every method may fail while the site navigates, detaches frames or
/// replaces its document; callers treat those failures as soft. Event
/// subscriptions last as long as the returned stream: dropping it
/// unregisters the observer.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigate the main frame, waiting at most `timeout` for the navigation to commit.
    async fn navigate(&self, url: &str, timeout: Duration) -> PageResult<()>;

    /// The main frame's current URL.
    async fn current_url(&self) -> PageResult<String>;

    /// Serialized HTML of the main document.
    async fn content(&self) -> PageResult<String>;

    /// Viewport width and height in CSS pixels.
    async fn viewport(&self) -> PageResult<(f64, f64)>;

    /// Dispatch a synthetic pointer click at viewport coordinates.
    async fn click_at(&self, x: f64, y: f64) -> PageResult<()>;

    /// Frames attached right now, main frame included.
    async fn frames(&self) -> PageResult<Vec<FrameHandle>>;

    /// Evaluate a script inside `frame`, discarding its result.
    async fn evaluate_in_frame(&self, frame: &FrameHandle, script: &str) -> PageResult<()>;

    /// Click the first element matching `selector` inside `frame`.
    ///
    /// Returns `false` when nothing matched.
    async fn click_in_frame(
        &self,
        frame: &FrameHandle,
        selector: &str,
        timeout: Duration,
    ) -> PageResult<bool>;

    /// Subscribe to outbound requests.
    async fn observe_requests(&self) -> PageResult<BoxStream<'static, ObservedRequest>>;

    /// Subscribe to frame navigations.
    async fn observe_navigations(&self) -> PageResult<BoxStream<'static, FrameNavigation>>;
}

/// Run a page operation, giving up with [`PageError::Stalled`] at `deadline`.
///
/// An operation that is already complete succeeds even past the deadline.
pub async fn within<T, F>(deadline: Instant, operation: &str, op: F) -> PageResult<T>
where
    F: Future<Output = PageResult<T>>,
{
    match tokio::time::timeout_at(deadline, op).await {
        Ok(result) => result,
        Err(_) => Err(PageError::Stalled(operation.to_string())),
    }
}
