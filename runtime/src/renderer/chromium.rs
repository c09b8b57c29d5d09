// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! Chromium-backed `BrowserPage` using chromiumoxide.

use super::{find_chromium, BrowserSettings};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::EventRequestWillBeSent;
use chromiumoxide::cdp::browser_protocol::page::{
    EventFrameNavigated, EventJavascriptDialogOpening, FrameId, HandleJavaScriptDialogParams,
    NavigateParams,
};
use chromiumoxide::cdp::browser_protocol::target::{EventTargetCreated, TargetId};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::layout::Point;
use chromiumoxide::page::Page;
use futures::stream::BoxStream;
use futures::StreamExt;
use reelsniff::page::BLANK_URL;
use reelsniff::{BrowserPage, FrameHandle, FrameNavigation, ObservedRequest, PageError, PageResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A launched browser with the single page discovery runs on.
pub struct ChromiumSession {
    browser: Arc<Browser>,
    page: Arc<ChromiumPage>,
    handler: JoinHandle<()>,
    popup_guard: JoinHandle<()>,
    dialog_guard: JoinHandle<()>,
}

impl ChromiumSession {
    /// Launch Chromium with a persistent profile and take over its first tab.
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let chrome_path = settings
            .executable
            .clone()
            .or_else(find_chromium)
            .context("Chromium not found. Install Chrome/Chromium or set REELSNIFF_CHROMIUM_PATH.")?;

        std::fs::create_dir_all(&settings.profile_dir).with_context(|| {
            format!(
                "failed to create browser profile dir {}",
                settings.profile_dir.display()
            )
        })?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(&settings.profile_dir)
            .window_size(settings.viewport_width, settings.viewport_height)
            .request_timeout(Duration::from_millis(settings.request_timeout_ms))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", settings.user_agent));
        builder = if settings.headless {
            builder.arg("--headless=new")
        } else {
            builder.with_head()
        };
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler: {e}");
                }
            }
        });

        let page = match browser.pages().await.ok().and_then(|p| p.into_iter().next()) {
            Some(page) => page,
            None => browser
                .new_page(BLANK_URL)
                .await
                .context("failed to create new page")?,
        };
        let keep = page.target_id().clone();

        let dialogs = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .context("failed to subscribe to JavaScript dialogs")?;
        let dialog_guard = tokio::spawn(dismiss_dialogs(page.clone(), dialogs));

        let browser = Arc::new(browser);
        let popup_guard = tokio::spawn(close_blank_popups(Arc::clone(&browser), keep));

        Ok(Self {
            browser,
            page: Arc::new(ChromiumPage { page }),
            handler,
            popup_guard,
            dialog_guard,
        })
    }

    /// The page discovery runs on.
    pub fn page(&self) -> Arc<dyn BrowserPage> {
        Arc::clone(&self.page) as Arc<dyn BrowserPage>
    }

    /// Close the browser and stop the CDP handler.
    pub async fn shutdown(self) -> Result<()> {
        self.popup_guard.abort();
        let _ = self.popup_guard.await;
        self.dialog_guard.abort();
        let _ = self.dialog_guard.await;
        drop(self.page);

        if let Ok(mut browser) = Arc::try_unwrap(self.browser) {
            if let Err(e) = browser.close().await {
                tracing::debug!("browser close: {e}");
            }
            let _ = browser.wait().await;
        }
        self.handler.abort();
        Ok(())
    }
}

/// Dismiss `alert`/`confirm`/`prompt` dialogs as they open.
///
/// While a dialog is up the page answers no `Runtime.evaluate` calls.
async fn dismiss_dialogs<S>(page: Page, mut dialogs: S)
where
    S: futures::Stream<Item = Arc<EventJavascriptDialogOpening>> + Unpin,
{
    while let Some(dialog) = dialogs.next().await {
        tracing::debug!("dismissing {:?} dialog: {}", dialog.r#type, dialog.message);
        if let Err(e) = page.execute(HandleJavaScriptDialogParams::new(false)).await {
            tracing::debug!("dialog dismissal failed: {e}");
        }
    }
}

/// Close `about:blank` popups that ads open next to the discovery page.
async fn close_blank_popups(browser: Arc<Browser>, keep: TargetId) {
    let mut created = match browser.event_listener::<EventTargetCreated>().await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!("popup guard unavailable: {e}");
            return;
        }
    };
    while let Some(event) = created.next().await {
        let info = &event.target_info;
        if info.r#type != "page" || info.target_id == keep || info.url != BLANK_URL {
            continue;
        }
        let Ok(pages) = browser.pages().await else {
            continue;
        };
        for popup in pages {
            if popup.target_id() == &info.target_id {
                tracing::debug!("closing popup {:?}", info.target_id);
                let _ = popup.close().await;
            }
        }
    }
}

/// One Chromium tab.
pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    async fn evaluate_in_context(&self, frame: &FrameHandle, expression: String) -> PageResult<serde_json::Value> {
        let mut params = EvaluateParams::builder()
            .expression(expression)
            .return_by_value(true);
        if !frame.is_main {
            let context = self
                .page
                .frame_execution_context(FrameId::new(frame.id.clone()))
                .await
                .map_err(page_error)?
                .ok_or_else(|| PageError::FrameDetached(frame.id.clone()))?;
            params = params.context_id(context);
        }
        let params = params.build().map_err(PageError::Script)?;
        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|e| match page_error(e) {
                PageError::Protocol(msg) => PageError::Script(msg),
                other => other,
            })?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn navigate(&self, url: &str, timeout: Duration) -> PageResult<()> {
        let navigation = self.page.execute(NavigateParams::new(url));
        match tokio::time::timeout(timeout, navigation).await {
            Ok(Ok(response)) => match &response.error_text {
                Some(text) if !text.is_empty() => Err(PageError::Navigation(text.clone())),
                _ => Ok(()),
            },
            Ok(Err(e)) => Err(page_error(e)),
            Err(_) => Err(PageError::Timeout {
                operation: "navigate".into(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn current_url(&self) -> PageResult<String> {
        Ok(self.page.url().await.map_err(page_error)?.unwrap_or_default())
    }

    async fn content(&self) -> PageResult<String> {
        self.page.content().await.map_err(page_error)
    }

    async fn viewport(&self) -> PageResult<(f64, f64)> {
        let size: Vec<f64> = self
            .page
            .evaluate("[window.innerWidth, window.innerHeight]")
            .await
            .map_err(page_error)?
            .into_value()
            .map_err(|e| PageError::Script(format!("viewport: {e}")))?;
        match size.as_slice() {
            [w, h] => Ok((*w, *h)),
            _ => Err(PageError::Script("viewport: unexpected shape".into())),
        }
    }

    async fn click_at(&self, x: f64, y: f64) -> PageResult<()> {
        self.page
            .click(Point::new(x, y))
            .await
            .map_err(page_error)?;
        Ok(())
    }

    async fn frames(&self) -> PageResult<Vec<FrameHandle>> {
        let main = self.page.mainframe().await.map_err(page_error)?;
        let frames = self.page.frames().await.map_err(page_error)?;
        Ok(frames
            .into_iter()
            .map(|id| FrameHandle {
                is_main: main.as_ref() == Some(&id),
                id: id.inner().clone(),
            })
            .collect())
    }

    async fn evaluate_in_frame(&self, frame: &FrameHandle, script: &str) -> PageResult<()> {
        // Function scope, so repeated runs don't redeclare top-level bindings.
        self.evaluate_in_context(frame, format!("(() => {{ {script} }})()"))
            .await
            .map(|_| ())
    }

    async fn click_in_frame(
        &self,
        frame: &FrameHandle,
        selector: &str,
        timeout: Duration,
    ) -> PageResult<bool> {
        let timed_out = || PageError::Timeout {
            operation: format!("click {selector}"),
            timeout_ms: timeout.as_millis() as u64,
        };

        if frame.is_main {
            let click = async {
                let element = match self.page.find_element(selector).await {
                    Ok(element) => element,
                    Err(CdpError::NotFound) => return Ok(false),
                    Err(e) => return Err(page_error(e)),
                };
                element.click().await.map_err(page_error)?;
                Ok(true)
            };
            return tokio::time::timeout(timeout, click)
                .await
                .map_err(|_| timed_out())?;
        }

        let quoted = serde_json::to_string(selector)
            .map_err(|e| PageError::Script(e.to_string()))?;
        let expression = format!(
            "(() => {{ const el = document.querySelector({quoted}); \
             if (!el) return false; el.click(); return true; }})()"
        );
        let clicked = tokio::time::timeout(timeout, self.evaluate_in_context(frame, expression))
            .await
            .map_err(|_| timed_out())??;
        Ok(clicked.as_bool().unwrap_or(false))
    }

    async fn observe_requests(&self) -> PageResult<BoxStream<'static, ObservedRequest>> {
        let events = self
            .page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(page_error)?;
        Ok(events
            .map(|event| ObservedRequest {
                url: event.request.url.clone(),
                headers: header_map(event.request.headers.inner()),
            })
            .boxed())
    }

    async fn observe_navigations(&self) -> PageResult<BoxStream<'static, FrameNavigation>> {
        let events = self
            .page
            .event_listener::<EventFrameNavigated>()
            .await
            .map_err(page_error)?;
        Ok(events
            .map(|event| FrameNavigation {
                url: event.frame.url.clone(),
                is_main_frame: event.frame.parent_id.is_none(),
            })
            .boxed())
    }
}

fn header_map(headers: &serde_json::Value) -> HashMap<String, String> {
    headers
        .as_object()
        .map(|obj| {
            obj.iter()
                .map(|(k, v)| {
                    let value = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                    (k.clone(), value)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Classify a CDP failure. A dead websocket or handler channel means the
/// browser is gone; everything else is a per-operation miss.
fn page_error(err: CdpError) -> PageError {
    match err {
        CdpError::Ws(e) => PageError::Disconnected(e.to_string()),
        CdpError::ChannelSendError(e) => PageError::Disconnected(e.to_string()),
        CdpError::Timeout => PageError::Timeout {
            operation: "cdp request".into(),
            timeout_ms: 0,
        },
        other => PageError::Protocol(other.to_string()),
    }
}
