//! Discovery engine integration tests.
//!
//! Drives the attempt controller and orchestrator against a scripted page
//! whose "sites" emit requests, bounce to about:blank, break frames or lose
//! the browser on cue. Time is paused, so a full 30-tick timeout costs nothing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::stream::BoxStream;
use futures::StreamExt;

use reelsniff::attempt::{AttemptController, AttemptState};
use reelsniff::progress::{self, ProgressEventKind};
use reelsniff::*;

// ─────────────────────── scripted page ───────────────────────

/// How a fake embed site behaves once the page lands on its address.
#[derive(Clone, Default)]
struct Site {
    /// Requests fired as soon as navigation commits.
    on_load: Vec<ObservedRequest>,
    /// Request fired on the Nth center click.
    after_clicks: Option<(usize, ObservedRequest)>,
    /// First navigation gets hijacked to about:blank.
    bounce_first: bool,
    /// Document body is a playlist.
    playlist_content: bool,
    /// Frame listing fails.
    broken_frames: bool,
    /// `current_url` and `content` fail.
    unreadable: bool,
    /// Navigation reports an error but the page still loads.
    navigation_errors: bool,
    /// The browser dies on navigation.
    disconnect: bool,
    /// `content` and the main frame script hang, as behind an `alert()`.
    stalled: bool,
}

#[derive(Default)]
struct PageState {
    url: String,
    sites: HashMap<String, Site>,
    navigations: Vec<String>,
    bounced: Vec<String>,
    clicks_here: usize,
    center_clicks: usize,
    content_reads: usize,
    /// Request subscriptions fail.
    requests_unobservable: bool,
    request_txs: Vec<UnboundedSender<ObservedRequest>>,
    nav_txs: Vec<UnboundedSender<FrameNavigation>>,
}

impl PageState {
    fn site(&self) -> Site {
        self.sites.get(&self.url).cloned().unwrap_or_default()
    }

    fn send_request(&mut self, req: ObservedRequest) {
        self.request_txs.retain(|tx| !tx.is_closed());
        for tx in &self.request_txs {
            let _ = tx.unbounded_send(req.clone());
        }
    }

    fn send_navigation(&mut self, nav: FrameNavigation) {
        self.nav_txs.retain(|tx| !tx.is_closed());
        for tx in &self.nav_txs {
            let _ = tx.unbounded_send(nav.clone());
        }
    }
}

#[derive(Default)]
struct MockPage {
    state: Mutex<PageState>,
}

impl MockPage {
    fn with_sites(sites: Vec<(&str, Site)>) -> Arc<Self> {
        let page = Self::default();
        {
            let mut st = page.state.lock().unwrap();
            st.url = "about:blank".into();
            for (addr, site) in sites {
                st.sites.insert(addr.to_string(), site);
            }
        }
        Arc::new(page)
    }

    fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    fn center_clicks(&self) -> usize {
        self.state.lock().unwrap().center_clicks
    }

    fn content_reads(&self) -> usize {
        self.state.lock().unwrap().content_reads
    }

    fn live_observers(&self) -> usize {
        let st = self.state.lock().unwrap();
        st.request_txs.iter().filter(|tx| !tx.is_closed()).count()
            + st.nav_txs.iter().filter(|tx| !tx.is_closed()).count()
    }

    fn without_request_observer(self: Arc<Self>) -> Arc<Self> {
        self.state.lock().unwrap().requests_unobservable = true;
        self
    }

    fn emit_request(&self, req: ObservedRequest) {
        self.state.lock().unwrap().send_request(req);
    }
}

#[async_trait]
impl BrowserPage for MockPage {
    async fn navigate(&self, url: &str, _timeout: Duration) -> PageResult<()> {
        let mut st = self.state.lock().unwrap();
        st.navigations.push(url.to_string());
        st.clicks_here = 0;

        let site = st.sites.get(url).cloned().unwrap_or_default();
        if site.disconnect {
            return Err(PageError::Disconnected("websocket closed".into()));
        }
        if site.bounce_first && !st.bounced.iter().any(|u| u == url) {
            st.bounced.push(url.to_string());
            st.url = "about:blank".into();
            st.send_navigation(FrameNavigation {
                url: "about:blank".into(),
                is_main_frame: true,
            });
            return Ok(());
        }

        st.url = url.to_string();
        st.send_navigation(FrameNavigation {
            url: url.to_string(),
            is_main_frame: true,
        });
        for req in site.on_load {
            st.send_request(req);
        }
        if site.navigation_errors {
            return Err(PageError::Navigation("net::ERR_ABORTED".into()));
        }
        Ok(())
    }

    async fn current_url(&self) -> PageResult<String> {
        let st = self.state.lock().unwrap();
        if st.site().unreadable {
            return Err(PageError::Protocol("execution context destroyed".into()));
        }
        Ok(st.url.clone())
    }

    async fn content(&self) -> PageResult<String> {
        let site = {
            let mut st = self.state.lock().unwrap();
            st.content_reads += 1;
            st.site()
        };
        if site.stalled {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if site.unreadable {
            return Err(PageError::Protocol("execution context destroyed".into()));
        }
        if site.playlist_content {
            return Ok("<html><body><pre>#EXTM3U\n#EXT-X-VERSION:3\n</pre></body></html>".into());
        }
        Ok("<html><body><div class=\"player\"></div></body></html>".into())
    }

    async fn viewport(&self) -> PageResult<(f64, f64)> {
        Ok((1280.0, 720.0))
    }

    async fn click_at(&self, x: f64, y: f64) -> PageResult<()> {
        assert_eq!((x, y), (640.0, 360.0));
        let mut st = self.state.lock().unwrap();
        st.center_clicks += 1;
        st.clicks_here += 1;
        if let Some((n, req)) = st.site().after_clicks {
            if st.clicks_here == n {
                st.send_request(req);
            }
        }
        Ok(())
    }

    async fn frames(&self) -> PageResult<Vec<FrameHandle>> {
        if self.state.lock().unwrap().site().broken_frames {
            return Err(PageError::FrameDetached("F1".into()));
        }
        Ok(vec![
            FrameHandle {
                id: "main".into(),
                is_main: true,
            },
            FrameHandle {
                id: "ad-iframe".into(),
                is_main: false,
            },
        ])
    }

    async fn evaluate_in_frame(&self, frame: &FrameHandle, _script: &str) -> PageResult<()> {
        let stalled = self.state.lock().unwrap().site().stalled;
        if stalled && frame.is_main {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if frame.is_main {
            Ok(())
        } else {
            Err(PageError::Script("cross-origin frame".into()))
        }
    }

    async fn click_in_frame(
        &self,
        _frame: &FrameHandle,
        _selector: &str,
        timeout: Duration,
    ) -> PageResult<bool> {
        Err(PageError::Timeout {
            operation: "click".into(),
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    async fn observe_requests(&self) -> PageResult<BoxStream<'static, ObservedRequest>> {
        let mut st = self.state.lock().unwrap();
        if st.requests_unobservable {
            return Err(PageError::Protocol("Network.enable failed".into()));
        }
        let (tx, rx) = unbounded();
        st.request_txs.push(tx);
        drop(st);
        Ok(rx.boxed())
    }

    async fn observe_navigations(&self) -> PageResult<BoxStream<'static, FrameNavigation>> {
        let (tx, rx) = unbounded();
        self.state.lock().unwrap().nav_txs.push(tx);
        Ok(rx.boxed())
    }
}

// ─────────────────────── helpers ───────────────────────

fn test_config(max_iterations: u32) -> SniffConfig {
    SniffConfig {
        max_iterations,
        sources: vec![
            Source::new("A", "https://a.example/embed/"),
            Source::new("B", "https://b.example/embed/"),
            Source::new("C", "https://c.example/embed/"),
        ],
        ..SniffConfig::default()
    }
}

fn as_dyn(page: &Arc<MockPage>) -> Arc<dyn BrowserPage> {
    Arc::clone(page) as Arc<dyn BrowserPage>
}

const ID: &str = "tt0133093";
const A: &str = "https://a.example/embed/tt0133093";
const B: &str = "https://b.example/embed/tt0133093";
const C: &str = "https://c.example/embed/tt0133093";

fn stream_request(url: &str) -> ObservedRequest {
    ObservedRequest::new(url)
        .with_header("Referer", "https://player.a.example/")
        .with_header("User-Agent", "Mozilla/5.0 Mock")
}

// ─────────────────────── attempt controller ───────────────────────

#[tokio::test(start_paused = true)]
async fn test_request_signal_resolves_attempt() {
    let page = MockPage::with_sites(vec![(
        A,
        Site {
            on_load: vec![stream_request("https://cdn.example/hls/master.m3u8")],
            ..Site::default()
        },
    )]);
    let controller = AttemptController::new(test_config(30));
    let source = Source::new("A", "https://a.example/embed/");

    let report = controller.run(&as_dyn(&page), &source, ID).await.unwrap();

    assert_eq!(report.state, AttemptState::Found);
    assert_eq!(report.ticks, 1);
    let stream = report.stream.unwrap();
    assert_eq!(stream.url, "https://cdn.example/hls/master.m3u8");
    assert_eq!(stream.referer, "https://player.a.example/");
    assert_eq!(stream.user_agent, "Mozilla/5.0 Mock");
    assert_eq!(stream.cookie, "", "missing cookie header becomes empty");
}

#[tokio::test(start_paused = true)]
async fn test_first_qualifying_request_wins() {
    let page = MockPage::with_sites(vec![(
        A,
        Site {
            on_load: vec![
                ObservedRequest::new("https://ads.example/pixel.gif"),
                ObservedRequest::new("https://a.example/favicon.m3u8"),
                stream_request("https://cdn.example/first.m3u8"),
                stream_request("https://cdn.example/second.mp4"),
            ],
            ..Site::default()
        },
    )]);
    let controller = AttemptController::new(test_config(30));

    let found = controller
        .attempt(&as_dyn(&page), &Source::new("A", "https://a.example/embed/"), ID)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.url, "https://cdn.example/first.m3u8");
}

#[tokio::test(start_paused = true)]
async fn test_request_without_referer_uses_page_url() {
    let page = MockPage::with_sites(vec![(
        A,
        Site {
            on_load: vec![ObservedRequest::new("https://cdn.example/movie.mp4")
                .with_header("cookie", "session=abc")],
            ..Site::default()
        },
    )]);
    let controller = AttemptController::new(test_config(30));

    let found = controller
        .attempt(&as_dyn(&page), &Source::new("A", "https://a.example/embed/"), ID)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.referer, A);
    assert_eq!(found.cookie, "session=abc");
    assert_eq!(found.user_agent, "");
}

#[tokio::test(start_paused = true)]
async fn test_content_signal_uses_page_and_source_address() {
    let page = MockPage::with_sites(vec![(
        A,
        Site {
            playlist_content: true,
            ..Site::default()
        },
    )]);
    let controller = AttemptController::new(test_config(30));

    let found = controller
        .attempt(&as_dyn(&page), &Source::new("A", "https://a.example/embed/"), ID)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.url, A);
    assert_eq!(found.referer, A);
    assert_eq!(found.user_agent, "");
    assert_eq!(page.center_clicks(), 0, "content signal fires before interaction");
}

#[tokio::test(start_paused = true)]
async fn test_silent_page_times_out_after_iteration_cap() {
    let page = MockPage::with_sites(vec![]);
    let config = test_config(7);
    let window = config.poll_window();
    let controller = AttemptController::new(config);

    let report = controller
        .run(&as_dyn(&page), &Source::new("A", "https://a.example/embed/"), ID)
        .await
        .unwrap();

    assert_eq!(report.state, AttemptState::TimedOut);
    assert!(report.stream.is_none());
    assert_eq!(report.ticks, 7);
    assert_eq!(page.center_clicks(), 7);
    assert_eq!(page.content_reads(), 7);
    assert!(report.elapsed >= window * 7);
    assert!(report.elapsed < window * 8);
}

#[tokio::test(start_paused = true)]
async fn test_frozen_page_stays_within_attempt_budget() {
    let page = MockPage::with_sites(vec![(
        A,
        Site {
            stalled: true,
            ..Site::default()
        },
    )]);
    let config = test_config(30);
    let budget = config.attempt_budget();
    let windows_only = config.poll_window() * config.max_iterations;
    let controller = AttemptController::new(config);

    let report = controller
        .run(&as_dyn(&page), &Source::new("A", "https://a.example/embed/"), ID)
        .await
        .unwrap();

    assert_eq!(report.state, AttemptState::TimedOut);
    assert_eq!(report.ticks, 30);
    assert_eq!(page.center_clicks(), 30, "interaction still runs every tick");
    assert!(report.elapsed <= budget + Duration::from_secs(1), "took {:?}", report.elapsed);
    assert!(report.elapsed < windows_only * 2, "took {:?}", report.elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_frozen_page_still_yields_network_stream() {
    let page = MockPage::with_sites(vec![(
        A,
        Site {
            stalled: true,
            after_clicks: Some((2, stream_request("https://cdn.example/behind-dialog.m3u8"))),
            ..Site::default()
        },
    )]);
    let controller = AttemptController::new(test_config(30));

    let report = controller
        .run(&as_dyn(&page), &Source::new("A", "https://a.example/embed/"), ID)
        .await
        .unwrap();

    assert_eq!(report.state, AttemptState::Found);
    assert_eq!(report.ticks, 2);
    assert_eq!(report.stream.unwrap().url, "https://cdn.example/behind-dialog.m3u8");
}

#[tokio::test(start_paused = true)]
async fn test_request_after_interaction_is_caught() {
    let page = MockPage::with_sites(vec![(
        A,
        Site {
            after_clicks: Some((3, stream_request("https://cdn.example/index.m3u8"))),
            broken_frames: true,
            unreadable: true,
            ..Site::default()
        },
    )]);
    let controller = AttemptController::new(test_config(30));

    let report = controller
        .run(&as_dyn(&page), &Source::new("A", "https://a.example/embed/"), ID)
        .await
        .unwrap();

    assert_eq!(report.state, AttemptState::Found);
    assert_eq!(report.ticks, 3);
    assert_eq!(page.center_clicks(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_navigation_error_still_polls() {
    let page = MockPage::with_sites(vec![(
        A,
        Site {
            navigation_errors: true,
            playlist_content: true,
            ..Site::default()
        },
    )]);
    let controller = AttemptController::new(test_config(30));

    let found = controller
        .attempt(&as_dyn(&page), &Source::new("A", "https://a.example/embed/"), ID)
        .await
        .unwrap();

    assert!(found.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_blank_hijack_is_renavigated() {
    let page = MockPage::with_sites(vec![(
        A,
        Site {
            bounce_first: true,
            on_load: vec![stream_request("https://cdn.example/after-bounce.m3u8")],
            ..Site::default()
        },
    )]);
    let controller = AttemptController::new(test_config(30));

    let found = controller
        .attempt(&as_dyn(&page), &Source::new("A", "https://a.example/embed/"), ID)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.url, "https://cdn.example/after-bounce.m3u8");
    assert_eq!(page.navigations(), vec![A.to_string(), A.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_observers_released_after_success_and_timeout() {
    let page = MockPage::with_sites(vec![(
        A,
        Site {
            on_load: vec![stream_request("https://cdn.example/a.m3u8")],
            ..Site::default()
        },
    )]);
    let controller = AttemptController::new(test_config(4));
    let dyn_page = as_dyn(&page);

    let found = controller
        .attempt(&dyn_page, &Source::new("A", "https://a.example/embed/"), ID)
        .await
        .unwrap();
    assert!(found.is_some());
    assert_eq!(page.live_observers(), 0);

    let missed = controller
        .attempt(&dyn_page, &Source::new("B", "https://b.example/embed/"), ID)
        .await
        .unwrap();
    assert!(missed.is_none());
    assert_eq!(page.live_observers(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_previous_attempt_does_not_leak_into_next() {
    let page = MockPage::with_sites(vec![(
        B,
        Site {
            bounce_first: true,
            ..Site::default()
        },
    )]);
    let controller = AttemptController::new(test_config(3));
    let dyn_page = as_dyn(&page);

    let first = controller
        .attempt(&dyn_page, &Source::new("A", "https://a.example/embed/"), ID)
        .await
        .unwrap();
    assert!(first.is_none());

    // A straggling stream request from A's site lands with nobody listening.
    page.emit_request(stream_request("https://cdn.example/stale.m3u8"));

    let second = controller
        .attempt(&dyn_page, &Source::new("B", "https://b.example/embed/"), ID)
        .await
        .unwrap();

    assert!(second.is_none());
    // Only B's guard reacts to B's hijack; A's guard is gone.
    assert_eq!(
        page.navigations(),
        vec![A.to_string(), B.to_string(), B.to_string()]
    );
    assert_eq!(page.live_observers(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_is_fatal_and_releases_observers() {
    let page = MockPage::with_sites(vec![(
        A,
        Site {
            disconnect: true,
            ..Site::default()
        },
    )]);
    let controller = AttemptController::new(test_config(30));

    let err = controller
        .attempt(&as_dyn(&page), &Source::new("A", "https://a.example/embed/"), ID)
        .await
        .unwrap_err();

    assert!(err.is_fatal());
    assert_eq!(page.live_observers(), 0);
}

// ─────────────────────── orchestrator ───────────────────────

#[tokio::test(start_paused = true)]
async fn test_discovery_stops_at_first_success() {
    let page = MockPage::with_sites(vec![
        (
            B,
            Site {
                on_load: vec![stream_request("https://cdn.example/b.m3u8")],
                ..Site::default()
            },
        ),
        (
            C,
            Site {
                on_load: vec![stream_request("https://cdn.example/c.m3u8")],
                ..Site::default()
            },
        ),
    ]);
    let (tx, mut rx) = progress::channel();
    let discovery = Discovery::new(test_config(5)).with_progress(tx);

    let found = discovery.discover(&as_dyn(&page), ID).await.unwrap().unwrap();

    assert_eq!(found.url, "https://cdn.example/b.m3u8");
    assert_eq!(page.navigations(), vec![A.to_string(), B.to_string()]);

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        kinds.push(event.event);
    }
    assert!(matches!(kinds[0], ProgressEventKind::DiscoveryStarted { sources: 3, .. }));
    assert!(matches!(&kinds[2], ProgressEventKind::SourceFailed { name, ticks: 5, .. } if name == "A"));
    assert!(matches!(&kinds[4], ProgressEventKind::StreamFound { name, .. } if name == "B"));
    assert_eq!(kinds.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_discovery_exhausts_every_source_once_in_order() {
    let page = MockPage::with_sites(vec![]);
    let (tx, mut rx) = progress::channel();
    let discovery = Discovery::new(test_config(2)).with_progress(tx);

    let found = discovery.discover(&as_dyn(&page), ID).await.unwrap();

    assert!(found.is_none());
    assert_eq!(
        page.navigations(),
        vec![A.to_string(), B.to_string(), C.to_string()]
    );
    assert_eq!(page.live_observers(), 0);

    let mut last = None;
    while let Ok(event) = rx.try_recv() {
        last = Some(event.event);
    }
    assert!(matches!(last, Some(ProgressEventKind::DiscoveryExhausted { attempted: 3 })));
}

#[tokio::test(start_paused = true)]
async fn test_discovery_aborts_when_browser_is_lost() {
    let page = MockPage::with_sites(vec![(
        A,
        Site {
            disconnect: true,
            ..Site::default()
        },
    )]);
    let discovery = Discovery::new(test_config(5));

    let err = discovery.discover(&as_dyn(&page), ID).await.unwrap_err();

    assert!(matches!(err, SniffError::BrowserLost { ref source_name, .. } if source_name == "A"));
    assert_eq!(page.navigations(), vec![A.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_missing_request_observer_is_reported_as_warning() {
    let page = MockPage::with_sites(vec![(
        B,
        Site {
            playlist_content: true,
            ..Site::default()
        },
    )])
    .without_request_observer();
    let (tx, mut rx) = progress::channel();
    let discovery = Discovery::new(test_config(2)).with_progress(tx);

    let found = discovery.discover(&as_dyn(&page), ID).await.unwrap().unwrap();

    assert_eq!(found.url, B);
    let mut warnings = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let ProgressEventKind::Warning { message } = event.event {
            warnings.push(message);
        }
    }
    assert_eq!(warnings.len(), 2);
    assert!(warnings[0].starts_with("A: request observer unavailable"));
    assert!(warnings[1].starts_with("B: request observer unavailable"));
    assert_eq!(page.live_observers(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_discover_from_explicit_sources() {
    let page = MockPage::with_sites(vec![(
        "https://solo.example/e/tt0133093/auto",
        Site {
            playlist_content: true,
            ..Site::default()
        },
    )]);
    let discovery = Discovery::new(test_config(5));
    let sources = vec![Source::new("Solo", "https://solo.example/e/{id}/auto")];

    let found = discovery
        .discover_from(&as_dyn(&page), &sources, ID)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.referer, "https://solo.example/e/tt0133093/auto");
}
