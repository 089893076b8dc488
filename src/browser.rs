//! Controllable browser sessions.
//!
//! The pipeline drives pages through the [`BrowserSession`] trait: visit a
//! URL, read the rendered HTML, click a link by its text, go back. Sessions
//! are created by a [`SessionLauncher`] and exclusively owned by one run.
//!
//! [`ChromeLauncher`] starts a Chromium process over the DevTools protocol
//! with `chromiumoxide`. The protocol handler is polled on its own tokio
//! task for the lifetime of the session.
//!
//! A click or history step may return before the tab has left the page it
//! was on. Callers that read the page afterwards wait with
//! [`wait_for_url_change`] first.

use crate::config::BrowserOptions;
use crate::error::{FetchError, SessionError};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

const URL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Navigation primitives over one live browser tab.
pub trait BrowserSession {
    /// Navigate to `url` and wait for the load to finish.
    async fn visit(&mut self, url: &str) -> Result<(), FetchError>;

    /// The current page's rendered HTML.
    async fn html(&mut self) -> Result<String, FetchError>;

    /// URL of the page the tab is showing.
    async fn current_url(&mut self) -> Result<String, FetchError>;

    /// Follow the first link whose text contains `text`.
    async fn click_link_by_text(&mut self, text: &str) -> Result<(), FetchError>;

    /// Go back one entry in the tab's history.
    async fn back(&mut self) -> Result<(), FetchError>;

    /// Shut the browser down.
    async fn close(self) -> Result<(), FetchError>;
}

/// Creates browser sessions.
pub trait SessionLauncher {
    type Session: BrowserSession;

    async fn launch(&self) -> Result<Self::Session, SessionError>;
}

/// Poll `session` until its tab has left `from`.
///
/// # Arguments
///
/// * `session` - The tab that was just told to navigate
/// * `from` - URL the tab showed before the navigation
/// * `limit` - Longest time to keep polling
///
/// # Returns
///
/// The URL the tab moved to, or [`FetchError::NavigationTimeout`] if it is
/// still on `from` once `limit` has passed.
pub async fn wait_for_url_change<S: BrowserSession>(
    session: &mut S,
    from: &str,
    limit: Duration,
) -> Result<String, FetchError> {
    let started = Instant::now();
    loop {
        let url = session.current_url().await?;
        if url != from {
            return Ok(url);
        }
        let waited = started.elapsed();
        if waited >= limit {
            return Err(FetchError::NavigationTimeout { url, waited });
        }
        sleep(URL_POLL_INTERVAL).await;
    }
}

/// Launches Chromium sessions.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    options: BrowserOptions,
}

impl ChromeLauncher {
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }
}

impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    #[instrument(level = "info", skip_all, fields(headless = self.options.headless))]
    async fn launch(&self) -> Result<ChromeSession, SessionError> {
        let mut builder = BrowserConfig::builder().args(self.options.args.clone());
        if !self.options.headless {
            builder = builder.with_head();
        }
        if let Some(ref path) = self.options.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(SessionError)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SessionError(e.to_string()))?;
        let handle = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handle.abort();
                return Err(SessionError(format!("failed to open tab: {e}")));
            }
        };

        info!("Browser session started");
        Ok(ChromeSession {
            browser,
            page,
            handler: Some(handle),
            navigation_timeout: self.options.navigation_timeout(),
        })
    }
}

/// A Chromium process with a single tab.
///
/// Call [`BrowserSession::close`] to shut the process down cleanly; dropping
/// the session only stops the protocol handler task.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: Option<JoinHandle<()>>,
    navigation_timeout: Duration,
}

impl std::fmt::Debug for ChromeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromeSession")
            .field("handler_running", &self.handler.is_some())
            .finish()
    }
}

fn browser_err(e: impl std::fmt::Display) -> FetchError {
    FetchError::Browser(e.to_string())
}

/// Evaluates to the resolved `href` of the first anchor containing the given
/// text, or `null`.
fn link_target_script(text: &str) -> Result<String, FetchError> {
    let needle = serde_json::to_string(text).map_err(browser_err)?;
    Ok(format!(
        "(() => {{ const t = {needle}; \
         const a = Array.from(document.querySelectorAll('a[href]')).find(a => a.textContent.includes(t)); \
         return a ? a.href : null; }})()"
    ))
}

impl BrowserSession for ChromeSession {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn visit(&mut self, url: &str) -> Result<(), FetchError> {
        self.page.goto(url).await.map_err(browser_err)?;
        Ok(())
    }

    async fn html(&mut self) -> Result<String, FetchError> {
        self.page.content().await.map_err(browser_err)
    }

    async fn current_url(&mut self) -> Result<String, FetchError> {
        self.page
            .url()
            .await
            .map_err(browser_err)?
            .ok_or_else(|| FetchError::Browser("tab has no URL".to_string()))
    }

    /// Resolves the link's target in the page, then navigates there with
    /// `goto` so the call returns only once the target has loaded.
    #[instrument(level = "debug", skip_all, fields(%text))]
    async fn click_link_by_text(&mut self, text: &str) -> Result<(), FetchError> {
        let target: Option<String> = self
            .page
            .evaluate(link_target_script(text)?)
            .await
            .map_err(browser_err)?
            .into_value()
            .map_err(browser_err)?;
        let target = target.ok_or_else(|| FetchError::LinkNotFound(text.to_string()))?;
        self.page.goto(target.as_str()).await.map_err(browser_err)?;
        debug!(url = %target, "Followed link");
        Ok(())
    }

    /// `history.back()` returns before the tab moves, and the previous page
    /// still counts as loaded until it does. Wait for the URL to change
    /// before waiting for the load.
    async fn back(&mut self) -> Result<(), FetchError> {
        let from = self.current_url().await?;
        self.page
            .evaluate("window.history.back()")
            .await
            .map_err(browser_err)?;
        let limit = self.navigation_timeout;
        let url = wait_for_url_change(&mut *self, &from, limit).await?;
        self.page.wait_for_navigation().await.map_err(browser_err)?;
        debug!(%url, "Went back");
        Ok(())
    }

    #[instrument(level = "info", skip_all)]
    async fn close(mut self) -> Result<(), FetchError> {
        let closed = self.browser.close().await.map_err(browser_err);
        if closed.is_ok() {
            let _ = self.browser.wait().await;
        }
        if let Some(handle) = self.handler.take() {
            handle.abort();
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!(error = %e, "Browser handler task failed");
                }
            }
        }
        closed?;
        info!("Browser session closed");
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Some(handle) = self.handler.take() {
            handle.abort();
        }
    }
}

/// In-memory browser serving fixture pages, for tests.
#[cfg(test)]
pub mod fake {
    use super::*;
    use scraper::{Html, Selector};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use url::Url;

    /// Observations shared between a fake session and the test holding it.
    #[derive(Debug, Default)]
    pub struct Tracker {
        pub closed: AtomicBool,
        pub launches: AtomicUsize,
        pub visits: Mutex<Vec<String>>,
    }

    /// A click or back step the tab has not committed yet.
    #[derive(Debug)]
    struct Pending {
        history: Vec<String>,
        polls_left: usize,
    }

    /// Serves `pages` by absolute URL; unknown URLs fail like a dead host.
    ///
    /// With [`FakeSession::with_lag`], clicks and back steps only take effect
    /// after the tab's URL has been polled that many times, and until then
    /// the old page is still served.
    #[derive(Debug)]
    pub struct FakeSession {
        pages: HashMap<String, String>,
        history: Vec<String>,
        pending: Option<Pending>,
        lag: usize,
        fail_close: bool,
        tracker: Arc<Tracker>,
    }

    impl FakeSession {
        pub fn new(pages: HashMap<String, String>, tracker: Arc<Tracker>) -> Self {
            Self {
                pages,
                history: Vec::new(),
                pending: None,
                lag: 0,
                fail_close: false,
                tracker,
            }
        }

        pub fn with_lag(mut self, polls: usize) -> Self {
            self.lag = polls;
            self
        }

        pub fn failing_close(mut self) -> Self {
            self.fail_close = true;
            self
        }

        /// URL of the committed page, ignoring any pending navigation.
        pub fn committed_url(&self) -> Option<&str> {
            self.history.last().map(String::as_str)
        }

        fn committed(&self) -> Result<String, FetchError> {
            self.committed_url()
                .map(str::to_string)
                .ok_or_else(|| FetchError::Browser("no page loaded".to_string()))
        }

        fn navigate(&mut self, history: Vec<String>) {
            if self.lag == 0 {
                self.history = history;
            } else {
                self.pending = Some(Pending {
                    history,
                    polls_left: self.lag,
                });
            }
        }

        fn record_visit(&self, url: &str) -> Result<(), FetchError> {
            if !self.pages.contains_key(url) {
                return Err(FetchError::Browser(format!("net::ERR_NAME_NOT_RESOLVED {url}")));
            }
            self.tracker.visits.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    impl BrowserSession for FakeSession {
        async fn visit(&mut self, url: &str) -> Result<(), FetchError> {
            self.record_visit(url)?;
            self.pending = None;
            self.history.push(url.to_string());
            Ok(())
        }

        async fn html(&mut self) -> Result<String, FetchError> {
            let url = self.committed()?;
            Ok(self.pages[&url].clone())
        }

        async fn current_url(&mut self) -> Result<String, FetchError> {
            if let Some(pending) = self.pending.as_mut() {
                pending.polls_left -= 1;
                if pending.polls_left == 0 {
                    if let Some(pending) = self.pending.take() {
                        self.history = pending.history;
                    }
                }
            }
            self.committed()
        }

        async fn click_link_by_text(&mut self, text: &str) -> Result<(), FetchError> {
            let current = self.committed()?;
            let document = Html::parse_document(&self.pages[&current]);
            let anchors = Selector::parse("a[href]").unwrap();
            let href = document
                .select(&anchors)
                .find(|a| a.text().collect::<String>().contains(text))
                .and_then(|a| a.value().attr("href"))
                .ok_or_else(|| FetchError::LinkNotFound(text.to_string()))?;
            let target = Url::parse(&current)
                .and_then(|base| base.join(href))
                .map_err(|e| FetchError::Browser(e.to_string()))?;
            self.record_visit(target.as_str())?;

            let mut history = self.history.clone();
            history.push(target.to_string());
            self.navigate(history);
            Ok(())
        }

        async fn back(&mut self) -> Result<(), FetchError> {
            if self.history.len() < 2 {
                return Err(FetchError::Browser("no history to go back to".to_string()));
            }
            let mut history = self.history.clone();
            history.pop();
            self.navigate(history);
            Ok(())
        }

        async fn close(self) -> Result<(), FetchError> {
            self.tracker.closed.store(true, Ordering::SeqCst);
            if self.fail_close {
                return Err(FetchError::Browser("browser process already exited".to_string()));
            }
            Ok(())
        }
    }

    /// Hands out [`FakeSession`]s, or fails like a missing browser binary.
    #[derive(Debug, Default)]
    pub struct FakeLauncher {
        pub pages: HashMap<String, String>,
        pub fail: bool,
        pub fail_close: bool,
        pub lag: usize,
        pub tracker: Arc<Tracker>,
    }

    impl FakeLauncher {
        pub fn with_pages(pages: HashMap<String, String>) -> Self {
            Self {
                pages,
                ..Self::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    impl SessionLauncher for FakeLauncher {
        type Session = FakeSession;

        async fn launch(&self) -> Result<FakeSession, SessionError> {
            self.tracker.launches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SessionError("chrome executable not found".to_string()));
            }
            let mut session =
                FakeSession::new(self.pages.clone(), Arc::clone(&self.tracker)).with_lag(self.lag);
            if self.fail_close {
                session = session.failing_close();
            }
            Ok(session)
        }
    }
}
