//! Shared headless browser for the browser-backed image sources.
//!
//! One Chromium process serves every adapter call. It is launched lazily on
//! the first [`BrowserPool::acquire_page`], health-checked on every
//! acquisition and relaunched when the connection is gone. Each search gets
//! its own tab wrapped in a [`PageGuard`], which closes the tab on every exit
//! path; the process itself lives until [`BrowserPool::shutdown`].

use crate::extract::ImageElement;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::page::Page;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use vehimg_core::AppConfig;

/// Budget for the `Browser.getVersion` round-trip used as a liveness probe.
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Interval between selector polls in [`PageGuard::wait_for`].
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Collects every `<img>` with the attributes the photo filter needs.
const IMAGES_SCRIPT: &str = r#"
Array.from(document.querySelectorAll('img')).map(img => ({
    src: img.currentSrc || img.src || null,
    dataSrc: img.getAttribute('data-src') || img.getAttribute('data-iurl') || null,
    width: img.naturalWidth || null
}))
"#;

/// Errors that can occur while driving the browser.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Failed to launch or connect to browser.
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    /// Failed to navigate to URL.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Failed to get page content.
    #[error("content retrieval failed: {0}")]
    ContentRetrieval(String),

    /// Page script failed or returned an unexpected shape.
    #[error("script evaluation failed: {0}")]
    Script(String),

    /// Timeout waiting for page to load.
    #[error("render timeout after {0}ms")]
    Timeout(u64),

    /// Wait selector not found.
    #[error("wait_for selector not found: {0}")]
    SelectorNotFound(String),

    /// Browser closed unexpectedly.
    #[error("browser closed unexpectedly")]
    BrowserClosed,
}

/// Browser launch and page options.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Navigation timeout (default: 30s).
    pub navigation_timeout: Duration,

    /// Viewport dimensions (default: 1920x1080).
    pub viewport: (u32, u32),

    /// User agent presented by every tab.
    pub user_agent: String,

    /// Explicit Chrome/Chromium binary; autodetected when `None`.
    pub chrome_executable: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_millis(30000),
            viewport: (1920, 1080),
            user_agent: AppConfig::default().user_agent,
            chrome_executable: None,
        }
    }
}

impl RenderOptions {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            navigation_timeout: config.navigation_timeout(),
            user_agent: config.user_agent.clone(),
            chrome_executable: config.chrome_executable.clone(),
            ..Default::default()
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, RenderError> {
        let (width, height) = self.viewport;
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(width, height)
            .request_timeout(self.navigation_timeout)
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(RenderError::BrowserLaunch)
    }
}

/// A launched browser plus the task pumping its CDP connection.
struct ManagedBrowser {
    browser: Browser,
    alive: Arc<AtomicBool>,
    handler: JoinHandle<()>,
}

impl ManagedBrowser {
    async fn launch(options: &RenderOptions) -> Result<Self, RenderError> {
        use futures_util::StreamExt;

        let (browser, mut handler) = Browser::launch(options.browser_config()?)
            .await
            .map_err(|e| RenderError::BrowserLaunch(e.to_string()))?;

        let alive = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&alive);
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {e}");
                    break;
                }
            }
            flag.store(false, Ordering::Release);
        });

        tracing::info!("browser launched");
        Ok(Self { browser, alive, handler })
    }

    async fn is_healthy(&self) -> bool {
        if !self.alive.load(Ordering::Acquire) {
            return false;
        }
        matches!(tokio::time::timeout(HEALTH_CHECK_TIMEOUT, self.browser.version()).await, Ok(Ok(_)))
    }

    async fn teardown(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::debug!("browser close failed: {e}");
        }
        let _ = tokio::time::timeout(HEALTH_CHECK_TIMEOUT, self.browser.wait()).await;
        self.handler.abort();
    }
}

/// Lazily launched, self-healing owner of the shared browser process.
pub struct BrowserPool {
    options: RenderOptions,
    state: Mutex<Option<ManagedBrowser>>,
}

impl BrowserPool {
    /// Create a pool; nothing is launched until the first page is acquired.
    pub fn new(options: RenderOptions) -> Self {
        Self { options, state: Mutex::new(None) }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Open a fresh tab, launching or relaunching the browser if needed.
    pub async fn acquire_page(&self) -> Result<PageGuard, RenderError> {
        let mut state = self.state.lock().await;

        let healthy = match state.as_ref() {
            Some(existing) => existing.is_healthy().await,
            None => false,
        };

        if !healthy {
            if let Some(stale) = state.take() {
                tracing::warn!("browser disconnected, relaunching");
                stale.teardown().await;
            }
            *state = Some(ManagedBrowser::launch(&self.options).await?);
        }

        let Some(managed) = state.as_ref() else {
            return Err(RenderError::BrowserClosed);
        };

        let page = managed
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;
        drop(state);

        let guard = PageGuard::new(page, self.options.navigation_timeout);
        guard
            .page
            .set_user_agent(SetUserAgentOverrideParams::new(self.options.user_agent.clone()))
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        Ok(guard)
    }

    /// Whether a browser process is currently running.
    pub async fn is_running(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// Close the browser. Only called at process exit.
    pub async fn shutdown(&self) {
        if let Some(managed) = self.state.lock().await.take() {
            managed.teardown().await;
            tracing::info!("browser shut down");
        }
    }
}

/// A tab scoped to one search.
///
/// [`PageGuard::close`] closes it on the normal path; dropping the guard
/// without closing schedules the close on the runtime.
pub struct PageGuard {
    page: Page,
    timeout: Duration,
    closed: bool,
}

impl PageGuard {
    fn new(page: Page, timeout: Duration) -> Self {
        Self { page, timeout, closed: false }
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    /// Navigate and wait for the load to finish.
    pub async fn goto(&self, url: &str) -> Result<(), RenderError> {
        tokio::time::timeout(self.timeout, async {
            self.page
                .goto(url)
                .await
                .map_err(|e| RenderError::Navigation(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|_| RenderError::Timeout(self.timeout_ms()))?
    }

    /// Poll until `selector` matches, for at most `limit`.
    pub async fn wait_for(&self, selector: &str, limit: Duration) -> Result<(), RenderError> {
        let wait_result = tokio::time::timeout(limit, async {
            loop {
                if self.page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
            }
        })
        .await;

        wait_result.map_err(|_| RenderError::SelectorNotFound(selector.to_string()))
    }

    /// Every `<img>` currently in the DOM, with rendered widths.
    pub async fn images(&self) -> Result<Vec<ImageElement>, RenderError> {
        self.page
            .evaluate(IMAGES_SCRIPT)
            .await
            .map_err(|e| RenderError::Script(e.to_string()))?
            .into_value::<Vec<ImageElement>>()
            .map_err(|e| RenderError::Script(e.to_string()))
    }

    /// Serialized DOM of the current document.
    pub async fn html(&self) -> Result<String, RenderError> {
        self.page
            .content()
            .await
            .map_err(|e| RenderError::ContentRetrieval(e.to_string()))
    }

    /// URL of the current document.
    pub async fn current_url(&self) -> Result<Option<String>, RenderError> {
        self.page
            .url()
            .await
            .map_err(|e| RenderError::ContentRetrieval(e.to_string()))
    }

    /// Click the `index`-th element matching `selector`.
    ///
    /// Returns `false` when fewer elements match.
    pub async fn click_nth(&self, selector: &str, index: usize) -> Result<bool, RenderError> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| RenderError::ContentRetrieval(e.to_string()))?;

        let Some(element) = elements.get(index) else {
            return Ok(false);
        };

        element
            .click()
            .await
            .map_err(|e| RenderError::Script(e.to_string()))?;
        Ok(true)
    }

    pub async fn scroll_by(&self, pixels: i32) -> Result<(), RenderError> {
        self.page
            .evaluate(format!("window.scrollBy(0, {pixels})"))
            .await
            .map_err(|e| RenderError::Script(e.to_string()))?;
        Ok(())
    }

    /// Close the tab.
    pub async fn close(mut self) {
        self.closed = true;
        if let Err(e) = self.page.clone().close().await {
            tracing::debug!("page close failed: {e}");
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let page = self.page.clone();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                if let Err(e) = page.close().await {
                    tracing::debug!("deferred page close failed: {e}");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_from_app_config() {
        let app = AppConfig {
            navigation_timeout_ms: 12000,
            chrome_executable: Some(PathBuf::from("/usr/bin/chromium")),
            ..Default::default()
        };
        let options = RenderOptions::from_app_config(&app);
        assert_eq!(options.navigation_timeout, Duration::from_millis(12000));
        assert_eq!(options.viewport, (1920, 1080));
        assert_eq!(options.chrome_executable.as_deref(), Some(std::path::Path::new("/usr/bin/chromium")));
    }

    #[tokio::test]
    async fn test_pool_is_lazy() {
        let pool = BrowserPool::new(RenderOptions::default());
        assert!(!pool.is_running().await);
        pool.shutdown().await;
        assert!(!pool.is_running().await);
    }

    #[tokio::test]
    #[ignore = "requires Chrome/Chromium installation"]
    async fn test_acquire_reuses_browser() {
        let pool = BrowserPool::new(RenderOptions::default());

        let first = pool.acquire_page().await.unwrap();
        first.close().await;
        assert!(pool.is_running().await);

        let second = pool.acquire_page().await.unwrap();
        drop(second);

        pool.shutdown().await;
        assert!(!pool.is_running().await);
    }

    #[tokio::test]
    #[ignore = "requires network and Chrome/Chromium"]
    async fn test_images_on_simple_page() {
        let pool = BrowserPool::new(RenderOptions::default());
        let page = pool.acquire_page().await.unwrap();
        page.goto("https://example.com").await.unwrap();

        let images = page.images().await.unwrap();
        assert!(images.is_empty());
        assert!(page.html().await.unwrap().contains("Example Domain"));

        page.close().await;
        pool.shutdown().await;
    }
}
