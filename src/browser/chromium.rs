//! Chromium-based renderer using chromiumoxide.

use super::{BrowserPage, Renderer};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight)";
const HEIGHT_JS: &str = "document.body.scrollHeight";

/// Launches a fresh headless Chromium for every `open()`.
pub struct ChromiumRenderer {
    executable: Option<PathBuf>,
    headless: bool,
}

impl ChromiumRenderer {
    /// Creates a renderer. Without an explicit executable, chromiumoxide's
    /// own Chrome discovery is used.
    pub fn new(executable: Option<PathBuf>, headless: bool) -> Self {
        Self { executable, headless }
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={}", USER_AGENT))
            .window_size(1920, 1080);

        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        if !self.headless {
            builder = builder.with_head();
        }

        builder.build().map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn open(&self) -> Result<Box<dyn BrowserPage>> {
        let config = self.browser_config()?;
        let (mut browser, mut handler) =
            Browser::launch(config).await.context("failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler.abort();
                bail!("failed to create new page: {e}");
            }
        };

        debug!("Chromium launched");
        Ok(Box::new(ChromiumPage { browser, page, handler }))
    }
}

/// A page together with the browser process that owns it.
pub struct ChromiumPage {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => bail!("navigation to {url} failed: {e}"),
            Err(_) => bail!("navigation to {url} timed out after {}s", timeout.as_secs()),
        }
    }

    async fn content(&self) -> Result<String> {
        self.page.content().await.context("failed to read page content")
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.page.evaluate(SCROLL_TO_BOTTOM_JS).await.context("scroll failed")?;
        Ok(())
    }

    async fn scroll_by(&self, dy: i64) -> Result<()> {
        self.page.evaluate(format!("window.scrollBy(0, {})", dy)).await.context("scroll failed")?;
        Ok(())
    }

    async fn document_height(&self) -> Result<u64> {
        let height: f64 = self
            .page
            .evaluate(HEIGHT_JS)
            .await
            .context("failed to read document height")?
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert document height: {e:?}"))?;
        Ok(height.max(0.0) as u64)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let ChromiumPage { mut browser, page, handler } = *self;

        if let Err(e) = page.close().await {
            debug!("Page close error: {}", e);
        }
        let result = browser.close().await;
        if let Err(e) = browser.wait().await {
            warn!("Chromium did not exit cleanly: {}", e);
        }
        handler.abort();

        result.map(|_| ()).context("failed to close Chromium")
    }
}
