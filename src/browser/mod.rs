//! Browser abstraction for rendering pages and reading their DOM.
//!
//! Defines the `Renderer` and `BrowserPage` traits that abstract over the
//! browser engine (Chromium via chromiumoxide), so the crawl logic can be
//! tested against a scripted mock.

pub mod chromium;

#[cfg(test)]
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

pub use chromium::ChromiumRenderer;

/// Launches browser instances.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Launches one browser instance with a single blank page.
    ///
    /// The returned page owns the browser; closing it shuts the browser down.
    async fn open(&self) -> Result<Box<dyn BrowserPage>>;
}

/// A single page in its own browser instance.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigates to `url`, failing if it does not load within `timeout`.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// Returns the rendered HTML of the current document.
    async fn content(&self) -> Result<String>;

    /// Scrolls to the bottom of the document.
    async fn scroll_to_bottom(&self) -> Result<()>;

    /// Scrolls by `dy` pixels (negative scrolls up).
    async fn scroll_by(&self, dy: i64) -> Result<()>;

    /// Current `document.body.scrollHeight`.
    async fn document_height(&self) -> Result<u64>;

    /// Closes the page and its browser.
    async fn close(self: Box<Self>) -> Result<()>;
}
