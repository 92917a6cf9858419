//! Detail page extraction with one browser per product.

use super::context::{pause, RunContext};
use super::sink::ProgressSink;
use crate::browser::{BrowserPage, Renderer};
use crate::site::{Parser, ProductRecord};
use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Position of a product within the run, for log lines.
#[derive(Debug, Clone, Copy)]
pub struct Position {
    pub index: usize,
    pub total: usize,
}

/// Loads one detail page and extracts a record from it.
pub struct DetailExtractor<'a> {
    renderer: &'a dyn Renderer,
    ctx: &'a RunContext,
    sink: &'a dyn ProgressSink,
    parser: Parser,
}

impl<'a> DetailExtractor<'a> {
    pub fn new(
        renderer: &'a dyn Renderer,
        ctx: &'a RunContext,
        sink: &'a dyn ProgressSink,
    ) -> Self {
        Self { renderer, ctx, sink, parser: Parser::new(ctx.origin.clone()) }
    }

    /// Returns `None` when the page could not be loaded or read.
    ///
    /// Failures are logged and never propagated; the browser opened for
    /// this product is closed on every path.
    pub async fn extract(&self, url: &str, position: Option<Position>) -> Option<ProductRecord> {
        let label = match position {
            Some(p) => format!("Crawling product {}/{}: {}", p.index + 1, p.total, url),
            None => format!("Crawling product: {}", url),
        };
        self.sink.log_line(&label);

        match self.try_extract(url).await {
            Ok(record) => {
                debug!("Extracted {:?} ({}) from {}", record.name, record.numeric_price, url);
                let price = display_price(&record);
                self.sink.log_line(&format!("Extracted: {} ({})", record.name, price));
                Some(record)
            }
            Err(e) => {
                warn!("Detail extraction failed for {}: {:#}", url, e);
                self.sink.log_line(&format!("Failed to extract {}: {:#}", url, e));
                None
            }
        }
    }

    async fn try_extract(&self, url: &str) -> Result<ProductRecord> {
        let mut page = self.renderer.open().await.context("failed to launch browser")?;

        let html = self.snapshot(page.as_mut(), url).await;

        if let Err(e) = page.close().await {
            warn!("Failed to close browser for {}: {}", url, e);
        }

        Ok(self.parser.parse_detail(url, &html?, self.sink))
    }

    async fn snapshot(&self, page: &mut dyn BrowserPage, url: &str) -> Result<String> {
        page.goto(url, self.ctx.timings.navigation_timeout).await?;
        pause(self.ctx.timings.page_load_wait()).await;
        page.content().await.context("failed to read page content")
    }
}

fn display_price(record: &ProductRecord) -> &str {
    if record.numeric_price.is_empty() { "no price" } else { &record.numeric_price }
}
