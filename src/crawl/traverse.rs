//! Listing traversal: infinite scroll plus `page=N` pagination.

use super::context::{pause, RunContext};
use super::sink::ProgressSink;
use crate::browser::{BrowserPage, Renderer};
use crate::site::{urls, Parser};
use anyhow::{Context, Result};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Listing pages visited at most.
pub const MAX_PAGES: u32 = 3;

/// Scroll iterations per page at most.
pub const MAX_SCROLLS: usize = 15;

/// Every this many scrolls, nudge up and back down to wake lazy loaders.
pub const NUDGE_EVERY: usize = 3;

const NUDGE_PX: i64 = 300;

/// Walks a listing and returns detail URLs in page order.
pub struct ListingTraverser<'a> {
    renderer: &'a dyn Renderer,
    ctx: &'a RunContext,
    sink: &'a dyn ProgressSink,
    parser: Parser,
}

impl<'a> ListingTraverser<'a> {
    pub fn new(
        renderer: &'a dyn Renderer,
        ctx: &'a RunContext,
        sink: &'a dyn ProgressSink,
    ) -> Self {
        Self { renderer, ctx, sink, parser: Parser::new(ctx.origin.clone()) }
    }

    /// Collects up to `max_items` detail URLs.
    ///
    /// One browser is used for every listing page and closed before
    /// returning, whether or not traversal succeeded.
    pub async fn collect_links(&self) -> Result<Vec<String>> {
        let mut page = self.renderer.open().await.context("failed to launch browser for listing")?;

        let result = self.walk(page.as_mut()).await;

        if let Err(e) = page.close().await {
            warn!("Failed to close listing browser: {}", e);
        }

        if let Err(e) = &result {
            self.sink.log_line(&format!("Listing crawl failed: {:#}", e));
        }
        result
    }

    async fn walk(&self, page: &mut dyn BrowserPage) -> Result<Vec<String>> {
        let max_items = self.ctx.max_items;
        let mut links: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for page_no in 1..=MAX_PAGES {
            if self.ctx.stop.is_stopped() {
                self.sink.log_line("Stop requested, ending listing traversal");
                break;
            }

            let url = urls::page_url(&self.ctx.url, page_no);
            self.sink.log_line(&format!("Loading listing page {}: {}", page_no, url));

            page.goto(&url, self.ctx.timings.navigation_timeout)
                .await
                .with_context(|| format!("failed to load listing page {}", url))?;
            pause(self.ctx.timings.page_load_wait()).await;

            self.scroll_until_stable(page).await?;

            let html = page.content().await?;
            let scan = self.parser.scan_listing(&html);
            debug!(
                "Page {}: strategy {:?}, {} card links, {} total",
                page_no,
                scan.strategy,
                scan.card_links,
                scan.links.len()
            );

            let fresh: Vec<String> =
                scan.links.into_iter().filter(|l| seen.insert(l.clone())).collect();
            self.sink.log_line(&format!("Page {}: {} product links found", page_no, fresh.len()));

            if fresh.is_empty() {
                self.sink.log_line(&format!("No new products on page {}, stopping", page_no));
                break;
            }

            links.extend(fresh);
            if links.len() >= max_items {
                break;
            }
        }

        links.truncate(max_items);
        info!("Collected {} product links", links.len());
        self.sink.log_line(&format!("Collected {} product links", links.len()));
        Ok(links)
    }

    /// Scrolls until the document height stops growing.
    ///
    /// Returns the number of scroll iterations performed.
    pub(crate) async fn scroll_until_stable(&self, page: &mut dyn BrowserPage) -> Result<usize> {
        let timings = &self.ctx.timings;
        let mut previous: Option<u64> = None;
        let mut iterations = 0;

        for i in 0..MAX_SCROLLS {
            iterations = i + 1;
            page.scroll_to_bottom().await?;
            pause(timings.settle).await;

            let height = page.document_height().await?;
            let cards = self.parser.card_count(&page.content().await?);
            self.sink.log_line(&format!(
                "Scroll {}/{}: height {}px, {} products loaded",
                iterations, MAX_SCROLLS, height, cards
            ));

            if previous == Some(height) {
                debug!("Height stable at {}px after {} scrolls", height, iterations);
                break;
            }
            previous = Some(height);

            if iterations % NUDGE_EVERY == 0 {
                page.scroll_by(-NUDGE_PX).await?;
                pause(timings.nudge).await;
                page.scroll_to_bottom().await?;
                pause(timings.nudge).await;
            }
        }

        Ok(iterations)
    }
}
