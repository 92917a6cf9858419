//! One crawl run from the command line.

use crate::browser::{ChromiumRenderer, Renderer};
use crate::config::Config;
use crate::crawl::{run_crawl, ConsoleSink, CrawlOutcome, CrawlRequest, ProgressSink, RunContext};
use crate::images::{HttpImageFetcher, ImageFetcher};
use anyhow::{bail, Context, Result};
use tracing::info;
use url::Url;

/// Executes a crawl and formats the outcome.
pub struct CrawlCommand {
    config: Config,
}

impl CrawlCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Crawls with Chromium and the HTTP image fetcher, printing progress to stderr.
    pub async fn execute(&self, request: CrawlRequest, json: bool) -> Result<String> {
        let renderer =
            ChromiumRenderer::new(self.config.chromium_path.clone(), self.config.headless);
        let fetcher = HttpImageFetcher::new()?;
        let ctx = RunContext::new(&self.config, &request);

        let outcome = self.execute_with(&ctx, &renderer, &fetcher, &ConsoleSink).await?;
        format_outcome(&outcome, json)
    }

    /// Crawls with the provided collaborators (for testing).
    pub async fn execute_with(
        &self,
        ctx: &RunContext,
        renderer: &dyn Renderer,
        fetcher: &dyn ImageFetcher,
        sink: &dyn ProgressSink,
    ) -> Result<CrawlOutcome> {
        validate_url(&ctx.url)?;
        info!("Crawling {} into {}", ctx.url, ctx.output_root.display());
        run_crawl(ctx, renderer, fetcher, sink).await
    }
}

/// Accepts absolute http(s) URLs only.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url).with_context(|| format!("Invalid URL: '{}'", url))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("Invalid URL: '{}'. Only http and https are supported.", url);
    }
    Ok(())
}

/// JSON (`{"filePath":..,"count":..}`) or a one-line summary.
pub fn format_outcome(outcome: &CrawlOutcome, json: bool) -> Result<String> {
    if json {
        return serde_json::to_string_pretty(outcome).context("Failed to serialize outcome");
    }
    Ok(match &outcome.file_path {
        Some(path) => format!("Crawled {} products -> {}", outcome.count, path),
        None => format!("Crawled {} products, but no spreadsheet was written", outcome.count),
    })
}
