//! Per-run context, request and outcome types.

use super::codes::CodeTemplate;
use crate::config::Config;
use crate::site::{ProductRecord, SITE_NAME};
use chrono::Local;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Invocation parameters, as received from the CLI or the HTTP relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlRequest {
    /// Listing URL or a single detail URL
    pub url: String,
    #[serde(default)]
    pub max_items: Option<usize>,
    #[serde(default)]
    pub download_images: Option<bool>,
    #[serde(default)]
    pub product_code: Option<String>,
}

impl CrawlRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), max_items: None, download_images: None, product_code: None }
    }
}

/// Final result of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlOutcome {
    /// Spreadsheet path relative to the working directory, if it was written
    pub file_path: Option<String>,
    /// Number of products exported
    pub count: usize,
    /// The exported records, for library callers
    #[serde(skip)]
    pub products: Vec<ProductRecord>,
}

/// Waits used between browser steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// After each scroll on a listing page
    pub settle: Duration,
    /// Between the up and down halves of a scroll nudge
    pub nudge: Duration,
    /// After each navigation
    pub page_load: Duration,
    /// Random extra wait on top of `page_load` (upper bound)
    pub page_load_jitter: Duration,
    /// Navigation timeout
    pub navigation_timeout: Duration,
}

impl Timings {
    pub fn from_config(config: &Config) -> Self {
        let settle = Duration::from_millis(config.settle_ms);
        Self {
            settle,
            nudge: settle.min(Duration::from_secs(1)),
            page_load: Duration::from_millis(config.page_load_ms),
            page_load_jitter: Duration::from_millis(config.page_load_jitter_ms),
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
        }
    }

    /// No waiting at all; navigation timeout kept at 30s.
    pub fn immediate() -> Self {
        Self {
            settle: Duration::ZERO,
            nudge: Duration::ZERO,
            page_load: Duration::ZERO,
            page_load_jitter: Duration::ZERO,
            navigation_timeout: Duration::from_secs(30),
        }
    }

    /// Page load wait with jitter applied.
    pub fn page_load_wait(&self) -> Duration {
        let jitter_ms = self.page_load_jitter.as_millis() as u64;
        let jitter = if jitter_ms > 0 { rand::rng().random_range(0..=jitter_ms) } else { 0 };
        self.page_load + Duration::from_millis(jitter)
    }
}

/// Sleeps unless the duration is zero.
pub async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// Cooperative stop flag. Checked before the next page, product or image is
/// started; work already in flight always finishes.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a run needs, fixed at start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub url: String,
    pub max_items: usize,
    pub download_images: bool,
    pub template: CodeTemplate,
    pub origin: String,
    pub output_root: PathBuf,
    /// Run timestamp, `%Y%m%d_%H%M%S`; namespaces every output path
    pub timestamp: String,
    pub timings: Timings,
    pub image_base_url: String,
    pub banner_image_url: String,
    pub stop: StopSignal,
}

impl RunContext {
    /// Builds the context for one request, stamping the current local time.
    pub fn new(config: &Config, request: &CrawlRequest) -> Self {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        Self::with_timestamp(config, request, timestamp)
    }

    pub fn with_timestamp(
        config: &Config,
        request: &CrawlRequest,
        timestamp: impl Into<String>,
    ) -> Self {
        let max_items = Config::clamp_max_items(request.max_items.unwrap_or(config.max_items));
        let code = request.product_code.as_deref().unwrap_or(&config.product_code);

        Self {
            url: request.url.trim().to_string(),
            max_items,
            download_images: request.download_images.unwrap_or(config.download_images),
            template: CodeTemplate::parse(code),
            origin: config.origin.clone(),
            output_root: config.output_root.clone(),
            timestamp: timestamp.into(),
            timings: Timings::from_config(config),
            image_base_url: config.image_base_url.clone(),
            banner_image_url: config.banner_image_url.clone(),
            stop: StopSignal::new(),
        }
    }

    /// Replaces the timings (tests use [`Timings::immediate`]).
    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// `<root>/fredmeyer_products_<timestamp>.xlsx`
    pub fn spreadsheet_path(&self) -> PathBuf {
        self.output_root.join(format!("{}_products_{}.xlsx", SITE_NAME, self.timestamp))
    }

    /// `<root>/images_<timestamp>`
    pub fn images_dir(&self) -> PathBuf {
        self.output_root.join(format!("images_{}", self.timestamp))
    }
}
