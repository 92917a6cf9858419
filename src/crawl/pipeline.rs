//! Orchestrates one crawl run: traverse, extract, assign, download, export.

use super::codes::{assign_codes, assign_single};
use super::context::{CrawlOutcome, RunContext, StopSignal};
use super::detail::{DetailExtractor, Position};
use super::sink::{scaled_progress, ProgressSink};
use super::traverse::ListingTraverser;
use crate::browser::Renderer;
use crate::export::{self, ImageHosting};
use crate::images::{self, ImageFetcher};
use crate::site::models::IMAGE_SLOTS;
use crate::site::{urls, ProductRecord};
use anyhow::Result;
use std::path::Path;
use tracing::{debug, info, warn};

pub const PROGRESS_LISTED: u8 = 10;
pub const PROGRESS_EXTRACTED: u8 = 60;
pub const PROGRESS_IMAGES: u8 = 95;
pub const PROGRESS_DONE: u8 = 100;

/// Runs a full crawl.
///
/// Only listing-level failures are returned as errors. Per-product,
/// per-image and export failures are logged to `sink` and the run carries on.
pub async fn run_crawl(
    ctx: &RunContext,
    renderer: &dyn Renderer,
    fetcher: &dyn ImageFetcher,
    sink: &dyn ProgressSink,
) -> Result<CrawlOutcome> {
    info!("Starting crawl of {} (max {} items)", ctx.url, ctx.max_items);
    sink.log_line(&format!("Starting crawl: {}", ctx.url));
    sink.report_progress(0);

    let mut records = if urls::is_detail_url(&ctx.url) {
        crawl_single(ctx, renderer, sink).await
    } else {
        crawl_listing(ctx, renderer, sink).await?
    };
    sink.report_progress(PROGRESS_EXTRACTED);
    sink.log_line(&format!("Extracted {} products", records.len()));

    if ctx.download_images && !records.is_empty() {
        acquire_images(&mut records, ctx, fetcher, sink).await;
    }
    sink.report_progress(PROGRESS_IMAGES);

    let hosting = ImageHosting { base_url: &ctx.image_base_url, banner_url: &ctx.banner_image_url };
    let file_path = export::export(&records, &hosting, &ctx.spreadsheet_path(), sink);
    sink.report_progress(PROGRESS_DONE);

    info!("Crawl finished: {} products, file {:?}", records.len(), file_path);
    Ok(CrawlOutcome { file_path, count: records.len(), products: records })
}

/// Detail URL given directly: no traversal, template code used verbatim.
async fn crawl_single(
    ctx: &RunContext,
    renderer: &dyn Renderer,
    sink: &dyn ProgressSink,
) -> Vec<ProductRecord> {
    sink.log_line("Single product URL detected, skipping listing traversal");
    sink.report_progress(PROGRESS_LISTED);

    let extractor = DetailExtractor::new(renderer, ctx, sink);
    match extractor.extract(&ctx.url, None).await {
        Some(mut record) => {
            assign_single(&mut record, &ctx.template, ctx.download_images);
            vec![record]
        }
        None => Vec::new(),
    }
}

async fn crawl_listing(
    ctx: &RunContext,
    renderer: &dyn Renderer,
    sink: &dyn ProgressSink,
) -> Result<Vec<ProductRecord>> {
    let links = ListingTraverser::new(renderer, ctx, sink).collect_links().await?;
    sink.report_progress(PROGRESS_LISTED);

    let extractor = DetailExtractor::new(renderer, ctx, sink);
    let total = links.len();
    let mut records = Vec::with_capacity(total);

    for (index, link) in links.iter().enumerate() {
        if ctx.stop.is_stopped() {
            let remaining = total - index;
            sink.log_line(&format!("Stop requested, skipping remaining {remaining} products"));
            break;
        }
        if let Some(record) = extractor.extract(link, Some(Position { index, total })).await {
            records.push(record);
        }
        let percent = scaled_progress(PROGRESS_LISTED, PROGRESS_EXTRACTED, index + 1, total);
        sink.report_progress(percent);
    }

    assign_codes(&mut records, &ctx.template, ctx.download_images);
    Ok(records)
}

/// Downloads and normalizes every named image slot, one at a time.
async fn acquire_images(
    records: &mut [ProductRecord],
    ctx: &RunContext,
    fetcher: &dyn ImageFetcher,
    sink: &dyn ProgressSink,
) {
    let dir = ctx.images_dir();
    if let Err(e) = tokio::fs::create_dir_all(&dir).await {
        warn!("Cannot create image directory {}: {}", dir.display(), e);
        sink.log_line(&format!("Image download skipped, cannot create {}: {}", dir.display(), e));
        records.iter_mut().for_each(|record| clear_filenames(record, 0));
        return;
    }
    sink.log_line(&format!("Downloading images to {}", dir.display()));

    let total = records.len();
    for index in 0..total {
        if ctx.stop.is_stopped() {
            sink.log_line("Stop requested, skipping remaining images");
            records[index..].iter_mut().for_each(|record| clear_filenames(record, 0));
            break;
        }
        acquire_record_images(&mut records[index], &dir, fetcher, &ctx.stop, sink).await;
        let percent = scaled_progress(PROGRESS_EXTRACTED, PROGRESS_IMAGES, index + 1, total);
        sink.report_progress(percent);
    }
}

/// Fetches each slot; a failed slot after the first reuses the first slot's
/// file, otherwise its file name is cleared. Once `stop` is set, the slots
/// not yet fetched lose their file names.
async fn acquire_record_images(
    record: &mut ProductRecord,
    dir: &Path,
    fetcher: &dyn ImageFetcher,
    stop: &StopSignal,
    sink: &dyn ProgressSink,
) {
    let mut first_file = None;

    for slot in 0..IMAGE_SLOTS {
        let Some(filename) = record.image_filenames.get(slot).map(str::to_string) else {
            continue;
        };
        if stop.is_stopped() {
            debug!("Stop requested, skipping {} and later images", filename);
            clear_filenames(record, slot);
            return;
        }
        let Some(url) = record.image_urls.get(slot).map(str::to_string) else {
            record.image_filenames.set(slot, None);
            continue;
        };
        let dest = dir.join(&filename);

        match fetcher.fetch_to(&url, &dest).await {
            Ok(bytes) => {
                debug!("Downloaded {} ({} bytes)", filename, bytes);
                match images::normalize(&dest).await {
                    Ok(size) => {
                        sink.log_line(&format!("Saved image {filename} ({} KB)", size / 1024));
                    }
                    Err(e) => {
                        warn!("Normalization failed for {}: {}", filename, e);
                        sink.log_line(&format!(
                            "Image processing failed for {filename}, keeping original: {e}"
                        ));
                    }
                }
                if slot == 0 {
                    first_file = Some(dest);
                }
            }
            Err(e) => {
                warn!("Download failed for {}: {}", url, e);
                sink.log_line(&format!("Image download failed for {}: {}", filename, e));

                match &first_file {
                    Some(first) if slot > 0 => match tokio::fs::copy(first, &dest).await {
                        Ok(_) => sink.log_line(&format!("Copied image 1 to {}", filename)),
                        Err(copy_err) => {
                            warn!("Copy to {} failed: {}", dest.display(), copy_err);
                            record.image_filenames.set(slot, None);
                        }
                    },
                    _ => record.image_filenames.set(slot, None),
                }
            }
        }
    }
}

/// Clears the file names of slot `from` and every later slot.
fn clear_filenames(record: &mut ProductRecord, from: usize) {
    for slot in from..IMAGE_SLOTS {
        record.image_filenames.set(slot, None);
    }
}
