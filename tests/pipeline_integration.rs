//! End-to-end crawl runs against a scripted browser and a local image server.

use anyhow::{bail, Result};
use async_trait::async_trait;
use fredmeyer_crawler::browser::{BrowserPage, Renderer};
use fredmeyer_crawler::config::Config;
use fredmeyer_crawler::crawl::sink::MemorySink;
use fredmeyer_crawler::crawl::{run_crawl, CrawlRequest, RunContext, Timings};
use fredmeyer_crawler::images::HttpImageFetcher;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Canned pages keyed by URL; every page reports a fixed height.
#[derive(Clone, Default)]
struct ScriptedRenderer {
    pages: Arc<HashMap<String, String>>,
    open: Arc<AtomicUsize>,
    launched: Arc<AtomicUsize>,
}

impl ScriptedRenderer {
    fn new(pages: Vec<(String, String)>) -> Self {
        Self { pages: Arc::new(pages.into_iter().collect()), ..Default::default() }
    }

    fn open_browsers(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn open(&self) -> Result<Box<dyn BrowserPage>> {
        self.open.fetch_add(1, Ordering::SeqCst);
        self.launched.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedPage { renderer: self.clone(), html: String::new() }))
    }
}

struct ScriptedPage {
    renderer: ScriptedRenderer,
    html: String,
}

#[async_trait]
impl BrowserPage for ScriptedPage {
    async fn goto(&mut self, url: &str, _timeout: Duration) -> Result<()> {
        match self.renderer.pages.get(url) {
            Some(html) => {
                self.html = html.clone();
                Ok(())
            }
            None => bail!("navigation to {url} timed out after 30s"),
        }
    }

    async fn content(&self) -> Result<String> {
        Ok(self.html.clone())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        Ok(())
    }

    async fn scroll_by(&self, _dy: i64) -> Result<()> {
        Ok(())
    }

    async fn document_height(&self) -> Result<u64> {
        Ok(2400)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.renderer.open.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

fn context(root: &Path, request: &CrawlRequest) -> RunContext {
    let mut config = Config::default();
    config.output_root = root.to_path_buf();
    RunContext::with_timestamp(&config, request, "20250305_101010")
        .with_timings(Timings::immediate())
}

fn detail_page(name: &str, price: &str, images: &[String]) -> String {
    let imgs: String =
        images.iter().map(|src| format!(r#"<img class="iiz__img" src="{src}">"#)).collect();
    format!(
        r#"<html><body><h1 class="ProductDetails-header">{}</h1><data class="kds-Price">{}</data>{}</body></html>"#,
        name, price, imgs
    )
}

fn png_bytes() -> Vec<u8> {
    let mut out = Vec::new();
    image::RgbImage::from_pixel(64, 48, image::Rgb([30, 60, 90]))
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

#[tokio::test]
async fn test_single_product_without_image_download() {
    let root = TempDir::new().unwrap();
    let url = "https://site.example/p/12345";
    let page = detail_page("Widget", "$3.99", &[]);
    let renderer = ScriptedRenderer::new(vec![(url.to_string(), page)]);

    let mut request = CrawlRequest::new(url);
    request.max_items = Some(200);
    request.download_images = Some(false);
    request.product_code = Some("20250305-W001".into());
    let ctx = context(root.path(), &request);
    let sink = MemorySink::default();

    let fetcher = HttpImageFetcher::new().unwrap();
    let outcome = run_crawl(&ctx, &renderer, &fetcher, &sink).await.unwrap();

    assert_eq!(outcome.count, 1);
    let record = &outcome.products[0];
    assert_eq!(record.name, "Widget");
    assert_eq!(record.numeric_price, "3.99");
    assert_eq!(record.seller_code.as_deref(), Some("20250305-W001"));
    // Filenames are only assigned when images are downloaded
    assert!(record.image_filenames.iter().all(|f| f.is_none()));
    assert_eq!(record.image_filenames.get_or_empty(0), "");

    assert_eq!(renderer.launched(), 1);
    assert_eq!(renderer.open_browsers(), 0);
    assert!(outcome.file_path.is_some());
    assert!(ctx.spreadsheet_path().exists());
    assert!(!ctx.images_dir().exists());
}

#[tokio::test]
async fn test_listing_run_downloads_and_normalizes_images() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/img/\d+-(front|back)\.png$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/img/.*-right\.png$"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let listing = "https://www.fredmeyer.com/search?query=widgets";
    let cards: String = (1..=5)
        .map(|i| {
            format!(r#"<div class="ProductCard"><a href="/p/widget-{i}">Widget {i}</a></div>"#)
        })
        .collect();

    let mut pages = vec![
        (listing.to_string(), format!("<html><body>{}</body></html>", cards)),
        (format!("{}&page=2", listing), "<html><body></body></html>".to_string()),
    ];
    for i in 1..=5 {
        let images: Vec<String> = ["front", "back", "right"]
            .iter()
            .map(|v| format!("{}/img/{i}-{v}.png", server.uri()))
            .collect();
        pages.push((
            format!("https://www.fredmeyer.com/p/widget-{i}"),
            detail_page(&format!("Widget {i}"), "$1.00", &images),
        ));
    }
    let renderer = ScriptedRenderer::new(pages);

    let mut request = CrawlRequest::new(listing);
    request.max_items = Some(3);
    request.product_code = Some("20250305-W010".into());
    let root = TempDir::new().unwrap();
    let ctx = context(root.path(), &request);
    let sink = MemorySink::default();

    let fetcher = HttpImageFetcher::new().unwrap();
    let outcome = run_crawl(&ctx, &renderer, &fetcher, &sink).await.unwrap();

    // Capped at three products, numbered from the template
    assert_eq!(outcome.count, 3);
    let codes: Vec<_> = outcome.products.iter().map(|p| p.seller_code.clone().unwrap()).collect();
    assert_eq!(codes, vec!["20250305-W010", "20250305-W011", "20250305-W012"]);
    assert_eq!(renderer.open_browsers(), 0);
    assert_eq!(renderer.launched(), 4);

    let dir = ctx.images_dir();
    for code in ["W010", "W011", "W012"] {
        for slot in 1..=3 {
            let file = dir.join(format!("{code}-{slot}.jpg"));
            let img = image::open(&file).unwrap();
            assert_eq!((img.width(), img.height()), (1000, 1000), "{}", file.display());
        }
        // The missing right view is a copy of the front view
        assert_eq!(
            std::fs::read(dir.join(format!("{code}-3.jpg"))).unwrap(),
            std::fs::read(dir.join(format!("{code}-1.jpg"))).unwrap()
        );
    }
    assert!(!dir.join("W013-1.jpg").exists());
    assert_eq!(sink.progress().last(), Some(&100));
}

#[tokio::test]
async fn test_listing_failure_releases_browser() {
    let root = TempDir::new().unwrap();
    let renderer = ScriptedRenderer::new(vec![]);
    let request = CrawlRequest::new("https://www.fredmeyer.com/search?query=none");
    let ctx = context(root.path(), &request);
    let sink = MemorySink::default();

    let result = run_crawl(&ctx, &renderer, &HttpImageFetcher::new().unwrap(), &sink).await;

    assert!(result.is_err());
    assert_eq!(renderer.open_browsers(), 0);
    assert!(sink.last_line().unwrap().starts_with("Listing crawl failed"));
}
