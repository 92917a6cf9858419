//! HTML parser for Fred Meyer listing and detail pages.
//!
//! The browser hands over a rendered HTML snapshot; everything here is
//! synchronous so the parsed document never lives across an await point.

use crate::crawl::sink::ProgressSink;
use crate::site::models::{ImageSlots, ProductRecord, IMAGE_SLOTS};
use crate::site::selectors::{detail, listing};
use crate::site::{urls, DETAIL_MARKER, DUMMY_IMAGE_URL, IMAGE_HOST_MARKER};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, trace};

/// Minimum matches for a card selector to be trusted.
pub const MIN_CARD_MATCHES: usize = 5;

/// Below this many card links, the whole page is re-scanned for detail links.
pub const LINK_FALLBACK_THRESHOLD: usize = 10;

/// A rendered detail page handed to image strategies.
pub struct DetailPage<'a> {
    pub url: &'a str,
    pub document: &'a Html,
}

/// An image strategy returns up to three URLs, or nothing.
pub type ImageStrategy = fn(&DetailPage<'_>) -> Vec<String>;

/// Image strategies in the order they are tried. The first non-empty result wins.
pub const IMAGE_STRATEGIES: &[(&str, ImageStrategy)] = &[
    ("cdn pattern", cdn_pattern_images),
    ("zoom gallery", zoom_gallery_images),
    ("xlarge images", xlarge_images),
    ("upscaled images", upscaled_images),
];

/// Card selectors in the order they are tried.
static CARD_STRATEGIES: [(&str, &LazyLock<Selector>); 3] = [
    ("product card", &listing::PRODUCT_CARD),
    ("detail link", &listing::DETAIL_LINK),
    ("generic card", &listing::GENERIC_CARD),
];

/// Links harvested from one listing snapshot.
#[derive(Debug, Clone, Default)]
pub struct ListingScan {
    /// Card strategy that reached the match threshold, if any
    pub strategy: Option<&'static str>,
    /// Links found through cards before the full-page fallback
    pub card_links: usize,
    /// De-duplicated absolute detail URLs in document order
    pub links: Vec<String>,
}

/// Parser for Fred Meyer HTML pages.
pub struct Parser {
    origin: String,
}

impl Parser {
    /// Creates a parser that resolves relative links against `origin`.
    pub fn new(origin: impl Into<String>) -> Self {
        Self { origin: origin.into() }
    }

    /// Extracts name, price and three image URLs from a detail page.
    pub fn parse_detail(&self, url: &str, html: &str, sink: &dyn ProgressSink) -> ProductRecord {
        let document = Html::parse_document(html);
        let mut record = ProductRecord::new(url);

        if let Some(name) = first_text(&document, &detail::NAME_PRIMARY)
            .or_else(|| first_text(&document, &detail::NAME_FALLBACK))
        {
            record.name = name;
        }

        if let Some(price) = first_text(&document, &detail::PRICE) {
            record.numeric_price = numeric_price(&price);
        }

        let page = DetailPage { url, document: &document };
        let mut images = Vec::new();
        for (name, strategy) in IMAGE_STRATEGIES {
            images = strategy(&page);
            if !images.is_empty() {
                debug!("Images for {} via {} ({})", url, name, images.len());
                break;
            }
            trace!("Image strategy {} found nothing for {}", name, url);
        }

        if images.is_empty() {
            sink.log_line(&format!("No images found, using placeholder image: {}", url));
            images = vec![DUMMY_IMAGE_URL.to_string(); IMAGE_SLOTS];
        }

        pad_images(&mut images, sink);
        record.image_urls = ImageSlots::from_list(images);
        record
    }

    /// Counts product cards currently rendered (first card selector only).
    pub fn card_count(&self, html: &str) -> usize {
        let document = Html::parse_document(html);
        document.select(&listing::PRODUCT_CARD).count()
    }

    /// Harvests detail links from a listing snapshot.
    pub fn scan_listing(&self, html: &str) -> ListingScan {
        let document = Html::parse_document(html);
        let mut scan = ListingScan::default();
        let mut seen = HashSet::new();

        if let Some((strategy, cards)) = discover_cards(&document) {
            scan.strategy = Some(strategy);
            for card in cards {
                for href in card_hrefs(card) {
                    self.push_link(href, &mut seen, &mut scan.links);
                }
            }
        }
        scan.card_links = scan.links.len();

        if scan.card_links < LINK_FALLBACK_THRESHOLD {
            for anchor in document.select(&listing::DETAIL_LINK) {
                if let Some(href) = anchor.value().attr("href") {
                    self.push_link(href, &mut seen, &mut scan.links);
                }
            }
        }

        scan
    }

    fn push_link(&self, href: &str, seen: &mut HashSet<String>, links: &mut Vec<String>) {
        if !href.contains(DETAIL_MARKER) {
            return;
        }
        if let Some(link) = urls::absolutize(&self.origin, href) {
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }
    }
}

/// Keeps digits and `.` only.
pub fn numeric_price(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect()
}

/// Pads a non-empty image list to three entries by repeating the first.
fn pad_images(images: &mut Vec<String>, sink: &dyn ProgressSink) {
    images.truncate(IMAGE_SLOTS);
    let Some(first) = images.first().cloned() else {
        return;
    };
    while images.len() < IMAGE_SLOTS {
        sink.log_line(&format!("Image {} missing, reusing image 1", images.len() + 1));
        images.push(first.clone());
    }
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(|e| e.text().collect::<String>().trim().to_string())
        .find(|t| !t.is_empty())
}

fn discover_cards<'a>(document: &'a Html) -> Option<(&'static str, Vec<ElementRef<'a>>)> {
    CARD_STRATEGIES.iter().find_map(|(name, selector)| {
        let cards: Vec<_> = document.select(selector).collect();
        trace!("Card strategy {} matched {}", name, cards.len());
        (cards.len() >= MIN_CARD_MATCHES).then_some((*name, cards))
    })
}

fn card_hrefs(card: ElementRef<'_>) -> Vec<&str> {
    if card.value().name() == "a" {
        return card.value().attr("href").into_iter().collect();
    }
    card.select(&listing::DETAIL_LINK).filter_map(|a| a.value().attr("href")).collect()
}

/// Collects up to three distinct `src` values passing `keep`, mapped by `map`.
fn collect_srcs<'a>(
    elements: impl Iterator<Item = ElementRef<'a>>,
    keep: impl Fn(&str) -> bool,
    map: impl Fn(&str) -> String,
) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for src in elements.filter_map(|e| e.value().attr("src")).map(str::trim) {
        if src.is_empty() || !keep(src) {
            continue;
        }
        let url = map(src);
        if !out.contains(&url) {
            out.push(url);
        }
        if out.len() == IMAGE_SLOTS {
            break;
        }
    }
    out
}

/// Front/back/right CDN URLs built from the product id in the URL.
fn cdn_pattern_images(page: &DetailPage<'_>) -> Vec<String> {
    urls::product_id(page.url).map(|id| urls::cdn_image_urls(&id)).unwrap_or_default()
}

/// `src` of the zoomable gallery images.
fn zoom_gallery_images(page: &DetailPage<'_>) -> Vec<String> {
    collect_srcs(page.document.select(&detail::ZOOM_IMAGE), |_| true, str::to_string)
}

/// CDN images already served at xlarge size.
fn xlarge_images(page: &DetailPage<'_>) -> Vec<String> {
    collect_srcs(
        page.document.select(&detail::ANY_IMAGE),
        |src| src.contains("xlarge") && src.contains(IMAGE_HOST_MARKER),
        str::to_string,
    )
}

/// Any CDN image, rewritten to the xlarge size.
fn upscaled_images(page: &DetailPage<'_>) -> Vec<String> {
    collect_srcs(
        page.document.select(&detail::ANY_IMAGE),
        |src| src.contains(IMAGE_HOST_MARKER),
        |src| {
            if src.contains("xlarge") {
                src.to_string()
            } else {
                src.replacen("large", "xlarge", 1)
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::sink::MemorySink;
    use crate::site::{NAME_UNAVAILABLE, ORIGIN};

    fn parser() -> Parser {
        Parser::new(ORIGIN)
    }

    fn detail_html(body: &str) -> String {
        format!("<html><body>{}</body></html>", body)
    }

    #[test]
    fn test_name_primary_then_fallback() {
        let sink = MemorySink::default();
        let html = detail_html(
            r#"<h1 class="ProductDetails-header">Kroger Milk</h1><h1>Other</h1>"#,
        );
        let record = parser().parse_detail("https://www.fredmeyer.com/p/milk/1", &html, &sink);
        assert_eq!(record.name, "Kroger Milk");

        let html = detail_html("<h1>  Plain Heading </h1>");
        let record = parser().parse_detail("https://www.fredmeyer.com/p/milk/1", &html, &sink);
        assert_eq!(record.name, "Plain Heading");

        let html = detail_html("<h2>No title here</h2>");
        let record = parser().parse_detail("https://www.fredmeyer.com/p/milk/1", &html, &sink);
        assert_eq!(record.name, NAME_UNAVAILABLE);
    }

    #[test]
    fn test_price_stripped() {
        let sink = MemorySink::default();
        let html = detail_html(r#"<data class="kds-Price" value="3.99">$3.99 /ea</data>"#);
        let record = parser().parse_detail("https://www.fredmeyer.com/p/milk/1", &html, &sink);
        assert_eq!(record.numeric_price, "3.99");

        let html = detail_html("<p>no price</p>");
        let record = parser().parse_detail("https://www.fredmeyer.com/p/milk/1", &html, &sink);
        assert_eq!(record.numeric_price, "");
    }

    #[test]
    fn test_numeric_price() {
        assert_eq!(numeric_price("$1,234.50"), "1234.50");
        assert_eq!(numeric_price("2 for $5"), "25");
        assert_eq!(numeric_price("N/A"), "");
    }

    #[test]
    fn test_cdn_pattern_wins_when_url_has_id() {
        let sink = MemorySink::default();
        let html = detail_html(r#"<img class="iiz__img" src="https://cdn.example/zoom.jpg">"#);
        let url = "https://www.fredmeyer.com/p/milk/0001111041700";
        let record = parser().parse_detail(url, &html, &sink);
        assert_eq!(
            record.image_urls.get(0),
            Some("https://www.kroger.com/product/images/xlarge/front/0001111041700")
        );
        assert_eq!(
            record.image_urls.get(2),
            Some("https://www.kroger.com/product/images/xlarge/right/0001111041700")
        );
    }

    #[test]
    fn test_zoom_gallery_used_without_id() {
        let sink = MemorySink::default();
        let html = detail_html(
            r#"<img class="iiz__img" src="https://cdn.example/a.jpg">
               <img class="iiz__img" src="https://cdn.example/b.jpg">"#,
        );
        let record = parser().parse_detail("https://www.fredmeyer.com/p/widget", &html, &sink);
        assert_eq!(record.image_urls.get(0), Some("https://cdn.example/a.jpg"));
        assert_eq!(record.image_urls.get(1), Some("https://cdn.example/b.jpg"));
        // Slot 3 padded from slot 1
        assert_eq!(record.image_urls.get(2), Some("https://cdn.example/a.jpg"));
        assert_eq!(sink.lines().len(), 1);
    }

    #[test]
    fn test_falls_through_to_xlarge_strategy() {
        let sink = MemorySink::default();
        let html = detail_html(
            r#"<img src="https://www.kroger.com/product/images/large/front/777">
               <img src="https://www.kroger.com/product/images/xlarge/front/777">
               <img src="https://www.kroger.com/product/images/xlarge/back/777">
               <img src="https://ads.example/xlarge/banner.jpg">"#,
        );
        let record = parser().parse_detail("https://www.fredmeyer.com/p/widget", &html, &sink);
        assert_eq!(
            record.image_urls.get(0),
            Some("https://www.kroger.com/product/images/xlarge/front/777")
        );
        assert_eq!(
            record.image_urls.get(1),
            Some("https://www.kroger.com/product/images/xlarge/back/777")
        );
        assert_eq!(
            record.image_urls.get(2),
            Some("https://www.kroger.com/product/images/xlarge/front/777")
        );
    }

    #[test]
    fn test_upscales_large_images() {
        let sink = MemorySink::default();
        let html = detail_html(
            r#"<img src="https://www.kroger.com/product/images/large/front/777">
               <img src="https://www.kroger.com/product/images/medium/back/777">"#,
        );
        let record = parser().parse_detail("https://www.fredmeyer.com/p/widget", &html, &sink);
        assert_eq!(
            record.image_urls.get(0),
            Some("https://www.kroger.com/product/images/xlarge/front/777")
        );
        assert_eq!(
            record.image_urls.get(1),
            Some("https://www.kroger.com/product/images/medium/back/777")
        );
    }

    #[test]
    fn test_dummy_images_when_nothing_found() {
        let sink = MemorySink::default();
        let html = detail_html(r#"<img src="https://ads.example/banner.jpg">"#);
        let record = parser().parse_detail("https://www.fredmeyer.com/p/widget", &html, &sink);
        for slot in record.image_urls.iter() {
            assert_eq!(slot, Some(DUMMY_IMAGE_URL));
        }
        assert!(sink.lines()[0].contains("placeholder"));
    }

    #[test]
    fn test_strategy_order() {
        let names: Vec<_> = IMAGE_STRATEGIES.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["cdn pattern", "zoom gallery", "xlarge images", "upscaled images"]);
    }

    fn cards_html(count: usize) -> String {
        let cards: String = (0..count)
            .map(|i| {
                format!(r#"<div class="ProductCard"><a href="/p/item-{i}/{i:05}">Item</a></div>"#)
            })
            .collect();
        format!("<html><body>{}</body></html>", cards)
    }

    #[test]
    fn test_scan_listing_product_cards() {
        let scan = parser().scan_listing(&cards_html(12));
        assert_eq!(scan.strategy, Some("product card"));
        assert_eq!(scan.card_links, 12);
        assert_eq!(scan.links.len(), 12);
        assert_eq!(scan.links[0], "https://www.fredmeyer.com/p/item-0/00000");
    }

    #[test]
    fn test_scan_listing_falls_back_to_links() {
        // Only 3 product cards, but 6 detail anchors: the anchor strategy wins
        let html = r#"<html><body>
            <div class="ProductCard"><a href="/p/a/1">A</a></div>
            <div class="ProductCard"><a href="/p/b/2">B</a></div>
            <div class="ProductCard"><a href="/p/c/3">C</a></div>
            <a href="/p/d/4">D</a><a href="/p/e/5">E</a><a href="/p/f/6">F</a>
            <a href="/pl/dairy/7">Category</a>
        </body></html>"#;
        let scan = parser().scan_listing(html);
        assert_eq!(scan.strategy, Some("detail link"));
        assert_eq!(scan.links.len(), 6);
        assert!(scan.links.iter().all(|l| l.contains("/p/")));
    }

    #[test]
    fn test_scan_listing_dedupes() {
        let html = r#"<html><body>
            <a href="/p/a/1">A</a><a href="/p/a/1">A again</a>
            <a href="https://www.fredmeyer.com/p/a/1">A absolute</a>
            <a href="/p/b/2">B</a>
        </body></html>"#;
        let scan = parser().scan_listing(html);
        assert_eq!(scan.strategy, None);
        assert_eq!(scan.card_links, 0);
        assert_eq!(
            scan.links,
            vec!["https://www.fredmeyer.com/p/a/1", "https://www.fredmeyer.com/p/b/2"]
        );
    }

    #[test]
    fn test_card_count() {
        assert_eq!(parser().card_count(&cards_html(7)), 7);
        assert_eq!(parser().card_count("<html></html>"), 0);
    }
}
