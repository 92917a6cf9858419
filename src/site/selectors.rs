//! CSS selectors for Fred Meyer HTML parsing.
//!
//! This file contains all CSS selectors used for parsing listing and
//! detail pages. Update this file when the site changes its markup.
//!
//! **Update process**: When parsing fails, capture an HTML sample,
//! update selectors, and add a test fixture.

use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for product detail pages.
pub mod detail {
    use super::*;

    /// Primary product title.
    pub static NAME_PRIMARY: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("h1.ProductDetails-header").unwrap());

    /// Fallback product title.
    pub static NAME_FALLBACK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());

    /// Price element (text like "$3.99").
    pub static PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("data.kds-Price").unwrap());

    /// Zoomable gallery images.
    pub static ZOOM_IMAGE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("img.iiz__img").unwrap());

    /// Every image on the page.
    pub static ANY_IMAGE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("img[src]").unwrap());
}

/// Selectors for listing (search / category) pages.
pub mod listing {
    use super::*;

    /// Product card container.
    pub static PRODUCT_CARD: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".ProductCard").unwrap());

    /// Any link to a detail page.
    pub static DETAIL_LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("a[href*='/p/']").unwrap());

    /// Generic design-system card.
    pub static GENERIC_CARD: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".kds-Card").unwrap());
}
