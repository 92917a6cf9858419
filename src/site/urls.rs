//! URL helpers for listing and detail pages.

use super::{DETAIL_MARKER, IMAGE_CDN_BASE};
use url::Url;

/// Image views published for every product on the CDN, in slot order.
pub const IMAGE_VIEWS: [&str; 3] = ["front", "back", "right"];

/// Returns true if the URL points at a product detail page.
pub fn is_detail_url(url: &str) -> bool {
    url.contains(DETAIL_MARKER)
}

/// Extracts the numeric product identifier from a detail URL.
///
/// Detail URLs look like `/p/<slug>/<upc>` or `/p/<upc>`; the identifier is the
/// last path segment after the marker, and only counts when it is all digits.
pub fn product_id(url: &str) -> Option<String> {
    let start = url.find(DETAIL_MARKER)? + DETAIL_MARKER.len();
    let path = &url[start..];
    let path = path.split(['?', '#']).next().unwrap_or(path);

    let last = path.split('/').filter(|s| !s.is_empty()).next_back()?;
    if last.chars().all(|c| c.is_ascii_digit()) { Some(last.to_string()) } else { None }
}

/// Builds the front/back/right CDN URLs for a product identifier.
pub fn cdn_image_urls(id: &str) -> Vec<String> {
    IMAGE_VIEWS.iter().map(|view| format!("{}/{}/{}", IMAGE_CDN_BASE, view, id)).collect()
}

/// Resolves an href against the site origin.
///
/// Absolute hrefs pass through untouched; anything that cannot be joined
/// is dropped.
pub fn absolutize(origin: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }

    let base = Url::parse(origin).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}

/// Returns the listing URL for a given page number.
///
/// Page 1 is the URL as given. Later pages replace an existing `page` query
/// parameter or append one.
pub fn page_url(listing_url: &str, page: u32) -> String {
    if page <= 1 {
        return listing_url.to_string();
    }

    let Ok(mut url) = Url::parse(listing_url) else {
        let sep = if listing_url.contains('?') { '&' } else { '?' };
        return format!("{}{}page={}", listing_url, sep, page);
    };

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (k, v) in &pairs {
            query.append_pair(k, v);
        }
        query.append_pair("page", &page.to_string());
    }

    url.to_string()
}
