//! The product record produced by the crawl.

use serde::{Deserialize, Serialize};

/// Name used when neither title selector matched.
pub const NAME_UNAVAILABLE: &str = "Name unavailable";

/// Number of image slots carried by every record.
pub const IMAGE_SLOTS: usize = 3;

/// Exactly three optional image values (URLs or file names).
///
/// `None` means "no image" for that slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSlots(pub [Option<String>; IMAGE_SLOTS]);

impl ImageSlots {
    /// Builds slots from up to three values; extra values are ignored.
    pub fn from_list(values: Vec<String>) -> Self {
        let mut slots: [Option<String>; IMAGE_SLOTS] = Default::default();
        for (slot, value) in slots.iter_mut().zip(values) {
            *slot = Some(value);
        }
        Self(slots)
    }

    /// Returns slot `idx` (0-based), if present.
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.0.get(idx).and_then(|s| s.as_deref())
    }

    pub fn set(&mut self, idx: usize, value: Option<String>) {
        if let Some(slot) = self.0.get_mut(idx) {
            *slot = value;
        }
    }

    /// Returns the slot value or an empty string.
    pub fn get_or_empty(&self, idx: usize) -> &str {
        self.get(idx).unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> {
        self.0.iter().map(|s| s.as_deref())
    }
}

/// One scraped product.
///
/// Created by the detail extractor, then annotated with a seller code and
/// image file names. Never mutated once export starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Detail page URL (unique within a run)
    pub detail_url: String,
    /// Product name, or [`NAME_UNAVAILABLE`]
    pub name: String,
    /// Price with everything but digits and `.` stripped; may be empty
    pub numeric_price: String,
    /// Image source URLs
    pub image_urls: ImageSlots,
    /// Seller code such as `20250305-W001`
    pub seller_code: Option<String>,
    /// Downloaded image file names such as `W001-1.jpg`
    pub image_filenames: ImageSlots,
}

impl ProductRecord {
    /// Creates an empty record for a detail URL.
    pub fn new(detail_url: impl Into<String>) -> Self {
        Self {
            detail_url: detail_url.into(),
            name: NAME_UNAVAILABLE.to_string(),
            numeric_price: String::new(),
            image_urls: ImageSlots::default(),
            seller_code: None,
            image_filenames: ImageSlots::default(),
        }
    }
}
