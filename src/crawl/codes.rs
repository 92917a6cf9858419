//! Seller codes and image file names.
//!
//! A template such as `20250305-W001` splits into a date part (`20250305`),
//! a letter prefix (`W`) and a starting sequence number (`1`). Product `i`
//! in traversal order gets `20250305-W{start + i:03}` and its images are
//! named `W{start + i:03}-{1,2,3}.jpg`.

use crate::site::models::IMAGE_SLOTS;
use crate::site::ProductRecord;
use chrono::Local;
use tracing::warn;

const DEFAULT_LETTERS: &str = "W";
const DEFAULT_START: u64 = 1;

/// Parsed seller code template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTemplate {
    raw: String,
    date: String,
    letters: String,
    start: u64,
}

impl CodeTemplate {
    /// Parses `<date>-<letters><digits>`, filling whatever is missing with
    /// today's date, `W` and `1`.
    pub fn parse(template: &str) -> Self {
        let template = template.trim();
        let (date, suffix) = match template.split_once('-') {
            Some((date, suffix)) => (date.trim(), suffix.trim()),
            None if template.chars().all(|c| c.is_ascii_digit()) => (template, ""),
            None => ("", template),
        };

        let date = if date.is_empty() { today() } else { date.to_string() };

        let letters: String = suffix.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
        let letters = if letters.is_empty() { DEFAULT_LETTERS.to_string() } else { letters };

        let digits: String = suffix.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
        let digits: String = digits.chars().rev().collect();
        let start = match digits.parse() {
            Ok(start) => start,
            Err(_) if digits.is_empty() => DEFAULT_START,
            Err(e) => {
                warn!(
                    "Sequence {} in code template {} is unusable ({}), starting at 1",
                    digits, template, e
                );
                DEFAULT_START
            }
        };

        Self { raw: template.to_string(), date, letters, start }
    }

    /// Suffix for the product at zero-based traversal index `index`, e.g. `W001`.
    pub fn suffix_for(&self, index: usize) -> String {
        let seq = self.start.saturating_add(index as u64);
        format!("{}{:03}", self.letters, seq)
    }

    /// Seller code for the product at `index`.
    pub fn code_for(&self, index: usize) -> String {
        format!("{}-{}", self.date, self.suffix_for(index))
    }

    /// The template as the user wrote it, used for single-product runs.
    ///
    /// A template missing its date or suffix (`""`, `20250305-`, `W007`) is
    /// rendered as the first code instead.
    pub fn verbatim(&self) -> String {
        match self.raw.split_once('-') {
            Some((date, suffix)) if !date.trim().is_empty() && !suffix.trim().is_empty() => {
                self.raw.clone()
            }
            _ => self.code_for(0),
        }
    }
}

/// Image file name for slot `slot` (1-based) of a seller code.
///
/// The part after the first `-` is used, so `20250305-W001` gives `W001-1.jpg`.
pub fn image_filename(seller_code: &str, slot: usize) -> String {
    let suffix = seller_code.split_once('-').map(|(_, s)| s).unwrap_or(seller_code);
    format!("{}-{}.jpg", suffix, slot)
}

/// Stamps seller codes onto records in traversal order.
///
/// When `with_filenames` is set, each slot that has an image URL also gets a
/// file name; slots without a URL keep no file name.
pub fn assign_codes(records: &mut [ProductRecord], template: &CodeTemplate, with_filenames: bool) {
    for (index, record) in records.iter_mut().enumerate() {
        let code = template.code_for(index);
        stamp(record, code, with_filenames);
    }
}

/// Single-product variant: the template is used as-is, without incrementing.
pub fn assign_single(record: &mut ProductRecord, template: &CodeTemplate, with_filenames: bool) {
    stamp(record, template.verbatim(), with_filenames);
}

fn stamp(record: &mut ProductRecord, code: String, with_filenames: bool) {
    if with_filenames {
        for slot in 0..IMAGE_SLOTS {
            let name = record.image_urls.get(slot).map(|_| image_filename(&code, slot + 1));
            record.image_filenames.set(slot, name);
        }
    }
    record.seller_code = Some(code);
}

fn today() -> String {
    Local::now().format("%Y%m%d").to_string()
}
