//! Row assembly and spreadsheet export.

pub mod xlsx;

use crate::crawl::sink::ProgressSink;
use crate::site::models::IMAGE_SLOTS;
use crate::site::{ImageSlots, ProductRecord};
use chrono::Local;
use std::path::Path;
use tracing::{info, warn};

/// Column headers, in output order.
pub const HEADERS: [&str; 13] = [
    "Seller Code",
    "Detail URL",
    "Name",
    "Price",
    "Image URL 1",
    "Image Filename 1",
    "Image URL 2",
    "Image Filename 2",
    "Image URL 3",
    "Image Filename 3",
    "Primary Image",
    "Additional Images",
    "HTML Description",
];

/// Number of entries in the additional images cell.
pub const ADDITIONAL_IMAGES: usize = 3;

/// One spreadsheet row. Every cell is a plain string; absent values are "".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub seller_code: String,
    pub detail_url: String,
    pub name: String,
    pub price: String,
    pub image_urls: [String; IMAGE_SLOTS],
    pub image_filenames: [String; IMAGE_SLOTS],
    pub primary_image: String,
    pub additional_images: String,
    pub html_description: String,
}

/// Where uploaded images will be hosted.
#[derive(Debug, Clone)]
pub struct ImageHosting<'a> {
    pub base_url: &'a str,
    pub banner_url: &'a str,
}

impl ExportRow {
    /// Derives the row for one record.
    pub fn assemble(record: &ProductRecord, hosting: &ImageHosting<'_>) -> Self {
        let partition = date_partition(record.seller_code.as_deref());
        let hosted: Vec<Option<String>> = record
            .image_filenames
            .iter()
            .map(|name| name.map(|n| hosted_url(hosting.base_url, &partition, n)))
            .collect();

        let primary = hosted[0].clone().unwrap_or_default();
        let slot_or_primary = |k: usize| hosted[k].clone().unwrap_or_else(|| primary.clone());

        let mut additional: Vec<String> = (1..IMAGE_SLOTS).map(slot_or_primary).collect();
        while additional.len() < ADDITIONAL_IMAGES {
            additional.push(primary.clone());
        }

        let gallery: Vec<String> = (0..IMAGE_SLOTS).map(slot_or_primary).collect();

        Self {
            seller_code: record.seller_code.clone().unwrap_or_default(),
            detail_url: record.detail_url.clone(),
            name: record.name.clone(),
            price: record.numeric_price.clone(),
            image_urls: slot_strings(&record.image_urls),
            image_filenames: slot_strings(&record.image_filenames),
            primary_image: primary,
            additional_images: additional.join("\n"),
            html_description: html_description(&gallery, hosting.banner_url),
        }
    }

    /// Cells in [`HEADERS`] order.
    pub fn cells(&self) -> [&str; 13] {
        [
            self.seller_code.as_str(),
            self.detail_url.as_str(),
            self.name.as_str(),
            self.price.as_str(),
            self.image_urls[0].as_str(),
            self.image_filenames[0].as_str(),
            self.image_urls[1].as_str(),
            self.image_filenames[1].as_str(),
            self.image_urls[2].as_str(),
            self.image_filenames[2].as_str(),
            self.primary_image.as_str(),
            self.additional_images.as_str(),
            self.html_description.as_str(),
        ]
    }
}

/// Date folder for hosted images: the seller code's date prefix when it is
/// eight digits, else today.
pub fn date_partition(seller_code: Option<&str>) -> String {
    seller_code
        .and_then(|code| code.split_once('-'))
        .map(|(date, _)| date)
        .filter(|date| date.len() == 8 && date.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .unwrap_or_else(|| Local::now().format("%Y%m%d").to_string())
}

/// `<base>/<partition>/<filename>`
pub fn hosted_url(base: &str, partition: &str, filename: &str) -> String {
    format!("{}/{}/{}", base.trim_end_matches('/'), partition, filename)
}

fn slot_strings(slots: &ImageSlots) -> [String; IMAGE_SLOTS] {
    std::array::from_fn(|k| slots.get_or_empty(k).to_string())
}

fn html_description(gallery: &[String], banner_url: &str) -> String {
    let mut html = String::from(r#"<div style="text-align:center">"#);
    for url in gallery.iter().filter(|u| !u.is_empty()) {
        html.push_str(&format!(r#"<img src="{}" style="max-width:100%" /><br />"#, url));
    }
    html.push_str(&format!(r#"<img src="{}" style="max-width:100%" />"#, banner_url));
    html.push_str("</div>");
    html
}

/// Writes the spreadsheet for a run.
///
/// Returns the file path relative to the working directory, or `None` when
/// the file is missing after the write; both outcomes are logged.
pub fn export(
    records: &[ProductRecord],
    hosting: &ImageHosting<'_>,
    path: &Path,
    sink: &dyn ProgressSink,
) -> Option<String> {
    let rows: Vec<ExportRow> = records.iter().map(|r| ExportRow::assemble(r, hosting)).collect();

    if let Err(e) = xlsx::write_rows(&rows, path) {
        warn!("Spreadsheet write failed: {:#}", e);
        sink.log_line(&format!("Failed to write spreadsheet: {:#}", e));
        return None;
    }

    if !path.exists() {
        warn!("Spreadsheet missing after write: {}", path.display());
        sink.log_line(&format!("Spreadsheet was not created: {}", path.display()));
        return None;
    }

    let relative = relative_to_cwd(path);
    info!("Wrote {} rows to {}", rows.len(), relative);
    sink.log_line(&format!("Saved {} products to {}", rows.len(), relative));
    Some(relative)
}

fn relative_to_cwd(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
        .to_string_lossy()
        .replace('\\', "/")
}
