//! fredmeyer-crawler - Fred Meyer product crawler
//!
//! Walks listing pages in a headless browser, extracts product details,
//! assigns seller codes, downloads and normalizes product images, and
//! exports everything to a spreadsheet.

pub mod browser;
pub mod commands;
pub mod config;
pub mod crawl;
pub mod export;
pub mod files;
pub mod images;
pub mod site;

pub use config::Config;
pub use crawl::{run_crawl, CrawlOutcome, CrawlRequest, RunContext};
pub use site::ProductRecord;
