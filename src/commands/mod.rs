//! CLI command implementations.

pub mod crawl;
pub mod serve;

pub use crawl::CrawlCommand;
