//! The crawl run: listing traversal, detail extraction, seller codes,
//! image acquisition and export, reported through a [`ProgressSink`].

pub mod codes;
pub mod context;
pub mod detail;
pub mod pipeline;
pub mod sink;
pub mod traverse;

pub use codes::CodeTemplate;
pub use context::{CrawlOutcome, CrawlRequest, RunContext, StopSignal, Timings};
pub use pipeline::run_crawl;
pub use sink::{ChannelSink, ConsoleSink, CrawlEvent, ProgressSink};
