//! Progress reporting for a crawl run.
//!
//! The pipeline never talks to a UI directly: it writes human-readable log
//! lines and progress percentages into a [`ProgressSink`]. The CLI prints
//! them, the HTTP relay turns them into server-sent events.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

/// Receiver of user-facing crawl output.
///
/// Called from the single task running the crawl; implementations only need
/// to be `Sync` so the pipeline future stays `Send`.
pub trait ProgressSink: Send + Sync {
    /// A free-form status line for human eyes.
    fn log_line(&self, text: &str);

    /// Overall completion, 0-100.
    fn report_progress(&self, percent: u8);
}

/// Event emitted to streaming callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CrawlEvent {
    Log { message: String },
    Progress { value: u8 },
    Complete { path: String },
}

/// Forwards everything into an unbounded channel as [`CrawlEvent`]s.
pub struct ChannelSink {
    tx: UnboundedSender<CrawlEvent>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<CrawlEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelSink {
    fn log_line(&self, text: &str) {
        // Receiver gone means the client disconnected; the run keeps going.
        let _ = self.tx.send(CrawlEvent::Log { message: text.to_string() });
    }

    fn report_progress(&self, percent: u8) {
        let _ = self.tx.send(CrawlEvent::Progress { value: percent.min(100) });
    }
}

/// Prints log lines and progress to stderr.
pub struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn log_line(&self, text: &str) {
        eprintln!("{}", text);
    }

    fn report_progress(&self, percent: u8) {
        eprintln!("[{:>3}%]", percent.min(100));
    }
}

/// Keeps everything in memory. Handy for tests and for callers that want
/// the last log line as an error message.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
    progress: Mutex<Vec<u8>>,
}

impl MemorySink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn progress(&self) -> Vec<u8> {
        self.progress.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn last_line(&self) -> Option<String> {
        self.lines().pop()
    }
}

impl ProgressSink for MemorySink {
    fn log_line(&self, text: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(text.to_string());
        }
    }

    fn report_progress(&self, percent: u8) {
        if let Ok(mut progress) = self.progress.lock() {
            progress.push(percent.min(100));
        }
    }
}

/// Maps `done` of `total` into the `[from, to]` percent band.
pub fn scaled_progress(from: u8, to: u8, done: usize, total: usize) -> u8 {
    if total == 0 {
        return to;
    }
    let span = to.saturating_sub(from) as usize;
    let step = span * done.min(total) / total;
    from.saturating_add(step as u8).min(100)
}
