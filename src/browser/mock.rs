//! Scripted renderer for tests.

use super::{BrowserPage, Renderer};
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct MockState {
    pages: Mutex<HashMap<String, String>>,
    heights: Mutex<HashMap<String, Vec<u64>>>,
    fail_open: AtomicBool,
    opened: AtomicUsize,
    closed: AtomicUsize,
    scrolls: AtomicUsize,
    nudges: AtomicUsize,
    visited: Mutex<Vec<String>>,
}

/// Serves canned HTML per URL and counts browser lifecycle calls.
///
/// URLs without canned HTML fail to navigate.
#[derive(Clone, Default)]
pub struct MockRenderer {
    state: Arc<MockState>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, html: impl Into<String>) -> Self {
        self.state.pages.lock().unwrap().insert(url.to_string(), html.into());
        self
    }

    /// Heights reported by successive `document_height` calls on `url`.
    /// The last value repeats once the list runs out.
    pub fn with_heights(self, url: &str, heights: Vec<u64>) -> Self {
        self.state.heights.lock().unwrap().insert(url.to_string(), heights);
        self
    }

    pub fn failing_open(self) -> Self {
        self.state.fail_open.store(true, Ordering::SeqCst);
        self
    }

    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    pub fn scrolls(&self) -> usize {
        self.state.scrolls.load(Ordering::SeqCst)
    }

    pub fn nudges(&self) -> usize {
        self.state.nudges.load(Ordering::SeqCst)
    }

    pub fn visited(&self) -> Vec<String> {
        self.state.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    async fn open(&self) -> Result<Box<dyn BrowserPage>> {
        if self.state.fail_open.load(Ordering::SeqCst) {
            bail!("failed to launch Chromium: mock launch failure");
        }
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        let state = Arc::clone(&self.state);
        Ok(Box::new(MockPage { state, url: None, height_calls: AtomicUsize::new(0) }))
    }
}

struct MockPage {
    state: Arc<MockState>,
    url: Option<String>,
    height_calls: AtomicUsize,
}

#[async_trait]
impl BrowserPage for MockPage {
    async fn goto(&mut self, url: &str, _timeout: Duration) -> Result<()> {
        self.state.visited.lock().unwrap().push(url.to_string());
        if !self.state.pages.lock().unwrap().contains_key(url) {
            bail!("navigation to {url} failed: net::ERR_NAME_NOT_RESOLVED");
        }
        self.url = Some(url.to_string());
        self.height_calls.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        let pages = self.state.pages.lock().unwrap();
        let html = self.url.as_ref().and_then(|u| pages.get(u).cloned());
        Ok(html.unwrap_or_else(|| "<html></html>".into()))
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.state.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn scroll_by(&self, _dy: i64) -> Result<()> {
        self.state.nudges.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn document_height(&self) -> Result<u64> {
        let call = self.height_calls.fetch_add(1, Ordering::SeqCst);
        let heights = self.state.heights.lock().unwrap();
        let seq = self.url.as_ref().and_then(|u| heights.get(u));
        Ok(seq.and_then(|s| s.get(call).or(s.last()).copied()).unwrap_or(1000))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
