//! HTTP relay: streams crawl progress as server-sent events and serves
//! result files for download.

use super::crawl::validate_url;
use crate::browser::{ChromiumRenderer, Renderer};
use crate::config::Config;
use crate::crawl::{
    run_crawl, ChannelSink, CrawlEvent, CrawlRequest, ProgressSink, RunContext, StopSignal,
};
use crate::files;
use crate::images::{HttpImageFetcher, ImageFetcher};
use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{info, warn};

/// Shared by every request.
pub struct AppState {
    pub config: Config,
    pub renderer: Arc<dyn Renderer>,
    pub fetcher: Arc<dyn ImageFetcher>,
    /// Downloads are resolved under this directory
    pub root: PathBuf,
}

/// Builds the router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/crawl", post(crawl_events))
        .route("/api/download", get(download))
        .with_state(state)
}

/// Serves until the process is stopped.
pub async fn serve(config: Config, bind: &str) -> Result<()> {
    let renderer = ChromiumRenderer::new(config.chromium_path.clone(), config.headless);
    let fetcher = HttpImageFetcher::new()?;
    let root = std::env::current_dir().context("Failed to read working directory")?;

    let state = Arc::new(AppState {
        config,
        renderer: Arc::new(renderer),
        fetcher: Arc::new(fetcher),
        root,
    });

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Listening on http://{}", bind);
    eprintln!("Listening on http://{}", bind);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

/// Sets the stop signal when the event stream is dropped, so a client
/// that disconnects stops the run after the current unit of work.
struct StopOnDrop(StopSignal);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.0.stop();
    }
}

async fn crawl_events(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CrawlRequest>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let ctx = RunContext::new(&state.config, &request);
    let guard = StopOnDrop(ctx.stop.clone());

    tokio::spawn(run_and_report(state, ctx, tx));

    let stream = async_stream::stream! {
        let _guard = guard;
        while let Some(event) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&event) {
                yield Ok(Event::default().data(json));
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Runs one crawl and ends with either a `complete` event or a failure line.
async fn run_and_report(state: Arc<AppState>, ctx: RunContext, tx: UnboundedSender<CrawlEvent>) {
    let sink = ChannelSink::new(tx.clone());

    let result = match validate_url(&ctx.url) {
        Ok(()) => run_crawl(&ctx, state.renderer.as_ref(), state.fetcher.as_ref(), &sink).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(outcome) => match outcome.file_path {
            Some(path) => {
                let _ = tx.send(CrawlEvent::Complete { path });
            }
            None => sink.log_line("Crawl finished without a spreadsheet"),
        },
        Err(e) => {
            warn!("Crawl of {} failed: {:#}", ctx.url, e);
            sink.log_line(&format!("Crawl failed: {:#}", e));
        }
    }
}

#[derive(Deserialize)]
struct DownloadParams {
    path: String,
}

async fn download(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DownloadParams>,
) -> Response {
    let Some(full) = files::resolve_download_path(&state.root, &params.path) else {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "File not found" }))).into_response();
    };

    match tokio::fs::read(&full).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, files::content_type_for(&full).to_string()),
                (header::CONTENT_DISPOSITION, files::attachment_header(&full)),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            warn!("Failed to read {}: {}", full.display(), e);
            let body = Json(json!({ "error": e.to_string() }));
            (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
        }
    }
}
