//! HTTP surface: news submission, SSE analysis stream and feed control.

use std::convert::Infallible;

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures_util::{future, Stream, StreamExt};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::{info, warn, Level};

use crate::hub::Hub;
use crate::ingest::FeedPoller;
use crate::news::{Analysis, NewsItem};

#[derive(Clone)]
pub struct AppState {
    pub hub: Hub,
    pub feed: FeedPoller,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/news", post(submit_news))
        .route("/api/stream", get(stream_analyses))
        .route("/api/feed/start", post(feed_start))
        .route("/api/feed/stop", post(feed_stop))
        .route("/api/feed/status", get(feed_status))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Client-visible rejection at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("required fields must not be blank: {}", .0.join(", "))]
    BlankFields(Vec<&'static str>),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            ApiError::BlankFields(fields) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": message, "fields": fields })),
            )
                .into_response(),
        }
    }
}

async fn submit_news(
    State(state): State<AppState>,
    Json(item): Json<NewsItem>,
) -> Result<StatusCode, ApiError> {
    let blank = item.blank_fields();
    if !blank.is_empty() {
        warn!(fields = ?blank, "rejected news submission");
        return Err(ApiError::BlankFields(blank));
    }
    info!(source = %item.source, headline = %item.headline, "news submitted");
    state.hub.ingest(item);
    Ok(StatusCode::ACCEPTED)
}

fn to_event(analysis: &Analysis) -> Option<Result<Event, Infallible>> {
    match Event::default().id(analysis.id.clone()).json_data(analysis) {
        Ok(ev) => Some(Ok(ev)),
        Err(e) => {
            warn!(error = ?e, id = %analysis.id, "failed to encode analysis event");
            None
        }
    }
}

async fn stream_analyses(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = state
        .hub
        .subscribe()
        .filter_map(|analysis| future::ready(to_event(&analysis)));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FeedStatus {
    pub running: bool,
}

async fn feed_start(State(state): State<AppState>) -> Json<FeedStatus> {
    state.feed.start();
    Json(FeedStatus {
        running: state.feed.is_running(),
    })
}

async fn feed_stop(State(state): State<AppState>) -> Json<FeedStatus> {
    state.feed.stop();
    Json(FeedStatus {
        running: state.feed.is_running(),
    })
}

async fn feed_status(State(state): State<AppState>) -> Json<FeedStatus> {
    Json(FeedStatus {
        running: state.feed.is_running(),
    })
}
