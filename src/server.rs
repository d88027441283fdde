//! HTTP surface: `POST /process`, `GET /health`, `GET /favicon.ico`.

use crate::error::PipelineError;
use crate::pipeline::{parse_article_url, rejected, Pipeline};
use crate::types::Envelope;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub const SERVICE_NAME: &str = "link-to-social-agent";

/// Server state shared across handlers.
#[derive(Debug)]
pub struct AppState {
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/process", post(process))
        .route("/health", get(health))
        .route("/favicon.ico", get(favicon))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness probe. Never touches the provider.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        service: SERVICE_NAME.into(),
    })
}

async fn favicon() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/x-icon")], Vec::<u8>::new())
}

async fn process(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> (StatusCode, Json<Envelope>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let err = PipelineError::InvalidRequest(rejection.body_text());
            warn!(error = %err, "rejected request body");
            return (StatusCode::BAD_REQUEST, Json(rejected("", &err)));
        }
    };

    let url = match parse_article_url(&request.url) {
        Ok(url) => url,
        Err(err) => {
            warn!(url = %request.url, error = %err, "rejected article url");
            return (StatusCode::BAD_REQUEST, Json(rejected(&request.url, &err)));
        }
    };

    info!(url = %url, "processing article");
    let envelope = state.pipeline.process(url).await;
    let status = if envelope.is_success() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    (status, Json(envelope))
}
