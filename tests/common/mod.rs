//! Shared test utilities: a mock provider HTTP server and response helpers.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use link_to_social::config::ProviderSettings;
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

pub const TEST_API_KEY: &str = "test-api-key-12345";

/// A well-formed summary, as the text model would write it.
pub const SUMMARY_JSON: &str = r#"{
    "linkedin_post": "Most cloud waste hides in untagged resources. Teams that tag everything cut spend by a fifth. Monthly reviews keep it that way. How does your team track cloud costs?",
    "twitter_post": "Untagged cloud spend is invisible spend.\n\nTag it, review it monthly, kill idle boxes. What is your biggest cloud cost surprise?",
    "key_insights": [
        "Untagged resources hide most cloud waste",
        "Tagging policies cut spend by about 20%",
        "Monthly reviews prevent cost drift",
        "Idle development environments add up fast"
    ],
    "article_title": "Taming Cloud Costs in 2024",
    "article_author": "Jane Doe",
    "article_date": "2024-03-01"
}"#;

/// How the mock answers one endpoint.
#[derive(Clone, Debug)]
pub enum Reply {
    /// JSON body with the given status.
    Json(u16, Value),
    /// Raw bytes with the given content type.
    Raw(&'static str, Vec<u8>),
}

impl Reply {
    /// A chat completion whose message content is `content`.
    pub fn chat(content: &str) -> Self {
        Reply::Json(
            200,
            json!({
                "id": "chatcmpl-test",
                "model": "llama-3.2-3b",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}],
                "usage": {"prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30}
            }),
        )
    }

    /// An image generation answer carrying `bytes` as base64.
    pub fn image_b64(bytes: &[u8]) -> Self {
        use base64::Engine as _;
        Reply::Json(
            200,
            json!({
                "id": "img-test",
                "images": [base64::engine::general_purpose::STANDARD.encode(bytes)]
            }),
        )
    }

    pub fn status(code: u16, message: &str) -> Self {
        Reply::Json(code, json!({"error": message}))
    }

    fn into_response(self) -> Response {
        match self {
            Reply::Json(code, body) => {
                let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, Json(body)).into_response()
            }
            Reply::Raw(content_type, bytes) => {
                ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
            }
        }
    }
}

/// A request the mock received.
#[derive(Clone, Debug)]
pub struct Recorded {
    pub path: &'static str,
    pub authorization: Option<String>,
    pub body: Value,
}

/// Mock provider configuration and request log.
pub struct MockProviderState {
    pub text: Reply,
    pub image: Reply,
    /// Delay before every answer.
    pub delay: Option<Duration>,
    pub requests: RwLock<Vec<Recorded>>,
}

impl MockProviderState {
    pub fn new(text: Reply, image: Reply) -> Self {
        Self {
            text,
            image,
            delay: None,
            requests: RwLock::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn recorded(&self, path: &str) -> Vec<Recorded> {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

/// Start a mock provider on an ephemeral port.
pub async fn start_mock_provider(state: MockProviderState) -> (SocketAddr, Arc<MockProviderState>) {
    let state = Arc::new(state);

    let app = Router::new()
        .route("/chat/completions", post(mock_chat))
        .route("/image/generate", post(mock_image))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

async fn record(state: &MockProviderState, path: &'static str, headers: &HeaderMap, body: Value) {
    state.requests.write().await.push(Recorded {
        path,
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body,
    });
    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }
}

async fn mock_chat(
    State(state): State<Arc<MockProviderState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, "/chat/completions", &headers, body).await;
    state.text.clone().into_response()
}

async fn mock_image(
    State(state): State<Arc<MockProviderState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, "/image/generate", &headers, body).await;
    state.image.clone().into_response()
}

/// Provider settings pointing at a mock server.
pub fn provider_settings(addr: SocketAddr, timeout: Duration) -> ProviderSettings {
    ProviderSettings {
        api_key: TEST_API_KEY.to_string(),
        base_url: format!("http://{}", addr),
        request_timeout: timeout,
    }
}

/// Extract a JSON body from an axum response.
pub async fn extract_json<T: for<'de> Deserialize<'de>>(response: Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
