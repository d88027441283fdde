//! Backend for the Venice generation API.
//!
//! Text: `POST {base}/chat/completions` (OpenAI-compatible chat schema plus a
//! `venice_parameters` object that switches on web retrieval).
//! Images: `POST {base}/image/generate`, answered with base64 JSON or raw bytes.

use super::{Backend, ImageRequest, ImageResponse, TextRequest, TextResponse};
use crate::config::ProviderSettings;
use crate::error::{PipelineError, ProviderError, ProviderResult, Result};
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::{json, Value};

const CHAT_PATH: &str = "/chat/completions";
const IMAGE_PATH: &str = "/image/generate";

/// HTTP client for the provider.
///
/// Holds a pooled `reqwest::Client` whose timeout bounds every call.
///
/// # Example
///
/// ```no_run
/// use link_to_social::backend::VeniceBackend;
/// use link_to_social::config::ProviderSettings;
/// use std::time::Duration;
///
/// let settings = ProviderSettings {
///     api_key: "vk-...".into(),
///     base_url: "https://api.venice.ai/api/v1".into(),
///     request_timeout: Duration::from_secs(120),
/// };
/// let backend = VeniceBackend::new(&settings).unwrap();
/// ```
#[derive(Clone)]
pub struct VeniceBackend {
    client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for VeniceBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = if self.api_key.chars().count() > 6 {
            format!("{}***", self.api_key.chars().take(6).collect::<String>())
        } else {
            "***".to_string()
        };
        f.debug_struct("VeniceBackend")
            .field("base_url", &self.base_url)
            .field("api_key", &key)
            .finish()
    }
}

impl VeniceBackend {
    /// Build a backend with its own client, bounded by `settings.request_timeout`.
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| PipelineError::InvalidConfig(format!("HTTP client: {}", e)))?;
        Ok(Self::with_client(
            client,
            &settings.base_url,
            settings.api_key.clone(),
        ))
    }

    /// Build a backend around an existing client.
    pub fn with_client(client: Client, base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn build_messages(request: &TextRequest) -> Vec<Value> {
        let mut messages = Vec::new();
        if let Some(ref sys) = request.system_prompt {
            if !sys.is_empty() {
                messages.push(json!({"role": "system", "content": sys}));
            }
        }
        messages.push(json!({"role": "user", "content": request.prompt}));
        messages
    }

    /// Build the request body for `/chat/completions`.
    pub(crate) fn build_text_body(request: &TextRequest) -> Value {
        let opts = &request.options;
        let mut body = json!({
            "model": request.model,
            "messages": Self::build_messages(request),
            "temperature": opts.temperature,
            "max_completion_tokens": opts.max_tokens,
            "venice_parameters": {
                "enable_web_scraping": opts.web_retrieval,
                "enable_web_citations": false,
                "include_venice_system_prompt": true,
            },
        });

        if let Some(ref schema) = opts.json_schema {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "response",
                    "strict": false,
                    "schema": schema,
                },
            });
        }

        body
    }

    /// Build the request body for `/image/generate`.
    pub(crate) fn build_image_body(request: &ImageRequest) -> Value {
        let opts = &request.options;
        let mut body = json!({
            "model": request.model,
            "prompt": request.prompt,
            "width": opts.width,
            "height": opts.height,
            "steps": opts.steps,
            "cfg_scale": opts.cfg_scale,
            "format": opts.format,
            "return_binary": false,
            "safe_mode": false,
            "embed_exif_metadata": false,
            "hide_watermark": true,
        });
        if let Some(ref negative) = opts.negative_prompt {
            body["negative_prompt"] = json!(negative);
        }
        if let Some(ref preset) = opts.style_preset {
            body["style_preset"] = json!(preset);
        }
        body
    }

    /// Send one authenticated POST and fail on any non-2xx status.
    async fn post(&self, url: &str, body: &Value) -> ProviderResult<reqwest::Response> {
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(resp)
    }

    fn extract_metadata(json_resp: &Value) -> Option<Value> {
        let mut meta = serde_json::Map::new();
        for key in ["usage", "model", "id"] {
            if let Some(v) = json_resp.get(key) {
                meta.insert(key.into(), v.clone());
            }
        }
        if meta.is_empty() {
            None
        } else {
            Some(Value::Object(meta))
        }
    }
}

#[async_trait]
impl Backend for VeniceBackend {
    async fn generate_text(&self, request: &TextRequest) -> ProviderResult<TextResponse> {
        let url = self.endpoint(CHAT_PATH);
        let body = Self::build_text_body(request);

        let resp = self.post(&url, &body).await?;
        let status = resp.status().as_u16();
        let json_resp: Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::from_reqwest(&url, e))?;

        let text = json_resp
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ProviderError::MalformedResponse(
                    "missing choices[0].message.content".to_string(),
                )
            })?
            .to_string();

        Ok(TextResponse {
            text,
            status,
            metadata: Self::extract_metadata(&json_resp),
        })
    }

    async fn generate_image(&self, request: &ImageRequest) -> ProviderResult<ImageResponse> {
        let url = self.endpoint(IMAGE_PATH);
        let body = Self::build_image_body(request);

        let resp = self.post(&url, &body).await?;
        let status = resp.status().as_u16();
        let is_binary = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("image/"));

        let data = if is_binary {
            resp.bytes()
                .await
                .map_err(|e| ProviderError::from_reqwest(&url, e))?
                .to_vec()
        } else {
            let json_resp: Value = resp
                .json()
                .await
                .map_err(|e| ProviderError::from_reqwest(&url, e))?;
            let encoded = json_resp
                .get("images")
                .and_then(|imgs| imgs.get(0))
                .and_then(|v| v.as_str())
                .ok_or_else(|| ProviderError::MalformedResponse("no image in response".into()))?;
            decode_image_payload(encoded)?
        };

        if data.is_empty() {
            return Err(ProviderError::MalformedResponse("image payload is empty".into()));
        }

        Ok(ImageResponse { data, status })
    }

    fn name(&self) -> &'static str {
        "venice"
    }
}

/// Decode a base64 image, tolerating a `data:<mime>;base64,` prefix.
pub(crate) fn decode_image_payload(encoded: &str) -> ProviderResult<Vec<u8>> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    };
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ProviderError::MalformedResponse(format!("invalid base64 image: {}", e)))
}

/// Strip a trailing slash and accidental endpoint suffixes from a base URL.
/// e.g. "https://api.venice.ai/api/v1/chat/completions" -> "https://api.venice.ai/api/v1"
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    for suffix in [CHAT_PATH, IMAGE_PATH] {
        if let Some(stripped) = trimmed.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    trimmed.to_string()
}
