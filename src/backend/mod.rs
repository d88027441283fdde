//! Backend trait and normalized request/response types.
//!
//! The [`Backend`] trait abstracts over the generation provider, translating
//! between normalized [`TextRequest`]/[`ImageRequest`] values and the
//! provider's HTTP API. Built-in implementations: [`VeniceBackend`] and
//! [`MockBackend`].
//!
//! ## Architecture
//!
//! ```text
//! SummarizeStage ──► TextRequest  ──► Backend::generate_text()  ──► TextResponse
//! CreativeStage  ──► ImageRequest ──► Backend::generate_image() ──► ImageResponse
//!                                            │
//!                                 ┌──────────┴──────────┐
//!                            VeniceBackend          MockBackend
//!                         /chat/completions       canned replies
//!                         /image/generate
//! ```

pub mod mock;
pub mod venice;

pub use mock::MockBackend;
pub use venice::VeniceBackend;

use crate::client::{ImageOptions, TextOptions};
use crate::error::{ProviderError, ProviderResult};
use async_trait::async_trait;

/// A normalized text-generation request.
#[derive(Debug, Clone)]
pub struct TextRequest {
    /// Model identifier (e.g. `"llama-3.2-3b"`).
    pub model: String,

    /// Optional system prompt sent ahead of the user prompt.
    pub system_prompt: Option<String>,

    /// The user prompt text.
    pub prompt: String,

    /// Sampling and provider feature flags.
    pub options: TextOptions,
}

impl TextRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: None,
            prompt: prompt.into(),
            options: TextOptions::default(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    pub fn with_options(mut self, options: TextOptions) -> Self {
        self.options = options;
        self
    }

    /// Reject requests the provider would refuse anyway.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.prompt.trim().is_empty() {
            return Err(ProviderError::InvalidRequest("prompt is empty".into()));
        }
        if self.model.trim().is_empty() {
            return Err(ProviderError::InvalidRequest("model is empty".into()));
        }
        self.options.validate()
    }
}

/// A normalized text response.
#[derive(Debug)]
pub struct TextResponse {
    /// The generated text content.
    pub text: String,

    /// HTTP status code (for diagnostics/logging).
    pub status: u16,

    /// Provider-specific metadata (token usage, model, request id).
    pub metadata: Option<serde_json::Value>,
}

/// A normalized image-generation request.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub options: ImageOptions,
}

impl ImageRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            options: ImageOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ImageOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validate(&self) -> ProviderResult<()> {
        if self.prompt.trim().is_empty() {
            return Err(ProviderError::InvalidRequest("prompt is empty".into()));
        }
        if self.model.trim().is_empty() {
            return Err(ProviderError::InvalidRequest("model is empty".into()));
        }
        self.options.validate()
    }
}

/// A decoded image.
#[derive(Debug)]
pub struct ImageResponse {
    /// Encoded image bytes (webp/png/jpeg), never base64.
    pub data: Vec<u8>,

    pub status: u16,
}

/// Abstraction over the generation provider.
///
/// One invocation is exactly one provider call: implementations must not
/// retry. Every failure is reported as a [`ProviderError`].
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn Backend>`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Generate text (optionally after provider-side web retrieval).
    async fn generate_text(&self, request: &TextRequest) -> ProviderResult<TextResponse>;

    /// Generate one image.
    async fn generate_image(&self, request: &ImageRequest) -> ProviderResult<ImageResponse>;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str;
}
