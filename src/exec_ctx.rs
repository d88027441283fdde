//! Execution context shared across pipeline runs.
//!
//! [`ExecCtx`] carries the provider backend, model identifiers, default
//! generation options and an optional event handler. It is built once at
//! startup and shared read-only by every request; no stage reads ambient
//! configuration on its own.

use crate::backend::{
    Backend, ImageRequest, ImageResponse, TextRequest, TextResponse, VeniceBackend,
};
use crate::client::{ImageOptions, TextOptions};
use crate::config::{Settings, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};
use crate::error::{ProviderResult, Result};
use crate::events::{self, Event, EventHandler};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Shared, immutable execution context.
///
/// # Example
///
/// ```
/// use link_to_social::{ExecCtx, MockBackend};
/// use std::sync::Arc;
///
/// let ctx = ExecCtx::builder(Arc::new(MockBackend::default()))
///     .text_model("llama-3.2-3b")
///     .image_model("venice-sd35")
///     .build();
/// ```
pub struct ExecCtx {
    /// Provider backend.
    pub backend: Arc<dyn Backend>,
    pub text_model: String,
    /// Defaults every text request starts from.
    pub text_options: TextOptions,
    pub image_model: String,
    /// Defaults every image request starts from.
    pub image_options: ImageOptions,
    /// Optional event handler for lifecycle events.
    pub event_handler: Option<Arc<dyn EventHandler>>,
}

impl ExecCtx {
    /// Create a new builder around a backend.
    pub fn builder(backend: Arc<dyn Backend>) -> ExecCtxBuilder {
        ExecCtxBuilder {
            backend,
            text_model: None,
            text_options: None,
            image_model: None,
            image_options: None,
            event_handler: None,
        }
    }

    /// Build the production context: a [`VeniceBackend`] plus the
    /// configured models and defaults.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let backend = VeniceBackend::new(&settings.provider)?;
        Ok(Self::builder(Arc::new(backend))
            .text_model(settings.text_model.clone())
            .text_options(settings.text_options.clone())
            .image_model(settings.image_model.clone())
            .image_options(settings.image_options.clone())
            .build())
    }

    /// Validate and send one text request.
    pub async fn generate_text(&self, request: &TextRequest) -> ProviderResult<TextResponse> {
        request.validate()?;
        let started = Instant::now();
        let result = self.backend.generate_text(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(resp) => debug!(
                backend = self.backend.name(),
                model = %request.model,
                web_retrieval = request.options.web_retrieval,
                elapsed_ms,
                chars = resp.text.len(),
                "text generation finished"
            ),
            Err(e) => warn!(
                backend = self.backend.name(),
                model = %request.model,
                elapsed_ms,
                error = %e,
                "text generation failed"
            ),
        }
        result
    }

    /// Validate and send one image request.
    pub async fn generate_image(&self, request: &ImageRequest) -> ProviderResult<ImageResponse> {
        request.validate()?;
        let started = Instant::now();
        let result = self.backend.generate_image(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(resp) => debug!(
                backend = self.backend.name(),
                model = %request.model,
                width = request.options.width,
                height = request.options.height,
                elapsed_ms,
                bytes = resp.data.len(),
                "image generation finished"
            ),
            Err(e) => warn!(
                backend = self.backend.name(),
                model = %request.model,
                elapsed_ms,
                error = %e,
                "image generation failed"
            ),
        }
        result
    }

    pub(crate) fn emit(&self, event: Event) {
        events::emit(&self.event_handler, event);
    }
}

impl std::fmt::Debug for ExecCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecCtx")
            .field("backend", &self.backend.name())
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("has_event_handler", &self.event_handler.is_some())
            .finish()
    }
}

/// Builder for [`ExecCtx`].
pub struct ExecCtxBuilder {
    backend: Arc<dyn Backend>,
    text_model: Option<String>,
    text_options: Option<TextOptions>,
    image_model: Option<String>,
    image_options: Option<ImageOptions>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl ExecCtxBuilder {
    /// Set the text model. Default: `llama-3.2-3b`.
    pub fn text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = Some(model.into());
        self
    }

    pub fn text_options(mut self, options: TextOptions) -> Self {
        self.text_options = Some(options);
        self
    }

    /// Set the image model. Default: `venice-sd35`.
    pub fn image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = Some(model.into());
        self
    }

    pub fn image_options(mut self, options: ImageOptions) -> Self {
        self.image_options = Some(options);
        self
    }

    /// Set the event handler.
    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Build the execution context.
    pub fn build(self) -> ExecCtx {
        ExecCtx {
            backend: self.backend,
            text_model: self
                .text_model
                .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            text_options: self.text_options.unwrap_or_default(),
            image_model: self
                .image_model
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            image_options: self.image_options.unwrap_or_default(),
            event_handler: self.event_handler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::error::ProviderError;

    #[test]
    fn test_builder_defaults() {
        let ctx = ExecCtx::builder(Arc::new(MockBackend::default())).build();
        assert_eq!(ctx.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(ctx.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(ctx.text_options, TextOptions::default());
        assert!(format!("{:?}", ctx).contains("mock"));
    }

    #[tokio::test]
    async fn test_invalid_request_never_reaches_backend() {
        let mock = Arc::new(MockBackend::fixed("{}", b"x".to_vec()));
        let ctx = ExecCtx::builder(mock.clone()).build();

        let err = ctx
            .generate_text(&TextRequest::new("m", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));

        let bad_image = ImageRequest::new("m", "p")
            .with_options(ImageOptions::default().with_dimensions(0, 10));
        assert!(ctx.generate_image(&bad_image).await.is_err());

        assert_eq!(mock.text_calls(), 0);
        assert_eq!(mock.image_calls(), 0);
    }

    #[tokio::test]
    async fn test_valid_request_is_forwarded() {
        let mock = Arc::new(MockBackend::fixed("hello", b"x".to_vec()));
        let ctx = ExecCtx::builder(mock.clone()).build();
        let resp = ctx.generate_text(&TextRequest::new("m", "hi")).await;
        let resp = tokio_test::assert_ok!(resp);
        assert_eq!(resp.text, "hello");
        assert_eq!(mock.text_calls(), 1);
    }
}
