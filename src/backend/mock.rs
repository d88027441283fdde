//! Mock backend for testing without a live provider.
//!
//! [`MockBackend`] returns pre-configured replies in order and records every
//! request it receives, so tests can assert both what came back and which
//! calls were (or were not) issued.
//!
//! # Example
//!
//! ```
//! use link_to_social::backend::MockBackend;
//!
//! let mock = MockBackend::new(vec![r#"{"ok": true}"#.to_string()], vec![b"png".to_vec()]);
//! assert_eq!(mock.text_calls(), 0);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Backend, ImageRequest, ImageResponse, TextRequest, TextResponse};
use crate::error::{ProviderError, ProviderResult};

/// A test backend that replays canned replies in order.
///
/// Each reply list cycles back to the beginning when exhausted. A list left
/// empty makes the corresponding call fail with a malformed-response error.
#[derive(Debug, Default)]
pub struct MockBackend {
    text_replies: Vec<ProviderResult<String>>,
    image_replies: Vec<ProviderResult<Vec<u8>>>,
    text_index: AtomicUsize,
    image_index: AtomicUsize,
    text_requests: Mutex<Vec<TextRequest>>,
    image_requests: Mutex<Vec<ImageRequest>>,
}

impl MockBackend {
    /// Create a mock that always succeeds with the given replies.
    pub fn new(texts: Vec<String>, images: Vec<Vec<u8>>) -> Self {
        Self {
            text_replies: texts.into_iter().map(Ok).collect(),
            image_replies: images.into_iter().map(Ok).collect(),
            ..Default::default()
        }
    }

    /// Create a mock that always returns the same text and image.
    pub fn fixed(text: impl Into<String>, image: impl Into<Vec<u8>>) -> Self {
        Self::new(vec![text.into()], vec![image.into()])
    }

    /// Replace the text replies, allowing failures.
    pub fn with_text_replies(mut self, replies: Vec<ProviderResult<String>>) -> Self {
        self.text_replies = replies;
        self
    }

    /// Replace the image replies, allowing failures.
    pub fn with_image_replies(mut self, replies: Vec<ProviderResult<Vec<u8>>>) -> Self {
        self.image_replies = replies;
        self
    }

    /// Number of text calls received so far.
    pub fn text_calls(&self) -> usize {
        self.text_index.load(Ordering::Relaxed)
    }

    /// Number of image calls received so far.
    pub fn image_calls(&self) -> usize {
        self.image_index.load(Ordering::Relaxed)
    }

    /// Copies of the text requests received, in order.
    pub fn text_requests(&self) -> Vec<TextRequest> {
        self.text_requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Copies of the image requests received, in order.
    pub fn image_requests(&self) -> Vec<ImageRequest> {
        self.image_requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn next<T: Clone>(replies: &[ProviderResult<T>], index: &AtomicUsize, what: &str) -> ProviderResult<T> {
        let idx = index.fetch_add(1, Ordering::Relaxed);
        if replies.is_empty() {
            return Err(ProviderError::MalformedResponse(format!(
                "mock has no {} replies configured",
                what
            )));
        }
        replies[idx % replies.len()].clone()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn generate_text(&self, request: &TextRequest) -> ProviderResult<TextResponse> {
        self.text_requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        let text = Self::next(&self.text_replies, &self.text_index, "text")?;
        Ok(TextResponse {
            text,
            status: 200,
            metadata: None,
        })
    }

    async fn generate_image(&self, request: &ImageRequest) -> ProviderResult<ImageResponse> {
        self.image_requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        let data = Self::next(&self.image_replies, &self.image_index, "image")?;
        Ok(ImageResponse { data, status: 200 })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fixed_response() {
        let mock = MockBackend::fixed("Hello!", b"img".to_vec());
        let resp = mock.generate_text(&TextRequest::new("m", "p")).await.unwrap();
        assert_eq!(resp.text, "Hello!");
        assert_eq!(resp.status, 200);
        let img = mock
            .generate_image(&ImageRequest::new("m", "p"))
            .await
            .unwrap();
        assert_eq!(img.data, b"img");
    }

    #[tokio::test]
    async fn test_mock_cycles_responses() {
        let mock = MockBackend::new(vec!["first".into(), "second".into()], vec![]);
        let req = TextRequest::new("m", "p");
        let r1 = mock.generate_text(&req).await.unwrap();
        let r2 = mock.generate_text(&req).await.unwrap();
        let r3 = mock.generate_text(&req).await.unwrap();
        assert_eq!(r1.text, "first");
        assert_eq!(r2.text, "second");
        assert_eq!(r3.text, "first"); // cycles
    }

    #[tokio::test]
    async fn test_mock_replays_failures_and_records() {
        let mock = MockBackend::default().with_image_replies(vec![
            Ok(b"a".to_vec()),
            Err(ProviderError::Http {
                status: 500,
                body: "down".into(),
            }),
        ]);
        let req = ImageRequest::new("m", "first prompt");
        assert!(mock.generate_image(&req).await.is_ok());
        let err = mock.generate_image(&req).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(mock.image_calls(), 2);
        assert_eq!(mock.image_requests()[0].prompt, "first prompt");
    }

    #[tokio::test]
    async fn test_mock_without_replies_fails() {
        let mock = MockBackend::default();
        let err = mock.generate_text(&TextRequest::new("m", "p")).await.unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
        assert_eq!(mock.text_calls(), 1);
    }
}
