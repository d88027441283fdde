//! Data carried between stages and returned to callers.

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hard cap on the short-form post.
pub const SHORT_POST_MAX_CHARS: usize = 280;

/// Allowed number of key insights, inclusive.
pub const KEY_INSIGHTS_RANGE: std::ops::RangeInclusive<usize> = 3..=5;

/// Article metadata extracted by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleMeta {
    pub title: String,
    pub author: Option<String>,
    pub date: Option<String>,
}

/// Validated output of the summarize stage. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub article: ArticleMeta,
    /// LinkedIn post, 3-5 sentences.
    pub linkedin_post: String,
    /// X/Twitter post, at most [`SHORT_POST_MAX_CHARS`] characters.
    pub twitter_post: String,
    /// Ordered key insights, length within [`KEY_INSIGHTS_RANGE`].
    pub key_insights: Vec<String>,
}

/// Which of the two generated images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Infographic,
    Social,
}

impl ImageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Infographic => "infographic",
            ImageKind::Social => "social",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Both generated images, as encoded bytes. Always complete.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePair {
    pub infographic: Vec<u8>,
    pub social: Vec<u8>,
}

impl ImagePair {
    pub fn get(&self, kind: ImageKind) -> &[u8] {
        match kind {
            ImageKind::Infographic => &self.infographic,
            ImageKind::Social => &self.social,
        }
    }

    pub fn to_base64(&self, kind: ImageKind) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.get(kind))
    }
}

impl fmt::Debug for ImagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePair")
            .field("infographic_bytes", &self.infographic.len())
            .field("social_bytes", &self.social.len())
            .finish()
    }
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageName {
    Summarize,
    Creative,
    Assemble,
}

impl StageName {
    pub const ALL: [StageName; 3] = [StageName::Summarize, StageName::Creative, StageName::Assemble];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Summarize => "summarize",
            StageName::Creative => "creative",
            StageName::Assemble => "assemble",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Success,
    Error,
    Skipped,
}

/// One audit-trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: StageName,
    pub status: StageStatus,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageRecord {
    pub fn skipped(stage: StageName) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped,
            started_at: Utc::now(),
            duration_ms: 0,
            error: None,
        }
    }
}

/// Response envelope returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope {
    Success(SuccessBody),
    Error(ErrorBody),
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    pub fn audit_trail(&self) -> &[StageRecord] {
        match self {
            Envelope::Success(body) => &body.audit_trail,
            Envelope::Error(body) => &body.audit_trail,
        }
    }

    pub(crate) fn push_record(&mut self, record: StageRecord) {
        match self {
            Envelope::Success(body) => body.audit_trail.push(record),
            Envelope::Error(body) => body.audit_trail.push(record),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessBody {
    pub url: String,
    pub article: ArticleView,
    pub posts: PostsView,
    pub images: ImagesView,
    #[serde(default)]
    pub audit_trail: Vec<StageRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleView {
    pub title: String,
    pub author: Option<String>,
    pub date: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostsView {
    pub linkedin: String,
    pub twitter: String,
    pub key_insights: Vec<String>,
}

/// Base64-encoded images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagesView {
    pub infographic: String,
    pub social: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message from the first error encountered.
    pub message: String,
    /// Stable error tag, see [`PipelineError::kind`](crate::PipelineError::kind).
    pub kind: String,
    pub url: String,
    #[serde(default)]
    pub audit_trail: Vec<StageRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_envelope_shape() {
        let env = Envelope::Error(ErrorBody {
            message: "Article retrieval failed: 404".into(),
            kind: "scrape".into(),
            url: "https://example.com/a".into(),
            audit_trail: vec![],
        });
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["status"], "error");
        assert_eq!(v["message"], "Article retrieval failed: 404");
        assert!(v.get("images").is_none());
        assert!(v.get("posts").is_none());
    }

    #[test]
    fn test_envelope_deserializes_by_status_tag() {
        let env: Envelope = serde_json::from_value(json!({
            "status": "error",
            "message": "m",
            "kind": "scrape",
            "url": "u"
        }))
        .unwrap();
        assert!(!env.is_success());
        assert!(env.audit_trail().is_empty());
    }

    #[test]
    fn test_image_pair_base64() {
        let pair = ImagePair {
            infographic: b"hello".to_vec(),
            social: b"hi".to_vec(),
        };
        assert_eq!(pair.to_base64(ImageKind::Infographic), "aGVsbG8=");
        assert_eq!(pair.to_base64(ImageKind::Social), "aGk=");
        assert_eq!(
            format!("{:?}", pair),
            "ImagePair { infographic_bytes: 5, social_bytes: 2 }"
        );
    }

    #[test]
    fn test_stage_record_serializes_lowercase() {
        let v = serde_json::to_value(StageRecord::skipped(StageName::Creative)).unwrap();
        assert_eq!(v["stage"], "creative");
        assert_eq!(v["status"], "skipped");
        assert!(v.get("error").is_none());
    }
}
