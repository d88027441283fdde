use crate::types::ImageKind;
use thiserror::Error;

/// Failures raised by a single provider call.
///
/// Every transport, status, and body-shape problem is normalized into this
/// one type so the stages above only need to decide which stage failed.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Connection refused, DNS failure, TLS error, broken body stream.
    #[error("Failed to reach provider at {url}: {message}")]
    Transport { url: String, message: String },

    /// The per-call deadline elapsed before the provider answered.
    #[error("Provider call to {url} timed out")]
    Timeout { url: String },

    /// The provider answered with a non-success status code.
    #[error("Provider returned HTTP {status}: {body}")]
    Http {
        /// HTTP status code (e.g. 401, 429, 500).
        status: u16,
        /// Response body text.
        body: String,
    },

    /// A 2xx response whose body did not have the expected shape.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// The request was rejected locally before any network call.
    #[error("Invalid provider request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Classify a `reqwest` failure for the given endpoint.
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout {
                url: url.to_string(),
            }
        } else if err.is_decode() {
            ProviderError::MalformedResponse(err.to_string())
        } else {
            ProviderError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Upstream HTTP status, when the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors produced by the pipeline stages and the service around them.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The source article could not be retrieved, either because the
    /// provider call failed or because the provider reported it could not
    /// read the page.
    #[error("Article retrieval failed: {reason}")]
    Scrape {
        reason: String,
        #[source]
        source: Option<ProviderError>,
    },

    /// The provider answered, but not with a usable summary.
    #[error("Summary format error: {0}")]
    SummaryFormat(String),

    /// One of the two image calls failed.
    #[error("Image generation failed ({kind}): {source}")]
    ImageGeneration {
        kind: ImageKind,
        #[source]
        source: ProviderError,
    },

    /// The incoming request was unusable (bad URL, bad body).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid configuration detected at startup.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    /// Stable tag for envelopes and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Scrape { .. } => "scrape",
            PipelineError::SummaryFormat(_) => "summary_format",
            PipelineError::ImageGeneration { .. } => "image_generation",
            PipelineError::InvalidRequest(_) => "invalid_request",
            PipelineError::InvalidConfig(_) => "invalid_config",
        }
    }

    pub(crate) fn scrape(source: ProviderError) -> Self {
        PipelineError::Scrape {
            reason: source.to_string(),
            source: Some(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
