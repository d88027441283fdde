//! Generation parameters for provider calls.
//!
//! [`TextOptions`] and [`ImageOptions`] carry everything besides the prompt
//! and model that a single provider call needs. Both validate their ranges
//! locally so a bad value never costs a network round trip.

use crate::error::ProviderError;
use serde_json::Value;

/// Image encodings the provider can return.
pub const IMAGE_FORMATS: &[&str] = &["webp", "png", "jpeg"];

/// Configuration for text-generation requests.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOptions {
    /// Temperature, in `[0, 2]`.
    pub temperature: f64,

    /// Maximum completion tokens to generate.
    pub max_tokens: u32,

    /// Ask the provider to fetch URLs mentioned in the prompt before answering.
    pub web_retrieval: bool,

    /// Optional JSON schema the reply must follow.
    pub json_schema: Option<Value>,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1500,
            web_retrieval: false,
            json_schema: None,
        }
    }
}

impl TextOptions {
    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.temperature = temp;
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_web_retrieval(mut self, enabled: bool) -> Self {
        self.web_retrieval = enabled;
        self
    }

    pub fn with_json_schema(mut self, schema: Value) -> Self {
        self.json_schema = Some(schema);
        self
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err(ProviderError::InvalidRequest(format!(
                "temperature must be within [0, 2], got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(ProviderError::InvalidRequest(
                "max_tokens must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for image-generation requests.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOptions {
    pub width: u32,
    pub height: u32,
    /// Diffusion step count.
    pub steps: u32,
    /// Classifier-free guidance scale.
    pub cfg_scale: f64,
    /// Things the image must avoid.
    pub negative_prompt: Option<String>,
    /// Output encoding, one of [`IMAGE_FORMATS`].
    pub format: String,
    /// Provider style preset; `None` leaves it to the model.
    pub style_preset: Option<String>,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1080,
            steps: 25,
            cfg_scale: 7.5,
            negative_prompt: None,
            format: "webp".to_string(),
            style_preset: Some("Digital Art".to_string()),
        }
    }
}

impl ImageOptions {
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_cfg_scale(mut self, scale: f64) -> Self {
        self.cfg_scale = scale;
        self
    }

    pub fn with_negative_prompt(mut self, negative: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_style_preset(mut self, preset: Option<String>) -> Self {
        self.style_preset = preset;
        self
    }

    /// Same options, cropped to a square of the shorter side.
    pub fn square(mut self) -> Self {
        let side = self.width.min(self.height);
        self.width = side;
        self.height = side;
        self
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.width == 0 || self.height == 0 {
            return Err(ProviderError::InvalidRequest(format!(
                "image dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.steps == 0 {
            return Err(ProviderError::InvalidRequest(
                "image steps must be positive".to_string(),
            ));
        }
        if !self.cfg_scale.is_finite() || self.cfg_scale <= 0.0 {
            return Err(ProviderError::InvalidRequest(format!(
                "cfg_scale must be positive, got {}",
                self.cfg_scale
            )));
        }
        if !IMAGE_FORMATS.contains(&self.format.as_str()) {
            return Err(ProviderError::InvalidRequest(format!(
                "unsupported image format '{}'",
                self.format
            )));
        }
        Ok(())
    }
}
