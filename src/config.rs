//! Process configuration, loaded once at startup.
//!
//! [`Settings`] is read from the environment (optionally seeded from a
//! `.env` file) and validated before anything else starts. It is then
//! handed to [`ExecCtx::from_settings`](crate::ExecCtx::from_settings)
//! and never consulted again.

use crate::client::{ImageOptions, TextOptions};
use crate::error::{PipelineError, Result};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.venice.ai/api/v1";
pub const DEFAULT_TEXT_MODEL: &str = "llama-3.2-3b";
pub const DEFAULT_IMAGE_MODEL: &str = "venice-sd35";

/// Connection settings for the provider.
#[derive(Clone)]
pub struct ProviderSettings {
    pub api_key: String,
    pub base_url: String,
    /// Deadline for each individual provider call.
    pub request_timeout: Duration,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Where the HTTP server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Complete, validated service configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub provider: ProviderSettings,
    pub text_model: String,
    pub text_options: TextOptions,
    pub image_model: String,
    pub image_options: ImageOptions,
    pub server: ServerSettings,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("VENICE_API_KEY").ok_or_else(|| {
            PipelineError::InvalidConfig(
                "Required environment variable 'VENICE_API_KEY' is not set. \
                 Check your .env file or system environment."
                    .to_string(),
            )
        })?;

        let style_preset = match lookup("IMAGE_STYLE_PRESET") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(v.trim().to_string()),
            None => Some("Digital Art".to_string()),
        };

        let settings = Settings {
            provider: ProviderSettings {
                api_key,
                base_url: get("VENICE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                request_timeout: Duration::from_secs(parse_or(&get, "REQUEST_TIMEOUT", 120u64)?),
            },
            text_model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            text_options: TextOptions::default()
                .with_temperature(parse_or(&get, "LLM_TEMPERATURE", 0.7)?)
                .with_max_tokens(parse_or(&get, "LLM_MAX_TOKENS", 1500)?),
            image_model: get("IMAGE_MODEL").unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            image_options: ImageOptions::default()
                .with_dimensions(
                    parse_or(&get, "IMAGE_WIDTH", 1080)?,
                    parse_or(&get, "IMAGE_HEIGHT", 1080)?,
                )
                .with_steps(parse_or(&get, "IMAGE_STEPS", 25)?)
                .with_cfg_scale(parse_or(&get, "IMAGE_CFG_SCALE", 7.5)?)
                .with_format(get("IMAGE_FORMAT").unwrap_or_else(|| "webp".to_string()))
                .with_style_preset(style_preset),
            server: ServerSettings {
                host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&get, "PORT", 8000)?,
            },
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Check every value; the first problem wins.
    pub fn validate(&self) -> Result<()> {
        if self.provider.api_key.trim().is_empty() {
            return Err(PipelineError::InvalidConfig("VENICE_API_KEY is empty".into()));
        }
        let base = url::Url::parse(&self.provider.base_url).map_err(|e| {
            PipelineError::InvalidConfig(format!(
                "VENICE_BASE_URL '{}' is not a URL: {}",
                self.provider.base_url, e
            ))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(PipelineError::InvalidConfig(format!(
                "VENICE_BASE_URL must be http or https, got '{}'",
                base.scheme()
            )));
        }
        if self.provider.request_timeout.is_zero() {
            return Err(PipelineError::InvalidConfig(
                "REQUEST_TIMEOUT must be positive".into(),
            ));
        }
        if self.text_model.is_empty() || self.image_model.is_empty() {
            return Err(PipelineError::InvalidConfig("model identifiers must be set".into()));
        }
        self.text_options
            .validate()
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
        self.image_options
            .validate()
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
        Ok(())
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.parse::<T>().map_err(|e| {
            PipelineError::InvalidConfig(format!("{}='{}' is invalid: {}", key, raw, e))
        }),
    }
}

/// Load variables from a `.env` file into the process environment.
///
/// With `path = None` the usual search applies and a missing file is fine.
/// An explicit path must exist. A malformed file is always an error.
pub fn load_env(path: Option<&Path>) -> Result<()> {
    let loaded = match path {
        Some(p) => dotenvy::from_path(p).map(|_| p.to_path_buf()),
        None => dotenvy::dotenv(),
    };
    match loaded {
        Ok(path) => {
            tracing::info!("Loaded environment from: {}", path.display());
            Ok(())
        }
        Err(dotenvy::Error::Io(_)) if path.is_none() => {
            tracing::debug!("No .env file found - using system environment variables only");
            Ok(())
        }
        Err(dotenvy::Error::LineParse(line, pos)) => Err(PipelineError::InvalidConfig(format!(
            "Failed to parse .env file at line {}, position {}",
            line, pos
        ))),
        Err(e) => Err(PipelineError::InvalidConfig(format!(
            "Failed to load .env file: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_only_api_key() {
        let s = Settings::from_lookup(lookup(&[("VENICE_API_KEY", "vk-test")])).unwrap();
        assert_eq!(s.provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(s.provider.request_timeout, Duration::from_secs(120));
        assert_eq!(s.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(s.text_options.temperature, 0.7);
        assert_eq!(s.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!((s.image_options.width, s.image_options.height), (1080, 1080));
        assert_eq!(s.image_options.style_preset.as_deref(), Some("Digital Art"));
        assert_eq!(s.server.bind_address(), "0.0.0.0:8000");
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let err = Settings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
        assert!(err.to_string().contains("VENICE_API_KEY"));
    }

    #[test]
    fn test_overrides_are_applied() {
        let s = Settings::from_lookup(lookup(&[
            ("VENICE_API_KEY", "k"),
            ("LLM_MODEL", "qwen3-4b"),
            ("LLM_TEMPERATURE", "1.2"),
            ("IMAGE_WIDTH", "1280"),
            ("IMAGE_HEIGHT", "720"),
            ("IMAGE_FORMAT", "png"),
            ("IMAGE_STYLE_PRESET", ""),
            ("REQUEST_TIMEOUT", "15"),
            ("PORT", "9090"),
        ]))
        .unwrap();
        assert_eq!(s.text_model, "qwen3-4b");
        assert_eq!(s.text_options.temperature, 1.2);
        assert_eq!((s.image_options.width, s.image_options.height), (1280, 720));
        assert_eq!(s.image_options.format, "png");
        assert!(s.image_options.style_preset.is_none());
        assert_eq!(s.provider.request_timeout, Duration::from_secs(15));
        assert_eq!(s.server.port, 9090);
    }

    #[test]
    fn test_unparsable_value_is_not_defaulted() {
        let err = Settings::from_lookup(lookup(&[
            ("VENICE_API_KEY", "k"),
            ("IMAGE_STEPS", "many"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("IMAGE_STEPS"));
    }

    #[test]
    fn test_out_of_range_temperature_rejected() {
        assert!(Settings::from_lookup(lookup(&[
            ("VENICE_API_KEY", "k"),
            ("LLM_TEMPERATURE", "2.5"),
        ]))
        .is_err());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(Settings::from_lookup(lookup(&[
            ("VENICE_API_KEY", "k"),
            ("IMAGE_HEIGHT", "0"),
        ]))
        .is_err());
    }

    #[test]
    fn test_bad_base_url_rejected() {
        assert!(Settings::from_lookup(lookup(&[
            ("VENICE_API_KEY", "k"),
            ("VENICE_BASE_URL", "ftp://example.com"),
        ]))
        .is_err());
        assert!(Settings::from_lookup(lookup(&[
            ("VENICE_API_KEY", "k"),
            ("VENICE_BASE_URL", "not a url"),
        ]))
        .is_err());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let s = Settings::from_lookup(lookup(&[("VENICE_API_KEY", "vk-secret-123")])).unwrap();
        assert!(!format!("{:?}", s).contains("vk-secret-123"));
    }

    #[test]
    fn test_explicit_missing_env_file_is_an_error() {
        let result = load_env(Some(Path::new("/nonexistent/dir/.env")));
        assert!(result.is_err());
    }
}
