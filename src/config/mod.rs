//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `TENDERLENS_*` environment variables; the
//! vision backend is configured with the usual `OPENAI_*` variables.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_JPEG_QUALITY, DEFAULT_OCR_MAX_TOKENS, DEFAULT_OCR_MODEL, DEFAULT_RENDER_DPI,
    MIN_NATIVE_TEXT_CHARS, OcrSettings,
};

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Heading keywords used as the generic terminator when a question has no numbering scheme.
pub const DEFAULT_HEADING_KEYWORDS: &[&str] = &["Award Criterion", "Criterion", "Section", "Question"];

/// API key wrapper that never prints its value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Runtime configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for the persistent OCR cache. Default: `./.data/ocr-cache`.
    pub cache_path: PathBuf,

    /// Max entries in the in-memory OCR cache tier. Default: `10_000`.
    pub cache_capacity: u64,

    /// Rasterization, encoding and detection thresholds.
    pub ocr: OcrSettings,

    /// Upper bound on a single vision request. Default: `120s`.
    pub ocr_timeout: Duration,

    /// `pdftoppm` binary used for rasterization. Default: `pdftoppm` from `PATH`.
    pub pdftoppm_path: PathBuf,

    /// Keywords for the generic next-heading terminator.
    pub heading_keywords: Vec<String>,

    /// Vision backend key. `None` disables the OCR fallback.
    pub openai_api_key: Option<ApiKey>,

    /// Vision backend base URL. Default: `https://api.openai.com/v1`.
    pub openai_base_url: String,

    /// Vision model identifier. Default: `gpt-4o`.
    pub ocr_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from("./.data/ocr-cache"),
            cache_capacity: 10_000,
            ocr: OcrSettings::default(),
            ocr_timeout: Duration::from_secs(120),
            pdftoppm_path: PathBuf::from("pdftoppm"),
            heading_keywords: DEFAULT_HEADING_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            ocr_model: DEFAULT_OCR_MODEL.to_string(),
        }
    }
}

impl Config {
    const ENV_CACHE_PATH: &'static str = "TENDERLENS_CACHE_PATH";
    const ENV_CACHE_CAPACITY: &'static str = "TENDERLENS_CACHE_CAPACITY";
    const ENV_RENDER_DPI: &'static str = "TENDERLENS_RENDER_DPI";
    const ENV_JPEG_QUALITY: &'static str = "TENDERLENS_JPEG_QUALITY";
    const ENV_MIN_NATIVE_CHARS: &'static str = "TENDERLENS_MIN_NATIVE_CHARS";
    const ENV_OCR_MAX_TOKENS: &'static str = "TENDERLENS_OCR_MAX_TOKENS";
    const ENV_OCR_TIMEOUT_SECS: &'static str = "TENDERLENS_OCR_TIMEOUT_SECS";
    const ENV_PDFTOPPM_PATH: &'static str = "TENDERLENS_PDFTOPPM_PATH";
    const ENV_HEADING_KEYWORDS: &'static str = "TENDERLENS_HEADING_KEYWORDS";
    const ENV_OPENAI_API_KEY: &'static str = "OPENAI_API_KEY";
    const ENV_OPENAI_BASE_URL: &'static str = "OPENAI_BASE_URL";
    const ENV_OPENAI_MODEL: &'static str = "OPENAI_MODEL";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let cache_path = Self::parse_path_from_env(Self::ENV_CACHE_PATH, defaults.cache_path);
        let cache_capacity = Self::parse_number_from_env(Self::ENV_CACHE_CAPACITY)?
            .unwrap_or(defaults.cache_capacity);

        let ocr = OcrSettings {
            render_dpi: Self::parse_number_from_env(Self::ENV_RENDER_DPI)?
                .unwrap_or(DEFAULT_RENDER_DPI),
            jpeg_quality: Self::parse_number_from_env(Self::ENV_JPEG_QUALITY)?
                .unwrap_or(DEFAULT_JPEG_QUALITY),
            min_native_chars: Self::parse_number_from_env(Self::ENV_MIN_NATIVE_CHARS)?
                .unwrap_or(MIN_NATIVE_TEXT_CHARS),
            max_tokens: Self::parse_number_from_env(Self::ENV_OCR_MAX_TOKENS)?
                .unwrap_or(DEFAULT_OCR_MAX_TOKENS),
        };

        let ocr_timeout = Self::parse_number_from_env::<u64>(Self::ENV_OCR_TIMEOUT_SECS)?
            .map(Duration::from_secs)
            .unwrap_or(defaults.ocr_timeout);

        let pdftoppm_path = Self::parse_path_from_env(Self::ENV_PDFTOPPM_PATH, defaults.pdftoppm_path);

        let heading_keywords = match Self::parse_optional_string_from_env(Self::ENV_HEADING_KEYWORDS)
        {
            Some(raw) => parse_keyword_list(&raw),
            None => defaults.heading_keywords,
        };

        let openai_api_key =
            Self::parse_optional_string_from_env(Self::ENV_OPENAI_API_KEY).map(ApiKey::new);
        let openai_base_url = Self::parse_optional_string_from_env(Self::ENV_OPENAI_BASE_URL)
            .unwrap_or(defaults.openai_base_url);
        let ocr_model = Self::parse_optional_string_from_env(Self::ENV_OPENAI_MODEL)
            .unwrap_or(defaults.ocr_model);

        Ok(Self {
            cache_path,
            cache_capacity,
            ocr,
            ocr_timeout,
            pdftoppm_path,
            heading_keywords,
            openai_api_key,
            openai_base_url,
            ocr_model,
        })
    }

    /// Validates ranges and paths (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ocr.validate()?;

        if self.heading_keywords.is_empty() {
            return Err(ConfigError::EmptyHeadingKeywords);
        }

        if self.cache_path.exists() && !self.cache_path.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.cache_path.clone(),
            });
        }

        Ok(())
    }

    /// Returns `true` if a vision backend can be constructed.
    pub fn has_ocr_backend(&self) -> bool {
        self.openai_api_key.is_some()
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        Self::parse_optional_string_from_env(var_name)
            .map(PathBuf::from)
            .unwrap_or(default)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_number_from_env<T>(var_name: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr<Err = std::num::ParseIntError>,
    {
        match Self::parse_optional_string_from_env(var_name) {
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|source| ConfigError::InvalidNumber {
                    name: var_name,
                    value,
                    source,
                }),
            None => Ok(None),
        }
    }
}

/// Splits a comma-separated keyword list, dropping blanks.
pub fn parse_keyword_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}
