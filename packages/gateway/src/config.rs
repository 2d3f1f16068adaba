//! Configuration constants, loading and validation for the composer.

use std::path::Path;
use std::sync::LazyLock;

use composer_markup::ExtractorConfig;
use regex::Regex;
use serde::Deserialize;

use crate::error::{ComposerError, Result};

/// Default element whose inner markup is a fragment's content.
pub const DEFAULT_CONTENT_TAG: &str = "rewe-digital-content";

/// Default element marking where a fragment is included.
pub const DEFAULT_INCLUDE_TAG: &str = "rewe-digital-include";

/// Default attribute carrying asset options.
pub const DEFAULT_ASSET_OPTIONS_ATTRIBUTE: &str = "data-rd-options";

/// Default maximum depth for fragments including other fragments.
pub const DEFAULT_MAX_RECURSION: usize = 5;

/// HTTP timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Default maximum HTTP response size in bytes (10 MB).
///
/// Templates and fragments are HTML pages; anything larger is almost certainly
/// a misrouted download.
pub const DEFAULT_MAX_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;

/// Header prefix marking session entries.
pub const SESSION_HEADER_PREFIX: &str = "x-rd-";

/// Tag and attribute name pattern.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9:_.-]*$").expect("valid regex"));

/// Absolute http(s) URL.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/?#]+[^\s]*$").expect("valid regex"));

/// Composer configuration.
///
/// Every field has a default, so an empty YAML document is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComposerConfig {
    /// Element whose inner markup is a fragment's content.
    pub content_tag: String,
    /// Element marking where a fragment is included.
    pub include_tag: String,
    /// Attribute whose value must contain `include` for a head asset to be
    /// forwarded.
    pub asset_options_attribute: String,
    /// Maximum nesting depth of fragments including fragments.
    pub max_recursion: usize,
    /// HTTP timeout per request, in seconds.
    pub timeout_secs: u64,
    /// Maximum accepted response size, in bytes.
    pub max_response_size: u64,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            content_tag: DEFAULT_CONTENT_TAG.to_string(),
            include_tag: DEFAULT_INCLUDE_TAG.to_string(),
            asset_options_attribute: DEFAULT_ASSET_OPTIONS_ATTRIBUTE.to_string(),
            max_recursion: DEFAULT_MAX_RECURSION,
            timeout_secs: HTTP_TIMEOUT_SECS,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
        }
    }
}

impl ComposerConfig {
    /// Parse a YAML configuration and validate it.
    ///
    /// # Examples
    /// ```
    /// use composer_gateway::config::ComposerConfig;
    ///
    /// let config = ComposerConfig::from_yaml_str("content_tag: main-content\n").unwrap();
    /// assert_eq!(config.content_tag, "main-content");
    /// assert_eq!(config.include_tag, "rewe-digital-include");
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Self::from_yaml_str(&yaml)
    }

    /// Apply `COMPOSER_*` environment variable overrides and validate.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(value) = lookup("COMPOSER_CONTENT_TAG") {
            self.content_tag = value;
        }
        if let Some(value) = lookup("COMPOSER_INCLUDE_TAG") {
            self.include_tag = value;
        }
        if let Some(value) = lookup("COMPOSER_ASSET_OPTIONS_ATTRIBUTE") {
            self.asset_options_attribute = value;
        }
        if let Some(value) = lookup("COMPOSER_MAX_RECURSION") {
            self.max_recursion = parse_number("COMPOSER_MAX_RECURSION", &value)?;
        }
        if let Some(value) = lookup("COMPOSER_TIMEOUT_SECS") {
            self.timeout_secs = parse_number("COMPOSER_TIMEOUT_SECS", &value)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check names and limits.
    pub fn validate(&self) -> Result<()> {
        validate_name("content_tag", &self.content_tag)?;
        validate_name("include_tag", &self.include_tag)?;
        validate_name("asset_options_attribute", &self.asset_options_attribute)?;

        if self.content_tag.eq_ignore_ascii_case(&self.include_tag) {
            return Err(ComposerError::Config(format!(
                "content_tag and include_tag must differ, both are '{}'",
                self.content_tag
            )));
        }
        if self.max_recursion == 0 {
            return Err(ComposerError::Config(
                "max_recursion must be at least 1".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ComposerError::Config(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Names the markup extractor matches against.
    #[must_use]
    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig::new(&self.content_tag, &self.asset_options_attribute)
    }
}

fn validate_name(field: &str, value: &str) -> Result<()> {
    if NAME_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(ComposerError::Config(format!(
            "{field} '{value}' is not a valid tag or attribute name"
        )))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ComposerError::Config(format!("{key} must be a number, got '{value}'")))
}

/// Validate that a URL is an absolute http(s) URL.
///
/// # Examples
/// ```
/// use composer_gateway::config::validate_url;
///
/// assert!(validate_url("http://localhost:8080/template").is_ok());
/// assert!(validate_url("/relative/path").is_err());
/// ```
pub fn validate_url(url: &str) -> Result<()> {
    if URL_PATTERN.is_match(url) {
        Ok(())
    } else {
        Err(ComposerError::InvalidUrl(url.to_string()))
    }
}

/// Split a `KEY=VALUE` session argument.
///
/// # Examples
/// ```
/// use composer_gateway::config::parse_session_value;
///
/// assert_eq!(
///     parse_session_value("user=42").unwrap(),
///     ("user".to_string(), "42".to_string())
/// );
/// assert!(parse_session_value("user").is_err());
/// ```
pub fn parse_session_value(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ComposerError::InvalidSessionValue(raw.to_string())),
    }
}
