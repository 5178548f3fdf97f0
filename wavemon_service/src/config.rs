//! Runtime configuration for a scrape run.
//!
//! Every setting has a built-in default, so the service runs with no
//! configuration at all. An optional `wavemon.toml` in the working directory
//! overrides individual keys, and two environment variables (also read from
//! `.env`) override the output and log locations for scheduled jobs.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::logging::LogLevel;

/// Default config file, looked up relative to the working directory.
pub const CONFIG_FILE: &str = "wavemon.toml";

pub const ENV_OUTPUT_DIR: &str = "WAVEMON_OUTPUT_DIR";
pub const ENV_LOG_FILE: &str = "WAVEMON_LOG_FILE";

// ---------------------------------------------------------------------------
// Partial-data policy
// ---------------------------------------------------------------------------

/// What to do with a parsed record that fails the completeness check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialPolicy {
    /// Keep the stored record and only annotate the attempt.
    #[default]
    RetainPrevious,
    /// Overwrite the stored record, leaving missing fields null.
    PublishWithNulls,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Harbour-conditions page that embeds the status image.
    pub page_url: String,
    /// `id` attribute of the `<img>` element carrying the status image.
    pub image_element_id: String,
    pub user_agent: String,
    /// Total download attempts for the image.
    pub max_retries: u32,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
    pub output_dir: PathBuf,
    /// Station name written into every document.
    pub location: String,
    /// Scale applied to the bitmap before OCR.
    pub upscale_factor: f32,
    pub partial_policy: PartialPolicy,
    pub tesseract_command: String,
    pub ocr_language: String,
    pub log_level: String,
    pub log_file: Option<String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            page_url: "https://www.port-tauranga.co.nz/operations/harbour-conditions/".to_string(),
            image_element_id: "harbour".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3"
                .to_string(),
            max_retries: 3,
            timeout_secs: 30,
            output_dir: PathBuf::from("wave-scrape-app/data"),
            location: "Mauao Wave Buoy".to_string(),
            upscale_factor: 1.5,
            partial_policy: PartialPolicy::RetainPrevious,
            tesseract_command: "tesseract".to_string(),
            ocr_language: "eng".to_string(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// Errors raised while reading the config file.
#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config read error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl ScrapeConfig {
    /// Load `wavemon.toml` (if present) and apply environment overrides.
    ///
    /// Never fails outright: an unreadable or malformed file yields the
    /// defaults plus the error, and the environment overrides are applied
    /// either way.
    pub fn load() -> (Self, Option<ConfigError>) {
        dotenv::dotenv().ok();
        Self::load_from(
            Path::new(CONFIG_FILE),
            std::env::var(ENV_OUTPUT_DIR).ok(),
            std::env::var(ENV_LOG_FILE).ok(),
        )
    }

    /// [`ScrapeConfig::load`] with the file path and override values given
    /// explicitly.
    pub fn load_from(
        path: &Path,
        output_dir: Option<String>,
        log_file: Option<String>,
    ) -> (Self, Option<ConfigError>) {
        let (mut config, error) = match Self::from_file_or_default(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        };
        config.apply_overrides(output_dir, log_file);
        (config, error)
    }

    /// Parse the given file, or return the defaults when it does not exist.
    pub fn from_file_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Environment overrides win over the file. Empty values are ignored.
    pub fn apply_overrides(&mut self, output_dir: Option<String>, log_file: Option<String>) {
        if let Some(dir) = output_dir.filter(|d| !d.trim().is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(file) = log_file.filter(|f| !f.trim().is_empty()) {
            self.log_file = Some(file);
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parsed `log_level`; unknown names fall back to `Info`.
    pub fn min_log_level(&self) -> LogLevel {
        match self.log_level.trim().to_ascii_lowercase().as_str() {
            "debug" => LogLevel::Debug,
            "warn" | "warning" => LogLevel::Warning,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
