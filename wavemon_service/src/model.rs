//! Core data types for the harbour wave monitoring service.
//!
//! This module defines the shared domain model imported by all other modules:
//! the parsed conditions record, the persisted wave report document, and the
//! error taxonomy for a scrape run. It contains no I/O.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Status tags
// ---------------------------------------------------------------------------

/// Value of the top-level `status` key of a freshly built report.
///
/// Stored documents keep `status` as a plain string, since a retained
/// document may carry whatever an earlier run wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    Success,
    PartialData,
    Error,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Success => "success",
            ReportStatus::PartialData => "partial_data",
            ReportStatus::Error => "error",
        }
    }
}

/// Value of the top-level `data_quality` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataQuality {
    Complete,
    Incomplete,
    Error,
}

impl DataQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataQuality::Complete => "complete",
            DataQuality::Incomplete => "incomplete",
            DataQuality::Error => "error",
        }
    }
}

/// `last_scrape_status` written when incomplete data is discarded in favour
/// of the stored record.
pub const STATUS_INCOMPLETE_SKIPPED: &str = "incomplete_data_skipped";

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// The nine marine-weather fields read off the harbour status image.
///
/// Every field is `None` until a parsing rule recognises a value for it.
/// `tide` has no parsing rule and is always `None`; it is kept so the
/// document schema stays stable for consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionsRecord {
    pub max_wave_height: Option<f64>, // metres
    pub sig_wave_height: Option<f64>, // metres
    pub wave_period: Option<f64>,     // seconds
    pub tide: Option<f64>,
    pub wind_speed: Option<f64>, // knots
    pub wind_gust: Option<f64>,  // knots
    pub wind_direction: Option<String>, // compass point, e.g. "NE"
    pub water_temp: Option<f64>, // °C
    pub air_temp: Option<f64>,   // °C
}

/// Output of one successful OCR + select + parse pass, before any decision
/// about whether it gets published.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Header lines followed by the selected condition lines, newline-joined.
    pub formatted_output: String,
    /// The selected condition lines, in keyword order, before parsing.
    pub raw_conditions: Vec<String>,
    pub conditions: ConditionsRecord,
}

// ---------------------------------------------------------------------------
// Persisted document
// ---------------------------------------------------------------------------

/// The `parsed_data` object of a wave report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedData {
    pub title: Option<String>,
    pub location: Option<String>,
    pub time_label: Option<String>,
    pub conditions: ConditionsRecord,
    #[serde(default)]
    pub raw_conditions: Vec<String>,
}

/// The persisted unit of record, stored as `wave_data.json`.
///
/// Timestamps are kept as the strings that appear in the document
/// (ISO 8601 UTC with a trailing `Z`, and `dd/mm/yyyy HH:MM UTC` for
/// `last_updated`). Keys this struct does not know about are collected in
/// `extra` so an annotated rewrite never drops them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveReport {
    pub timestamp: String,
    pub location: String,
    pub last_updated: String,
    pub status: String,
    pub data_quality: String,
    pub scrape_attempt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub raw_data: Option<String>,
    pub parsed_data: ParsedData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scrape_attempt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scrape_status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A single failed HTTP exchange, classified for retry decisions and logs.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportFault {
    /// Connect or read timed out.
    Timeout(String),
    /// The body stream ended early or a chunk could not be decoded.
    Truncated(String),
    /// Non-2xx HTTP response.
    Status(u16),
    /// Any other request failure (DNS, TLS, connection refused, ...).
    Request(String),
}

impl std::fmt::Display for TransportFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportFault::Timeout(msg) => write!(f, "timeout: {}", msg),
            TransportFault::Truncated(msg) => write!(f, "truncated body: {}", msg),
            TransportFault::Status(code) => write!(f, "HTTP error: {}", code),
            TransportFault::Request(msg) => write!(f, "request failed: {}", msg),
        }
    }
}

impl std::error::Error for TransportFault {}

/// Everything that can abort a scrape run before a conditions record exists.
///
/// None of these escape a run: each is turned into a fallback document by
/// the publisher. `Display` gives the human `error_message`, and
/// [`ScrapeError::status_tag`] the machine `last_scrape_status`.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeError {
    /// The harbour-conditions page itself could not be fetched.
    PageFetchFailed(TransportFault),
    /// The page has no `<img>` with the configured element id.
    ImageTagNotFound,
    /// The image URL answered with a non-image content type.
    NonImageResponse(String),
    /// Every download attempt failed; carries the last fault seen.
    DownloadExhausted { attempts: u32, last: TransportFault },
    /// The downloaded bytes are not a decodable bitmap.
    ImageDecodeError(String),
    /// Anything else, including OCR engine failures.
    UnexpectedError(String),
}

impl ScrapeError {
    /// Short machine-readable tag written to `last_scrape_status` when a
    /// stored document is annotated instead of replaced.
    pub fn status_tag(&self) -> String {
        match self {
            ScrapeError::PageFetchFailed(fault) => format!("page_fetch_failed: {}", fault),
            ScrapeError::ImageTagNotFound => "image_tag_not_found".to_string(),
            ScrapeError::NonImageResponse(_) => "non_image_response".to_string(),
            ScrapeError::DownloadExhausted { last, .. } => format!("download_failed: {}", last),
            ScrapeError::ImageDecodeError(msg) => format!("image_error: {}", msg),
            ScrapeError::UnexpectedError(msg) => format!("unexpected_error: {}", msg),
        }
    }
}

impl std::fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScrapeError::PageFetchFailed(fault) => write!(f, "Webpage fetch failed: {}", fault),
            ScrapeError::ImageTagNotFound => write!(f, "Image tag not found"),
            ScrapeError::NonImageResponse(_) => write!(f, "Non-image response received"),
            ScrapeError::DownloadExhausted { attempts, last } => write!(
                f,
                "Image download failed: gave up after {} attempts, last error: {}",
                attempts, last
            ),
            ScrapeError::ImageDecodeError(msg) => write!(f, "Image processing error: {}", msg),
            ScrapeError::UnexpectedError(msg) => write!(f, "Unexpected error: {}", msg),
        }
    }
}

impl std::error::Error for ScrapeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScrapeError::PageFetchFailed(fault) => Some(fault),
            ScrapeError::DownloadExhausted { last, .. } => Some(last),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
