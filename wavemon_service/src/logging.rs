/// Structured logging for the wave monitoring service
///
/// Provides context-rich logging tagged with the pipeline stage that
/// produced each message, timestamps, and severity levels. Supports both
/// console output and file-based logging for scheduled runs.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::ScrapeError;
use crate::publish::PublishAction;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Page,
    Image,
    Ocr,
    Parse,
    Store,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Page => write!(f, "PAGE"),
            Stage::Image => write!(f, "IMAGE"),
            Stage::Ocr => write!(f, "OCR"),
            Stage::Parse => write!(f, "PARSE"),
            Stage::Store => write!(f, "STORE"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - upstream page is in maintenance or was redesigned
    Expected,
    /// Unexpected failure - indicates a bug, a broken image, or a missing OCR engine
    Unexpected,
    /// Unknown - transient network trouble that may or may not clear up
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut guard) = LOGGER.lock() {
            *guard = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, stage: Stage, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = format_entry(Utc::now(), level, stage, message);

        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}: {}", stage, message),
                LogLevel::Warning => eprintln!("   ⚠ {}: {}", stage, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

/// One log line as written to the log file.
fn format_entry(
    at: chrono::DateTime<Utc>,
    level: LogLevel,
    stage: Stage,
    message: &str,
) -> String {
    format!(
        "{} {} {}: {}",
        at.format("%Y-%m-%d %H:%M:%S UTC"),
        level,
        stage,
        message
    )
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn emit(level: LogLevel, stage: Stage, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, stage, message);
        }
    }
}

/// Log a general informational message
pub fn info(stage: Stage, message: &str) {
    emit(LogLevel::Info, stage, message);
}

/// Log a warning message
pub fn warn(stage: Stage, message: &str) {
    emit(LogLevel::Warning, stage, message);
}

/// Log an error message
pub fn error(stage: Stage, message: &str) {
    emit(LogLevel::Error, stage, message);
}

/// Log a debug message
pub fn debug(stage: Stage, message: &str) {
    emit(LogLevel::Debug, stage, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a scrape failure by how much attention it deserves.
pub fn classify_failure(err: &ScrapeError) -> FailureType {
    match err {
        // The page is reachable but does not carry the image right now;
        // the harbour site does this during maintenance.
        ScrapeError::ImageTagNotFound | ScrapeError::NonImageResponse(_) => FailureType::Expected,
        ScrapeError::PageFetchFailed(_) | ScrapeError::DownloadExhausted { .. } => {
            FailureType::Unknown
        }
        ScrapeError::ImageDecodeError(_) | ScrapeError::UnexpectedError(_) => {
            FailureType::Unexpected
        }
    }
}

/// The pipeline stage a failure belongs to.
pub fn failure_stage(err: &ScrapeError) -> Stage {
    match err {
        ScrapeError::PageFetchFailed(_) | ScrapeError::ImageTagNotFound => Stage::Page,
        ScrapeError::NonImageResponse(_)
        | ScrapeError::DownloadExhausted { .. }
        | ScrapeError::ImageDecodeError(_) => Stage::Image,
        ScrapeError::UnexpectedError(_) => Stage::System,
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a scrape failure with automatic classification
pub fn log_scrape_failure(err: &ScrapeError) {
    let failure_type = classify_failure(err);
    let message = format!("scrape failed [{}]: {}", failure_type, err);
    let stage = failure_stage(err);

    match failure_type {
        FailureType::Expected => debug(stage, &message),
        FailureType::Unexpected => error(stage, &message),
        FailureType::Unknown => warn(stage, &message),
    }
}

// ---------------------------------------------------------------------------
// Publish Summary Logging
// ---------------------------------------------------------------------------

/// Log what the publisher did with this run's result
pub fn log_publish_summary(action: &PublishAction) {
    let message = format!("Publish complete: {}", action);

    match action {
        PublishAction::Replaced => info(Stage::Store, &message),
        PublishAction::PublishedIncomplete
        | PublishAction::RetainedPrevious
        | PublishAction::AnnotatedPrevious => warn(Stage::Store, &message),
        PublishAction::SkippedNoPrevious | PublishAction::WroteErrorDocument => {
            error(Stage::Store, &message)
        }
    }
}
