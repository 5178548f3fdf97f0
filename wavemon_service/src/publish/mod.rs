//! Publication decisions over the single stored wave report.
//!
//! The stored `wave_data.json` is only replaced by a complete record (or,
//! under `PublishWithNulls`, by an incomplete one). Every other outcome
//! keeps the stored document and layers `last_scrape_attempt` /
//! `last_scrape_status` onto it. If there is nothing stored yet, a failed
//! run writes an all-null error document so consumers always find a
//! well-formed file.
//!
//! # Clock injection
//! `publish_at` takes `now` so documents are deterministic in tests;
//! `publish` is the wrapper that uses the real time.
//!
//! The read-modify-write on the JSON file is not guarded against a
//! concurrent run; the scheduler must not overlap invocations.

pub mod artifacts;
pub mod store;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Map;

use crate::config::{PartialPolicy, ScrapeConfig};
use crate::logging::{self, Stage};
use crate::model::{
    ConditionsRecord, DataQuality, Extraction, ParsedData, ReportStatus, STATUS_INCOMPLETE_SKIPPED,
    ScrapeError, WaveReport,
};
use crate::quality;

use artifacts::StatusLine;
use store::{display_utc, iso_utc};

pub const JSON_FILE: &str = "wave_data.json";
pub const DEBUG_TEXT_FILE: &str = "portDataScrape.txt";
pub const HTML_FILE: &str = "index.html";

/// What a run produced, as seen by the publisher.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Extracted(Extraction),
    Failed(ScrapeError),
}

/// What the publisher did with the stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishAction {
    /// Complete record written over the stored one.
    Replaced,
    /// Incomplete record written with nulls (`PublishWithNulls`).
    PublishedIncomplete,
    /// Incomplete record discarded; stored record annotated.
    RetainedPrevious,
    /// Incomplete record discarded and nothing stored yet; no write.
    SkippedNoPrevious,
    /// Run failed; stored record annotated with the failure.
    AnnotatedPrevious,
    /// Run failed with nothing stored; all-null error document written.
    WroteErrorDocument,
}

impl fmt::Display for PublishAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishAction::Replaced => write!(f, "complete data, JSON updated"),
            PublishAction::PublishedIncomplete => {
                write!(f, "incomplete data, JSON written with null fields")
            }
            PublishAction::RetainedPrevious => {
                write!(f, "incomplete data, previous good data kept")
            }
            PublishAction::SkippedNoPrevious => {
                write!(f, "incomplete data and no previous data, no JSON written")
            }
            PublishAction::AnnotatedPrevious => {
                write!(f, "run failed, previous data kept and annotated")
            }
            PublishAction::WroteErrorDocument => {
                write!(f, "run failed with no previous data, error JSON written")
            }
        }
    }
}

pub struct Publisher {
    output_dir: PathBuf,
    location: String,
    partial_policy: PartialPolicy,
}

impl Publisher {
    pub fn new(output_dir: impl Into<PathBuf>, location: &str, partial_policy: PartialPolicy) -> Self {
        Self {
            output_dir: output_dir.into(),
            location: location.to_string(),
            partial_policy,
        }
    }

    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self::new(&config.output_dir, &config.location, config.partial_policy)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn json_path(&self) -> PathBuf {
        self.output_dir.join(JSON_FILE)
    }

    /// Publish using the current time.
    pub fn publish(&self, outcome: &Outcome) -> io::Result<PublishAction> {
        self.publish_at(outcome, Utc::now())
    }

    pub fn publish_at(&self, outcome: &Outcome, now: DateTime<Utc>) -> io::Result<PublishAction> {
        match outcome {
            Outcome::Extracted(extraction) => self.publish_extraction(extraction, now),
            Outcome::Failed(err) => self.publish_failure(err, now),
        }
    }

    // -----------------------------------------------------------------------
    // Success and partial-data paths
    // -----------------------------------------------------------------------

    fn publish_extraction(
        &self,
        extraction: &Extraction,
        now: DateTime<Utc>,
    ) -> io::Result<PublishAction> {
        let complete = quality::is_complete(&extraction.conditions);

        let (action, status_line) = if complete {
            let report = self.fresh_report(extraction, ReportStatus::Success, DataQuality::Complete, now);
            store::write_report(&self.json_path(), &report)?;
            logging::info(
                Stage::Parse,
                &format!(
                    "Wave height: {}m, wind: {} knots {}",
                    show(&extraction.conditions.max_wave_height),
                    show(&extraction.conditions.wind_speed),
                    show(&extraction.conditions.wind_direction),
                ),
            );
            (PublishAction::Replaced, StatusLine::Complete)
        } else {
            logging::warn(
                Stage::Parse,
                &format!(
                    "Missing fields: {}",
                    quality::missing_fields(&extraction.conditions).join(", ")
                ),
            );
            match self.partial_policy {
                PartialPolicy::PublishWithNulls => {
                    let report = self.fresh_report(
                        extraction,
                        ReportStatus::PartialData,
                        DataQuality::Incomplete,
                        now,
                    );
                    store::write_report(&self.json_path(), &report)?;
                    (PublishAction::PublishedIncomplete, StatusLine::IncompleteWithNulls)
                }
                PartialPolicy::RetainPrevious => {
                    let action = match store::load_report(&self.json_path()) {
                        Some(previous) => {
                            logging::info(
                                Stage::Store,
                                &format!("Last good data from: {}", previous.last_updated),
                            );
                            let annotated = annotate(previous, STATUS_INCOMPLETE_SKIPPED, now);
                            store::write_report(&self.json_path(), &annotated)?;
                            PublishAction::RetainedPrevious
                        }
                        None => PublishAction::SkippedNoPrevious,
                    };
                    (action, StatusLine::IncompleteUsingPrevious)
                }
            }
        };

        artifacts::write_debug_text(
            &self.output_dir.join(DEBUG_TEXT_FILE),
            &extraction.formatted_output,
        )?;
        artifacts::write_status_page(
            &self.output_dir.join(HTML_FILE),
            status_line,
            &extraction.formatted_output,
            JSON_FILE,
            now,
        )?;

        Ok(action)
    }

    fn fresh_report(
        &self,
        extraction: &Extraction,
        status: ReportStatus,
        quality: DataQuality,
        now: DateTime<Utc>,
    ) -> WaveReport {
        let header = |i: usize| {
            extraction
                .formatted_output
                .split('\n')
                .nth(i)
                .unwrap_or_default()
                .to_string()
        };

        WaveReport {
            timestamp: iso_utc(now),
            location: self.location.clone(),
            last_updated: display_utc(now),
            status: status.as_str().to_string(),
            data_quality: quality.as_str().to_string(),
            scrape_attempt: iso_utc(now),
            error_message: None,
            raw_data: Some(extraction.formatted_output.clone()),
            parsed_data: ParsedData {
                title: Some(header(0)),
                location: Some(header(1)),
                time_label: Some(header(2)),
                conditions: extraction.conditions.clone(),
                raw_conditions: extraction.raw_conditions.clone(),
            },
            last_scrape_attempt: None,
            last_scrape_status: None,
            extra: Map::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Hard-failure path
    // -----------------------------------------------------------------------

    fn publish_failure(&self, err: &ScrapeError, now: DateTime<Utc>) -> io::Result<PublishAction> {
        match store::load_report(&self.json_path()) {
            Some(previous) => {
                let annotated = annotate(previous, &err.status_tag(), now);
                store::write_report(&self.json_path(), &annotated)?;
                Ok(PublishAction::AnnotatedPrevious)
            }
            None => {
                store::write_report(&self.json_path(), &self.error_report(err, now))?;
                Ok(PublishAction::WroteErrorDocument)
            }
        }
    }

    fn error_report(&self, err: &ScrapeError, now: DateTime<Utc>) -> WaveReport {
        WaveReport {
            timestamp: iso_utc(now),
            location: self.location.clone(),
            last_updated: display_utc(now),
            status: ReportStatus::Error.as_str().to_string(),
            data_quality: DataQuality::Error.as_str().to_string(),
            scrape_attempt: iso_utc(now),
            error_message: Some(err.to_string()),
            raw_data: None,
            parsed_data: ParsedData {
                title: None,
                location: Some(self.location.clone()),
                time_label: None,
                conditions: ConditionsRecord::default(),
                raw_conditions: Vec::new(),
            },
            last_scrape_attempt: None,
            last_scrape_status: None,
            extra: Map::new(),
        }
    }
}

/// Keep the stored document as-is apart from the attempt annotation.
fn annotate(mut report: WaveReport, status: &str, now: DateTime<Utc>) -> WaveReport {
    report.last_scrape_attempt = Some(iso_utc(now));
    report.last_scrape_status = Some(status.to_string());
    report
}

fn show<T: fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "null".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransportFault;
    use chrono::TimeZone;
    use serde_json::Value;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    fn t1() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 30, 0).unwrap()
    }

    fn complete_extraction() -> Extraction {
        Extraction {
            formatted_output: "Title,\nMauao Wave Buoy,\nTime,\nMax wave height: 2.1 m\nWind: 12 knots\nDirection: NE"
                .to_string(),
            raw_conditions: vec![
                "Max wave height: 2.1 m".to_string(),
                "Wind: 12 knots".to_string(),
                "Direction: NE".to_string(),
            ],
            conditions: ConditionsRecord {
                max_wave_height: Some(2.1),
                wind_speed: Some(12.0),
                wind_direction: Some("NE".to_string()),
                ..ConditionsRecord::default()
            },
        }
    }

    fn incomplete_extraction() -> Extraction {
        Extraction {
            formatted_output: "Title,\nMauao Wave Buoy,\nTime,\nDirection: NE".to_string(),
            raw_conditions: vec!["Direction: NE".to_string()],
            conditions: ConditionsRecord {
                wind_direction: Some("NE".to_string()),
                ..ConditionsRecord::default()
            },
        }
    }

    fn publisher(dir: &Path, policy: PartialPolicy) -> Publisher {
        Publisher::new(dir, "Mauao Wave Buoy", policy)
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    // --- Success path -------------------------------------------------------

    #[test]
    fn test_complete_record_replaces_document_and_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let p = publisher(dir.path(), PartialPolicy::RetainPrevious);

        let action = p.publish_at(&Outcome::Extracted(complete_extraction()), t0()).unwrap();
        assert_eq!(action, PublishAction::Replaced);

        let doc = read_json(&p.json_path());
        assert_eq!(doc["status"], "success");
        assert_eq!(doc["data_quality"], "complete");
        assert_eq!(doc["timestamp"], "2024-05-01T13:00:00.000000Z");
        assert_eq!(doc["last_updated"], "01/05/2024 13:00 UTC");
        assert_eq!(doc["parsed_data"]["title"], "Title,");
        assert_eq!(doc["parsed_data"]["location"], "Mauao Wave Buoy,");
        assert_eq!(doc["parsed_data"]["time_label"], "Time,");
        assert_eq!(doc["parsed_data"]["conditions"]["max_wave_height"], 2.1);
        assert_eq!(doc["parsed_data"]["conditions"]["wind_direction"], "NE");
        assert!(doc.get("error_message").is_none());

        assert!(dir.path().join(DEBUG_TEXT_FILE).exists());
        let html = std::fs::read_to_string(dir.path().join(HTML_FILE)).unwrap();
        assert!(html.contains("Data Complete"));
    }

    #[test]
    fn test_complete_record_overwrites_previous_annotations() {
        let dir = tempfile::tempdir().unwrap();
        let p = publisher(dir.path(), PartialPolicy::RetainPrevious);
        p.publish_at(&Outcome::Extracted(complete_extraction()), t0()).unwrap();
        p.publish_at(&Outcome::Failed(ScrapeError::ImageTagNotFound), t1()).unwrap();
        p.publish_at(&Outcome::Extracted(complete_extraction()), t1()).unwrap();

        let doc = read_json(&p.json_path());
        assert!(doc.get("last_scrape_status").is_none(), "fresh record has no annotation");
        assert_eq!(doc["timestamp"], "2024-05-01T13:30:00.000000Z");
    }

    // --- Partial-data path --------------------------------------------------

    #[test]
    fn test_incomplete_record_keeps_previous_and_annotates() {
        let dir = tempfile::tempdir().unwrap();
        let p = publisher(dir.path(), PartialPolicy::RetainPrevious);
        p.publish_at(&Outcome::Extracted(complete_extraction()), t0()).unwrap();
        let before = read_json(&p.json_path());

        let action = p.publish_at(&Outcome::Extracted(incomplete_extraction()), t1()).unwrap();
        assert_eq!(action, PublishAction::RetainedPrevious);

        let after = read_json(&p.json_path());
        assert_eq!(after["parsed_data"], before["parsed_data"]);
        assert_eq!(after["status"], "success");
        assert_eq!(after["timestamp"], before["timestamp"]);
        assert_eq!(after["last_scrape_status"], STATUS_INCOMPLETE_SKIPPED);
        assert_eq!(after["last_scrape_attempt"], "2024-05-01T13:30:00.000000Z");

        let html = std::fs::read_to_string(dir.path().join(HTML_FILE)).unwrap();
        assert!(html.contains("Using Previous"));
        let text = std::fs::read_to_string(dir.path().join(DEBUG_TEXT_FILE)).unwrap();
        assert!(text.ends_with("Direction: NE"), "debug text reflects this run");
    }

    #[test]
    fn test_incomplete_record_with_nothing_stored_writes_no_json() {
        let dir = tempfile::tempdir().unwrap();
        let p = publisher(dir.path(), PartialPolicy::RetainPrevious);

        let action = p.publish_at(&Outcome::Extracted(incomplete_extraction()), t0()).unwrap();
        assert_eq!(action, PublishAction::SkippedNoPrevious);
        assert!(!p.json_path().exists());
        assert!(dir.path().join(DEBUG_TEXT_FILE).exists(), "debug text is still written");
    }

    #[test]
    fn test_publish_with_nulls_policy_writes_partial_document() {
        let dir = tempfile::tempdir().unwrap();
        let p = publisher(dir.path(), PartialPolicy::PublishWithNulls);
        p.publish_at(&Outcome::Extracted(complete_extraction()), t0()).unwrap();

        let action = p.publish_at(&Outcome::Extracted(incomplete_extraction()), t1()).unwrap();
        assert_eq!(action, PublishAction::PublishedIncomplete);

        let doc = read_json(&p.json_path());
        assert_eq!(doc["status"], "partial_data");
        assert_eq!(doc["data_quality"], "incomplete");
        assert_eq!(doc["parsed_data"]["conditions"]["max_wave_height"], Value::Null);
    }

    // --- Hard-failure path --------------------------------------------------

    #[test]
    fn test_first_failure_writes_error_document() {
        let dir = tempfile::tempdir().unwrap();
        let p = publisher(dir.path(), PartialPolicy::RetainPrevious);

        let action = p.publish_at(&Outcome::Failed(ScrapeError::ImageTagNotFound), t0()).unwrap();
        assert_eq!(action, PublishAction::WroteErrorDocument);

        let doc = read_json(&p.json_path());
        assert_eq!(doc["status"], "error");
        assert_eq!(doc["data_quality"], "error");
        assert_eq!(doc["error_message"], "Image tag not found");
        assert_eq!(doc["raw_data"], Value::Null);
        assert_eq!(doc["parsed_data"]["location"], "Mauao Wave Buoy");
        let conditions = doc["parsed_data"]["conditions"].as_object().unwrap();
        assert_eq!(conditions.len(), 9);
        assert!(conditions.values().all(Value::is_null));

        assert!(!dir.path().join(HTML_FILE).exists(), "no text to show on failure");
    }

    #[test]
    fn test_failure_annotates_previous_document() {
        let dir = tempfile::tempdir().unwrap();
        let p = publisher(dir.path(), PartialPolicy::RetainPrevious);
        p.publish_at(&Outcome::Extracted(complete_extraction()), t0()).unwrap();
        let before = read_json(&p.json_path());

        let err = ScrapeError::DownloadExhausted {
            attempts: 3,
            last: TransportFault::Timeout("read timed out".to_string()),
        };
        let action = p.publish_at(&Outcome::Failed(err), t1()).unwrap();
        assert_eq!(action, PublishAction::AnnotatedPrevious);

        let after = read_json(&p.json_path());
        assert_eq!(after["parsed_data"], before["parsed_data"]);
        assert_eq!(after["status"], "success");
        assert_eq!(
            after["last_scrape_status"],
            "download_failed: timeout: read timed out"
        );
    }

    #[test]
    fn test_annotation_preserves_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let p = publisher(dir.path(), PartialPolicy::RetainPrevious);
        p.publish_at(&Outcome::Extracted(complete_extraction()), t0()).unwrap();

        let mut doc = read_json(&p.json_path());
        doc["widget_theme"] = Value::from("dark");
        std::fs::write(p.json_path(), serde_json::to_string_pretty(&doc).unwrap()).unwrap();

        p.publish_at(&Outcome::Failed(ScrapeError::ImageTagNotFound), t1()).unwrap();
        let after = read_json(&p.json_path());
        assert_eq!(after["widget_theme"], "dark");
        assert_eq!(after["last_scrape_status"], "image_tag_not_found");
    }

    #[test]
    fn test_corrupt_previous_document_is_replaced_by_error_document() {
        let dir = tempfile::tempdir().unwrap();
        let p = publisher(dir.path(), PartialPolicy::RetainPrevious);
        std::fs::write(p.json_path(), "not json").unwrap();

        let action = p
            .publish_at(&Outcome::Failed(ScrapeError::NonImageResponse("text/html".to_string())), t0())
            .unwrap();
        assert_eq!(action, PublishAction::WroteErrorDocument);
        assert_eq!(read_json(&p.json_path())["error_message"], "Non-image response received");
    }
}
