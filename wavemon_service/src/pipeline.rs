//! One scrape run, end to end.
//!
//! page → image URL → download (retried) → decode + OCR → select → parse →
//! publish. Every failure, including a panic inside a stage, ends up as an
//! [`Outcome::Failed`] handed to the publisher; nothing propagates out of a
//! run except an I/O error from writing the artifacts themselves.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::ScrapeConfig;
use crate::extract;
use crate::ingest::{HttpTransport, Transport, image, page};
use crate::logging::{self, Stage};
use crate::model::{Extraction, ScrapeError};
use crate::ocr::{self, TesseractCli, TextExtractor};
use crate::publish::{Outcome, PublishAction, Publisher};

/// Acquire and parse the current conditions, without publishing.
pub fn scrape<T, X>(
    config: &ScrapeConfig,
    transport: &T,
    extractor: &X,
    sleep: &mut dyn FnMut(Duration),
) -> Result<Extraction, ScrapeError>
where
    T: Transport + ?Sized,
    X: TextExtractor + ?Sized,
{
    logging::info(Stage::Page, &format!("Fetching {}", config.page_url));
    let image_url = page::locate_image_url(transport, &config.page_url, &config.image_element_id)?;
    logging::info(Stage::Page, &format!("Found image URL: {}", image_url));

    let download = image::fetch_image_with(transport, &image_url, config.max_retries, sleep)?;
    image::ensure_image_content(&download)?;

    logging::info(Stage::Ocr, "Performing OCR");
    let fragments = ocr::recognize(extractor, &download.bytes, config.upscale_factor)?;
    logging::debug(Stage::Ocr, &format!("Recognised {} text fragments", fragments.len()));

    let extraction = extract::build_extraction(&config.location, &fragments);
    logging::debug(
        Stage::Parse,
        &format!("Formatted output:\n{}", extraction.formatted_output),
    );
    Ok(extraction)
}

/// Run once with injected collaborators, sleep and clock.
pub fn run_once_with<T, X>(
    config: &ScrapeConfig,
    transport: &T,
    extractor: &X,
    sleep: &mut dyn FnMut(Duration),
    now: DateTime<Utc>,
) -> io::Result<PublishAction>
where
    T: Transport + ?Sized,
    X: TextExtractor + ?Sized,
{
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        scrape(config, transport, extractor, &mut *sleep)
    }))
    .unwrap_or_else(|payload| Err(ScrapeError::UnexpectedError(panic_message(&*payload))));

    let outcome = match result {
        Ok(extraction) => Outcome::Extracted(extraction),
        Err(err) => {
            logging::log_scrape_failure(&err);
            Outcome::Failed(err)
        }
    };

    publish(config, &outcome, now)
}

/// Production run: real HTTP, the Tesseract CLI, real sleeps and clock.
pub fn run_once(config: &ScrapeConfig) -> io::Result<PublishAction> {
    let extractor = TesseractCli::new(&config.tesseract_command, &config.ocr_language);

    match HttpTransport::new(&config.user_agent, config.timeout()) {
        Ok(transport) => {
            run_once_with(config, &transport, &extractor, &mut std::thread::sleep, Utc::now())
        }
        Err(fault) => {
            let err = ScrapeError::UnexpectedError(format!("HTTP client setup failed: {}", fault));
            logging::log_scrape_failure(&err);
            publish(config, &Outcome::Failed(err), Utc::now())
        }
    }
}

fn publish(config: &ScrapeConfig, outcome: &Outcome, now: DateTime<Utc>) -> io::Result<PublishAction> {
    let action = Publisher::from_config(config).publish_at(outcome, now)?;
    logging::log_publish_summary(&action);
    Ok(action)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic in scrape stage".to_string()
    }
}
