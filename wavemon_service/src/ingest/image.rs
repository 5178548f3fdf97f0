//! Status image download with retry and exponential backoff.
//!
//! # Sleep injection
//! `fetch_image_with` takes the sleep function as a parameter so the
//! backoff schedule can be asserted in tests without waiting on the clock.
//! `fetch_image` is the production wrapper around `std::thread::sleep`.

use std::time::Duration;

use crate::ingest::{Download, Transport};
use crate::logging::{self, Stage};
use crate::model::{ScrapeError, TransportFault};

/// Delay before the attempt following zero-indexed `attempt`: 1s, 2s, 4s, ...
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(16))
}

/// Download `url`, retrying every transport fault up to `max_retries`
/// attempts in total. Blocks the calling thread during backoff.
pub fn fetch_image<T: Transport + ?Sized>(
    transport: &T,
    url: &str,
    max_retries: u32,
) -> Result<Download, ScrapeError> {
    fetch_image_with(transport, url, max_retries, &mut std::thread::sleep)
}

/// Same as [`fetch_image`] with a caller-supplied sleep.
///
/// There is no sleep after the final attempt. A `max_retries` of zero is
/// treated as a single attempt.
pub fn fetch_image_with<T: Transport + ?Sized>(
    transport: &T,
    url: &str,
    max_retries: u32,
    sleep: &mut dyn FnMut(Duration),
) -> Result<Download, ScrapeError> {
    let attempts = max_retries.max(1);
    let mut last_fault = None;

    for attempt in 0..attempts {
        logging::info(
            Stage::Image,
            &format!("Downloading image (attempt {}/{})", attempt + 1, attempts),
        );

        match transport.get_image(url) {
            Ok(download) => {
                logging::info(
                    Stage::Image,
                    &format!("Downloaded image ({} bytes)", download.bytes.len()),
                );
                return Ok(download);
            }
            Err(fault) => {
                logging::warn(Stage::Image, &format!("Attempt {}: {}", attempt + 1, fault));
                if attempt + 1 < attempts {
                    let wait = backoff_delay(attempt);
                    logging::info(Stage::Image, &format!("Retrying in {}s", wait.as_secs()));
                    sleep(wait);
                }
                last_fault = Some(fault);
            }
        }
    }

    Err(ScrapeError::DownloadExhausted {
        attempts,
        last: last_fault
            .unwrap_or_else(|| TransportFault::Request("no attempt was made".to_string())),
    })
}

/// Reject responses whose declared content type is not an image.
///
/// A missing header is accepted; the decoder gets the final word.
pub fn ensure_image_content(download: &Download) -> Result<(), ScrapeError> {
    match download.content_type.as_deref() {
        Some(ct) if !ct.to_ascii_lowercase().contains("image") => {
            Err(ScrapeError::NonImageResponse(ct.to_string()))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays a scripted list of outcomes, one per request.
    struct ScriptedTransport {
        outcomes: RefCell<VecDeque<Result<Download, TransportFault>>>,
        calls: RefCell<u32>,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<Result<Download, TransportFault>>) -> Self {
            Self {
                outcomes: RefCell::new(outcomes.into()),
                calls: RefCell::new(0),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn get_page(&self, _url: &str) -> Result<String, TransportFault> {
            unreachable!("image fetch never requests the page")
        }
        fn get_image(&self, _url: &str) -> Result<Download, TransportFault> {
            *self.calls.borrow_mut() += 1;
            self.outcomes
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TransportFault::Request("script exhausted".to_string())))
        }
    }

    fn png_download() -> Download {
        Download {
            bytes: vec![0x89, b'P', b'N', b'G'],
            content_type: Some("image/png".to_string()),
        }
    }

    fn chunked_error() -> TransportFault {
        TransportFault::Truncated("Connection broken: IncompleteRead".to_string())
    }

    // --- Backoff schedule ---------------------------------------------------

    #[test]
    fn test_backoff_doubles_from_one_second() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(2), Duration::from_secs(4));
    }

    #[test]
    fn test_three_chunked_errors_exhaust_after_two_sleeps() {
        let transport =
            ScriptedTransport::new(vec![Err(chunked_error()), Err(chunked_error()), Err(chunked_error())]);
        let mut slept = Vec::new();

        let result = fetch_image_with(&transport, "https://h/img.png", 3, &mut |d| slept.push(d));

        assert_eq!(
            result,
            Err(ScrapeError::DownloadExhausted {
                attempts: 3,
                last: chunked_error(),
            })
        );
        assert_eq!(slept, vec![Duration::from_secs(1), Duration::from_secs(2)]);
        assert_eq!(*transport.calls.borrow(), 3);
    }

    #[test]
    fn test_recovers_after_transient_timeout() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportFault::Timeout("read timed out".to_string())),
            Ok(png_download()),
        ]);
        let mut slept = Vec::new();

        let result = fetch_image_with(&transport, "https://h/img.png", 3, &mut |d| slept.push(d));

        assert_eq!(result, Ok(png_download()));
        assert_eq!(slept, vec![Duration::from_secs(1)]);
    }

    #[test]
    fn test_last_fault_is_the_one_reported() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportFault::Timeout("first".to_string())),
            Err(TransportFault::Status(502)),
        ]);
        let result = fetch_image_with(&transport, "https://h/img.png", 2, &mut |_| {});
        match result {
            Err(ScrapeError::DownloadExhausted { last, attempts }) => {
                assert_eq!(attempts, 2);
                assert_eq!(last, TransportFault::Status(502));
            }
            other => panic!("expected DownloadExhausted, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_retries_still_makes_one_attempt() {
        let transport = ScriptedTransport::new(vec![Ok(png_download())]);
        let result = fetch_image_with(&transport, "https://h/img.png", 0, &mut |_| {
            panic!("no sleep expected")
        });
        assert!(result.is_ok());
    }

    // --- Content type -------------------------------------------------------

    #[test]
    fn test_html_content_type_is_rejected() {
        let download = Download {
            bytes: b"<html>".to_vec(),
            content_type: Some("text/html; charset=utf-8".to_string()),
        };
        assert_eq!(
            ensure_image_content(&download),
            Err(ScrapeError::NonImageResponse("text/html; charset=utf-8".to_string()))
        );
    }

    #[test]
    fn test_missing_content_type_is_assumed_image() {
        let download = Download {
            bytes: vec![1, 2, 3],
            content_type: None,
        };
        assert!(ensure_image_content(&download).is_ok());
    }
}
