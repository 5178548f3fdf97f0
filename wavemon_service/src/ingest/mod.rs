//! HTTP acquisition for the harbour-conditions page and its status image.
//!
//! Submodules:
//! - `page`:  fetches the page and finds the status image URL in it.
//! - `image`: downloads the image with retry and exponential backoff.
//!
//! Both go through the [`Transport`] trait so tests can script faults
//! without a network.

pub mod image;
pub mod page;

use std::io::Read;
use std::time::Duration;

use crate::model::TransportFault;

/// Body read size for streamed downloads.
const CHUNK_SIZE: usize = 8192;

/// Upper bound on the buffer reserved from a declared `Content-Length`.
/// Larger bodies still download; the buffer just grows as chunks arrive.
const MAX_PREALLOC: u64 = 4 * 1024 * 1024;

/// A downloaded binary body plus its declared content type.
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// One blocking HTTP GET per call; no retries at this level.
pub trait Transport {
    fn get_page(&self, url: &str) -> Result<String, TransportFault>;
    fn get_image(&self, url: &str) -> Result<Download, TransportFault>;
}

// ---------------------------------------------------------------------------
// reqwest-backed transport
// ---------------------------------------------------------------------------

pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Build a client that sends `user_agent` on every request and bounds
    /// each request by `timeout`.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, TransportFault> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportFault::Request(e.to_string()))?;
        Ok(Self { client })
    }

    fn send(&self, url: &str) -> Result<reqwest::blocking::Response, TransportFault> {
        let response = self.client.get(url).send().map_err(classify_reqwest_error)?;
        if !response.status().is_success() {
            return Err(TransportFault::Status(response.status().as_u16()));
        }
        Ok(response)
    }
}

impl Transport for HttpTransport {
    fn get_page(&self, url: &str) -> Result<String, TransportFault> {
        self.send(url)?.text().map_err(classify_reqwest_error)
    }

    /// Streams the body in fixed-size chunks so a connection dropped
    /// mid-transfer surfaces as `Truncated` instead of a short image.
    fn get_image(&self, url: &str) -> Result<Download, TransportFault> {
        let mut response = self.send(url)?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let expected_len = response.content_length();

        let mut bytes = Vec::with_capacity(expected_len.map_or(0, |n| n.min(MAX_PREALLOC)) as usize);
        let mut chunk = [0u8; CHUNK_SIZE];
        loop {
            let n = response.read(&mut chunk).map_err(classify_io_error)?;
            if n == 0 {
                break;
            }
            bytes.extend_from_slice(&chunk[..n]);
        }

        if let Some(len) = expected_len {
            if bytes.len() as u64 != len {
                return Err(TransportFault::Truncated(format!(
                    "received {} of {} bytes",
                    bytes.len(),
                    len
                )));
            }
        }

        Ok(Download { bytes, content_type })
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> TransportFault {
    if e.is_timeout() {
        TransportFault::Timeout(e.to_string())
    } else if e.is_body() || e.is_decode() {
        TransportFault::Truncated(e.to_string())
    } else if let Some(status) = e.status() {
        TransportFault::Status(status.as_u16())
    } else {
        TransportFault::Request(e.to_string())
    }
}

fn classify_io_error(e: std::io::Error) -> TransportFault {
    match e.kind() {
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
            TransportFault::Timeout(e.to_string())
        }
        _ => TransportFault::Truncated(e.to_string()),
    }
}
