//! Bitmap preparation and the text-recognition seam.
//!
//! The OCR engine itself is an external collaborator behind
//! [`TextExtractor`]. The shipped implementation pipes a PNG into the
//! `tesseract` command-line tool and reads recognised lines from stdout.

use std::io::{Cursor, Write};
use std::process::{Command, Stdio};

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::model::ScrapeError;

/// Turns a prepared bitmap into recognised text fragments, in reading order.
pub trait TextExtractor {
    fn extract_lines(&self, image: &DynamicImage) -> Result<Vec<String>, ScrapeError>;
}

// ---------------------------------------------------------------------------
// Bitmap preparation
// ---------------------------------------------------------------------------

/// Decode downloaded bytes. A truncated or corrupt file fails here rather
/// than producing a partial bitmap.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ScrapeError> {
    image::load_from_memory(bytes).map_err(|e| ScrapeError::ImageDecodeError(e.to_string()))
}

/// Scale both dimensions by `factor` with a cubic filter. Factors at or
/// below 1.0 (or non-finite) leave the image untouched.
pub fn upscale(image: &DynamicImage, factor: f32) -> DynamicImage {
    if !factor.is_finite() || factor <= 1.0 {
        return image.clone();
    }
    let (w, h) = image.dimensions();
    let new_w = ((w as f32) * factor).round() as u32;
    let new_h = ((h as f32) * factor).round() as u32;
    image.resize_exact(new_w.max(1), new_h.max(1), FilterType::CatmullRom)
}

/// Decode, upscale and run OCR over a downloaded status image.
pub fn recognize<X: TextExtractor + ?Sized>(
    extractor: &X,
    bytes: &[u8],
    upscale_factor: f32,
) -> Result<Vec<String>, ScrapeError> {
    let decoded = decode_image(bytes)?;
    let prepared = upscale(&decoded, upscale_factor);
    extractor.extract_lines(&prepared)
}

// ---------------------------------------------------------------------------
// Tesseract CLI
// ---------------------------------------------------------------------------

pub struct TesseractCli {
    command: String,
    language: String,
}

impl TesseractCli {
    pub fn new(command: &str, language: &str) -> Self {
        Self {
            command: command.to_string(),
            language: language.to_string(),
        }
    }
}

impl TextExtractor for TesseractCli {
    fn extract_lines(&self, image: &DynamicImage) -> Result<Vec<String>, ScrapeError> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| ScrapeError::UnexpectedError(format!("PNG encode for OCR failed: {}", e)))?;

        let mut child = Command::new(&self.command)
            .args(["stdin", "stdout", "-l", &self.language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ScrapeError::UnexpectedError(format!("cannot start OCR engine '{}': {}", self.command, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&png)
                .map_err(|e| ScrapeError::UnexpectedError(format!("OCR engine input failed: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| ScrapeError::UnexpectedError(format!("OCR engine failed: {}", e)))?;

        if !output.status.success() {
            return Err(ScrapeError::UnexpectedError(format!(
                "OCR engine exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(split_recognized_text(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Tesseract separates blocks with blank lines; those carry no text.
fn split_recognized_text(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(String::from)
        .collect()
}
