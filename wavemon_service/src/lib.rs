//! Harbour wave-conditions scraper.
//!
//! Fetches the harbour-conditions page, downloads its status image, reads
//! the image text with OCR, parses it into marine-weather fields and
//! publishes `wave_data.json` (plus debug text and an HTML status page) for
//! downstream widgets.

pub mod config;
pub mod extract;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod ocr;
pub mod pipeline;
pub mod publish;
pub mod quality;
