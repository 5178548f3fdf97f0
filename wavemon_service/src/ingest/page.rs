//! Harbour-conditions page lookup.
//!
//! Fetches the page HTML and finds the `src` of the status image by its
//! element id, resolving relative paths against the page URL.

use reqwest::Url;
use scraper::{Html, Selector};

use crate::ingest::Transport;
use crate::model::ScrapeError;

/// Fetch the page and return the absolute URL of the status image.
pub fn locate_image_url<T: Transport + ?Sized>(
    transport: &T,
    page_url: &str,
    element_id: &str,
) -> Result<String, ScrapeError> {
    let html = transport
        .get_page(page_url)
        .map_err(ScrapeError::PageFetchFailed)?;

    let src = find_image_src(&html, element_id)?.ok_or(ScrapeError::ImageTagNotFound)?;
    resolve_url(page_url, &src)
}

/// `src` of the first `<img>` whose `id` equals `element_id`.
///
/// Returns `Ok(None)` when there is no such element, or when it has no
/// `src` attribute.
pub fn find_image_src(html: &str, element_id: &str) -> Result<Option<String>, ScrapeError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(&format!("img[id=\"{}\"]", element_id.replace('"', "\\\"")))
        .map_err(|e| ScrapeError::UnexpectedError(format!("invalid image selector: {:?}", e)))?;

    Ok(document
        .select(&selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(|src| src.trim().to_string())
        .filter(|src| !src.is_empty()))
}

/// Join a possibly-relative `src` onto the page URL.
pub fn resolve_url(page_url: &str, src: &str) -> Result<String, ScrapeError> {
    let base = Url::parse(page_url)
        .map_err(|e| ScrapeError::UnexpectedError(format!("invalid page URL {}: {}", page_url, e)))?;
    let joined = base
        .join(src)
        .map_err(|e| ScrapeError::UnexpectedError(format!("invalid image URL {}: {}", src, e)))?;
    Ok(joined.to_string())
}
