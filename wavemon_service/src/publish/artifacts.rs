//! Human-readable debug artifacts: the raw text dump and the status page.

use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::publish::store::{display_utc, write_atomic};

/// Seconds between automatic reloads of the status page.
pub const REFRESH_SECS: u32 = 300;

/// Status line shown at the top of the HTML page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLine {
    Complete,
    IncompleteUsingPrevious,
    IncompleteWithNulls,
}

impl StatusLine {
    pub fn text(&self) -> &'static str {
        match self {
            StatusLine::Complete => "✅ Data Complete",
            StatusLine::IncompleteUsingPrevious => "⚠️ Data Incomplete - Using Previous",
            StatusLine::IncompleteWithNulls => "⚠️ Data Incomplete (with nulls)",
        }
    }
}

pub fn write_debug_text(path: &Path, formatted_output: &str) -> io::Result<()> {
    write_atomic(path, formatted_output.as_bytes())
}

pub fn write_status_page(
    path: &Path,
    status: StatusLine,
    formatted_output: &str,
    json_href: &str,
    now: DateTime<Utc>,
) -> io::Result<()> {
    let html = render_status_page(status, formatted_output, json_href, now);
    write_atomic(path, html.as_bytes())
}

pub fn render_status_page(
    status: StatusLine,
    formatted_output: &str,
    json_href: &str,
    now: DateTime<Utc>,
) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Mauao Wave Data</title>
    <meta http-equiv="refresh" content="{refresh}">
</head>
<body>
    <h1>Mauao Wave Buoy Data</h1>
    <p><strong>Status:</strong> {status}</p>
    <p><strong>Last scrape attempt:</strong> {attempt}</p>
    <h2>Raw Extracted Data:</h2>
    <pre>{raw}</pre>
    <p><a href="{href}">JSON Data</a></p>
</body>
</html>
"#,
        refresh = REFRESH_SECS,
        status = status.text(),
        attempt = display_utc(now),
        raw = escape_html(formatted_output),
        href = escape_html(json_href),
    )
}

/// OCR text is untrusted; keep it from being read as markup.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    #[test]
    fn test_page_refreshes_and_links_json() {
        let html = render_status_page(StatusLine::Complete, "Title,", "wave_data.json", fixed_now());
        assert!(html.contains(r#"<meta http-equiv="refresh" content="300">"#));
        assert!(html.contains(r#"<a href="wave_data.json">JSON Data</a>"#));
        assert!(html.contains("✅ Data Complete"));
        assert!(html.contains("01/05/2024 13:00 UTC"));
    }

    #[test]
    fn test_raw_text_is_escaped() {
        let html = render_status_page(
            StatusLine::IncompleteUsingPrevious,
            "Port Weather & Sea Conditions <b>",
            "wave_data.json",
            fixed_now(),
        );
        assert!(html.contains("<pre>Port Weather &amp; Sea Conditions &lt;b&gt;</pre>"));
        assert!(html.contains("Using Previous"));
    }

    #[test]
    fn test_debug_text_is_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portDataScrape.txt");
        write_debug_text(&path, "Title,\nMauao Wave Buoy,\nTime,\nWind: 12 knots").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Title,\nMauao Wave Buoy,\nTime,\nWind: 12 knots"
        );
    }
}
