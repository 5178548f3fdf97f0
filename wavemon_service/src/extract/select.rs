//! Marker-line selection over raw OCR output.
//!
//! The status image is rendered from a fixed template, so each reading sits
//! on a line with a known label. For every label, in a fixed order, the
//! first line containing it is taken together with the line right after it.

/// Labels searched for, in output order. The first is the image title;
/// its line is dropped from the selection.
pub const KEYWORDS: [&str; 10] = [
    "Port Weather & Sea Conditions",
    "Max wave height:",
    "Sig: wave height:",
    "period:",
    "Tide:",
    "Wind:",
    "Gust:",
    "Direction:",
    "Water Temp:",
    "Air Temp:",
];

/// Header lines placed above the selected lines in the text artifact.
const TITLE_LABEL: &str = "Title";
const TIME_LABEL: &str = "Time";

/// Flatten OCR fragments into lines; a fragment may span several lines.
pub fn split_fragments<S: AsRef<str>>(fragments: &[S]) -> Vec<String> {
    fragments
        .iter()
        .flat_map(|f| f.as_ref().split('\n'))
        .map(String::from)
        .collect()
}

/// Select the first line containing each keyword (case-sensitive) plus the
/// line following it, in keyword order, then drop the very first selected
/// line.
///
/// A keyword that matches nothing contributes nothing. The result never has
/// more than `2 * keywords.len() - 1` lines.
pub fn select_lines<S: AsRef<str>>(ocr_lines: &[S], keywords: &[&str]) -> Vec<String> {
    let mut selected = Vec::new();

    for keyword in keywords {
        if let Some(i) = ocr_lines.iter().position(|line| line.as_ref().contains(keyword)) {
            selected.push(ocr_lines[i].as_ref().to_string());
            if let Some(next) = ocr_lines.get(i + 1) {
                selected.push(next.as_ref().to_string());
            }
        }
    }

    if !selected.is_empty() {
        selected.remove(0);
    }
    selected
}

/// Text artifact: `Title,` / `<location>,` / `Time,` then one selected line
/// per row.
pub fn format_output<S: AsRef<str>>(location: &str, selected: &[S]) -> String {
    let body: Vec<&str> = selected.iter().map(|s| s.as_ref()).collect();
    format!(
        "{},\n{},\n{},\n{}",
        TITLE_LABEL,
        location,
        TIME_LABEL,
        body.join("\n")
    )
}
