//! Turning recognised OCR text into a conditions record.
//!
//! Submodules:
//! - `select`:     picks the marker lines (and the line after each) out of
//!                  the raw OCR output.
//! - `conditions`: parses the selected lines into typed measurements.

pub mod conditions;
pub mod select;

use crate::model::Extraction;

/// Run line selection and parsing over raw OCR fragments.
///
/// Never fails: missing markers or unreadable values only leave fields of
/// the resulting record unset.
pub fn build_extraction<S: AsRef<str>>(location: &str, fragments: &[S]) -> Extraction {
    let lines = select::split_fragments(fragments);
    let selected = select::select_lines(&lines, &select::KEYWORDS);
    let formatted_output = select::format_output(location, &selected);
    let conditions = conditions::parse(&selected);

    Extraction {
        formatted_output,
        raw_conditions: selected,
        conditions,
    }
}
