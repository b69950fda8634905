//! Text summary builder for CLI output.
//!
//! Formats a loaded result page as human-readable lines for text mode.

use crate::export::{CsvField, CsvRow};
use crate::model::ResultPage;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary of the loaded page: a range line followed by one
/// line per entry.
pub(crate) fn build_page_summary<T: CsvRow>(page: &ResultPage<T>) -> TextSummary {
    let mut lines = Vec::new();
    lines.push(format!(
        "Showing {}-{} of {} entries (page {} of {})",
        page.range_from, page.range_to, page.total_items, page.current_page, page.total_pages
    ));

    if page.entries.is_empty() {
        lines.push("No log entries match the current filters.".to_string());
        return TextSummary { lines };
    }

    lines.push(T::header().join(" | "));
    for entry in &page.entries {
        let cells: Vec<String> = entry
            .fields()
            .into_iter()
            .map(CsvField::into_raw)
            .collect();
        lines.push(cells.join(" | "));
    }

    TextSummary { lines }
}
