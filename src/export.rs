//! CSV export of the currently loaded result page.
//!
//! The output is comma-delimited with no quoting or escaping, so commas in
//! textual values are destructively replaced with dashes to keep the columns
//! aligned. The finished table is prefixed with a CSV media-type marker and
//! percent-encoded as a whole before being handed to the file sink.

use anyhow::{Context, Result};
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tracing::info;

use crate::model::{AuditEntry, ContentEntry};

/// Media-type marker prefixed to every export payload.
pub const CSV_PREFIX: &str = "data:text/csv;charset=utf-8,";

/// Fixed export filename for the audit trail view.
pub const AUDIT_CSV_FILENAME: &str = "audit_log.csv";

/// Fixed export filename for the content log view.
pub const CONTENT_CSV_FILENAME: &str = "content_log.csv";

/// One exportable cell. Textual cells are subject to comma sanitization;
/// numeric cells pass through untouched.
#[derive(Debug, Clone)]
pub enum CsvField {
    Text(String),
    Number(i64),
}

impl CsvField {
    /// Cell text without export sanitization applied.
    pub fn into_raw(self) -> String {
        match self {
            CsvField::Text(s) => s,
            CsvField::Number(n) => n.to_string(),
        }
    }
}

/// Fixed header and field projection of one entry type.
pub trait CsvRow {
    fn header() -> &'static [&'static str];
    fn fields(&self) -> Vec<CsvField>;
}

impl CsvRow for AuditEntry {
    fn header() -> &'static [&'static str] {
        &["Date", "Performer", "IP", "Affected", "Event", "Details"]
    }

    fn fields(&self) -> Vec<CsvField> {
        vec![
            CsvField::Text(format_local_timestamp(&self.event_date_utc)),
            CsvField::Text(self.performing_details.clone()),
            CsvField::Text(self.performing_ip.clone()),
            CsvField::Text(self.affected_details.clone()),
            CsvField::Text(self.event_type.clone()),
            CsvField::Text(self.event_details.clone()),
        ]
    }
}

impl CsvRow for ContentEntry {
    fn header() -> &'static [&'static str] {
        &["Date", "User", "Action", "Node", "Content", "Type"]
    }

    fn fields(&self) -> Vec<CsvField> {
        vec![
            CsvField::Text(format_local_timestamp(&self.date_stamp)),
            CsvField::Text(self.user_name.clone()),
            CsvField::Text(self.log_header.clone()),
            CsvField::Number(self.node_id),
            CsvField::Text(self.text.clone()),
            CsvField::Text(self.type_desc.clone()),
        ]
    }
}

/// Render an RFC 3339 timestamp in the local timezone, falling back to the
/// raw value when it does not parse or no local offset is available.
pub(crate) fn format_local_timestamp(raw: &str) -> String {
    let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) else {
        return raw.to_string();
    };
    let local = match UtcOffset::current_local_offset() {
        Ok(offset) => parsed.to_offset(offset),
        Err(_) => parsed,
    };
    local
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .unwrap_or_else(|_| raw.to_string())
}

/// Commas would break the unquoted comma-delimited layout, so textual values
/// have them replaced with dashes. Lossy on purpose.
fn sanitize(field: CsvField) -> String {
    match field {
        CsvField::Text(s) => s.replace(',', "-"),
        CsvField::Number(n) => n.to_string(),
    }
}

/// Render the loaded page as an unquoted comma-delimited table. An empty
/// page yields only the header row.
pub fn build_csv<R: CsvRow>(rows: &[R]) -> String {
    let mut out = String::new();
    out.push_str(&R::header().join(","));
    out.push('\n');
    for row in rows {
        let cells: Vec<String> = row.fields().into_iter().map(sanitize).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

/// Percent-encode the payload the way `encodeURI` does: alphanumerics and
/// URI punctuation pass through, everything else becomes UTF-8 percent
/// escapes.
pub fn encode_uri(payload: &str) -> String {
    let mut out = String::with_capacity(payload.len());
    for &b in payload.as_bytes() {
        match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')'
            | b';'
            | b'/'
            | b'?'
            | b':'
            | b'@'
            | b'&'
            | b'='
            | b'+'
            | b'$'
            | b','
            | b'#' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Full export payload for one page: prefixed, rendered, then encoded whole.
pub fn export_payload<R: CsvRow>(rows: &[R]) -> String {
    encode_uri(&format!("{CSV_PREFIX}{}", build_csv(rows)))
}

/// Destination for an export payload; stands in for the browser download.
pub trait FileSink: Send {
    fn download(&self, filename: &str, payload: &str) -> Result<()>;
}

/// Writes export payloads into a directory on disk.
pub struct DirSink {
    dir: PathBuf,
}

impl DirSink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Default export directory: the user's download directory when known,
    /// otherwise the current directory.
    pub fn default_dir() -> PathBuf {
        dirs::download_dir()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

impl FileSink for DirSink {
    fn download(&self, filename: &str, payload: &str) -> Result<()> {
        let path = self.dir.join(filename);
        std::fs::write(&path, payload)
            .with_context(|| format!("write {}", path.display()))?;
        info!(path = %path.display(), "exported csv");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(affected: &str) -> AuditEntry {
        AuditEntry {
            event_date_utc: "2024-03-05T14:30:00Z".to_string(),
            performing_details: "Admin".to_string(),
            performing_ip: "10.0.0.1".to_string(),
            affected_details: affected.to_string(),
            event_type: "Save".to_string(),
            event_details: "Saved content".to_string(),
        }
    }

    #[test]
    fn commas_in_text_fields_become_dashes() {
        let csv = build_csv(&[entry("Smith, John")]);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains("Smith- John"));
        assert!(!row.contains('"'));
    }

    #[test]
    fn numeric_fields_pass_through_unchanged() {
        let row = ContentEntry {
            date_stamp: "2024-03-05T14:30:00Z".to_string(),
            user_name: "jane".to_string(),
            log_header: "Publish".to_string(),
            node_id: 1042,
            text: "Home, page".to_string(),
            type_desc: "Content".to_string(),
        };
        let csv = build_csv(&[row]);
        let line = csv.lines().nth(1).unwrap();
        let cells: Vec<&str> = line.split(',').collect();
        assert_eq!(cells[3], "1042");
        assert_eq!(cells[4], "Home- page");
    }

    #[test]
    fn empty_page_exports_only_the_header() {
        let csv = build_csv::<AuditEntry>(&[]);
        assert_eq!(csv, "Date,Performer,IP,Affected,Event,Details\n");
    }

    #[test]
    fn content_header_layout() {
        let csv = build_csv::<ContentEntry>(&[]);
        assert_eq!(csv, "Date,User,Action,Node,Content,Type\n");
    }

    #[test]
    fn payload_is_prefixed_and_percent_encoded() {
        let payload = export_payload::<AuditEntry>(&[]);
        assert!(payload.starts_with("data:text/csv;charset=utf-8,"));
        assert!(payload.ends_with("%0A"));
        assert!(!payload.contains(' '));
    }

    #[test]
    fn encode_uri_keeps_uri_punctuation_and_escapes_the_rest() {
        assert_eq!(encode_uri("a b"), "a%20b");
        assert_eq!(encode_uri("x,y;z/:@"), "x,y;z/:@");
        assert_eq!(encode_uri("line\nbreak"), "line%0Abreak");
        assert_eq!(encode_uri("ü"), "%C3%BC");
    }

    #[test]
    fn unparseable_timestamp_is_exported_verbatim() {
        assert_eq!(format_local_timestamp("not-a-date"), "not-a-date");
    }

    #[test]
    fn timestamp_formats_without_the_rfc3339_separators() {
        let formatted = format_local_timestamp("2024-03-05T14:30:00Z");
        assert_eq!(formatted.len(), "2024-03-05 14:30:00".len());
        assert!(!formatted.contains('T'));
        assert!(!formatted.contains('Z'));
    }
}
