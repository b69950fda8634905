use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::Date;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Page sizes either view offers for selection.
pub const PAGE_SIZE_OPTIONS: [u32; 6] = [10, 20, 50, 100, 200, 500];

/// Default page size (the third option).
pub const DEFAULT_PAGE_SIZE: u32 = PAGE_SIZE_OPTIONS[2];

/// How long a search outcome is flashed before the control re-arms.
pub const BUTTON_RESET_DELAY: Duration = Duration::from_millis(250);

/// Pagination and sort portion of the criteria, shared by both views.
///
/// Wire names match what the log API expects (`sort`, `reverse`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pager {
    pub current_page: u32,
    pub items_per_page: u32,
    #[serde(rename = "sort")]
    pub sort_field: String,
    #[serde(rename = "reverse")]
    pub descending: bool,
}

impl Pager {
    pub fn new(sort_field: impl Into<String>) -> Self {
        Self {
            current_page: 1,
            items_per_page: DEFAULT_PAGE_SIZE,
            sort_field: sort_field.into(),
            descending: true,
        }
    }

    /// Sort by `field`: a repeat of the current field flips the direction,
    /// a new field starts descending. Either way the old page offset is
    /// meaningless, so jump back to the first page.
    pub fn change_sort(&mut self, field: &str) {
        if self.sort_field == field {
            self.descending = !self.descending;
        } else {
            self.sort_field = field.to_string();
            self.descending = true;
        }
        self.current_page = 1;
    }

    /// Move back one page unless already on the first. Returns whether a
    /// move happened.
    pub fn previous_page(&mut self) -> bool {
        if self.current_page > 1 {
            self.current_page -= 1;
            true
        } else {
            false
        }
    }

    /// Move forward one page unless already on the last. Returns whether a
    /// move happened.
    pub fn next_page(&mut self, total_pages: u32) -> bool {
        if self.current_page < total_pages {
            self.current_page += 1;
            true
        } else {
            false
        }
    }

    /// Jump straight to `page`. Callers are expected to pass a page number
    /// the server actually offered; no bounds check is applied.
    pub fn go_to_page(&mut self, page: u32) {
        self.current_page = page;
    }

    pub fn reset_page(&mut self) {
        self.current_page = 1;
    }
}

/// Criteria records expose their pager so the pagination/sort state machine
/// can be shared across both views.
pub trait Criteria: Clone + Send + Sync + 'static {
    fn pager(&self) -> &Pager;
    fn pager_mut(&mut self) -> &mut Pager;
}

/// Query criteria for the audit trail view. Absent filters mean "no filter".
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditCriteria {
    #[serde(flatten)]
    pub pager: Pager,
    pub search_term: Option<String>,
    pub event_type: Option<String>,
    pub performing_user: Option<String>,
    pub affected_user: Option<String>,
    #[serde(with = "iso_date::option")]
    pub date_from: Option<Date>,
    #[serde(with = "iso_date::option")]
    pub date_to: Option<Date>,
}

impl Default for AuditCriteria {
    fn default() -> Self {
        Self {
            pager: Pager::new("eventDateUtc"),
            search_term: None,
            event_type: None,
            performing_user: None,
            affected_user: None,
            date_from: None,
            date_to: None,
        }
    }
}

impl Criteria for AuditCriteria {
    fn pager(&self) -> &Pager {
        &self.pager
    }

    fn pager_mut(&mut self) -> &mut Pager {
        &mut self.pager
    }
}

/// Query criteria for the content-change log view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentCriteria {
    #[serde(flatten)]
    pub pager: Pager,
    pub search_term: Option<String>,
    pub log_type_name: Option<String>,
    pub log_user_name: Option<String>,
    #[serde(with = "iso_date::option")]
    pub date_from: Option<Date>,
    #[serde(with = "iso_date::option")]
    pub date_to: Option<Date>,
    pub node_id: Option<i64>,
    pub node_name: Option<String>,
}

impl Default for ContentCriteria {
    fn default() -> Self {
        Self {
            pager: Pager::new("L.Datestamp"),
            search_term: None,
            log_type_name: None,
            log_user_name: None,
            date_from: None,
            date_to: None,
            node_id: None,
            node_name: None,
        }
    }
}

impl Criteria for ContentCriteria {
    fn pager(&self) -> &Pager {
        &self.pager
    }

    fn pager_mut(&mut self) -> &mut Pager {
        &mut self.pager
    }
}

/// One page of log entries as returned by the log API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogDataPage<T> {
    pub log_entries: Vec<T>,
    pub total_pages: u32,
    pub current_page: u32,
    pub total_items: u64,
}

/// An audit trail entry in the shape the log API returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuditEntry {
    #[serde(default)]
    pub event_date_utc: String,
    #[serde(default)]
    pub performing_details: String,
    #[serde(default, rename = "PerformingIP")]
    pub performing_ip: String,
    #[serde(default)]
    pub affected_details: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub event_details: String,
}

/// A content-change log entry in the shape the log API returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContentEntry {
    #[serde(default)]
    pub date_stamp: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub log_header: String,
    #[serde(default)]
    pub node_id: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub type_desc: String,
}

/// The most recently fetched page plus display-oriented pagination metadata.
/// Replaced wholesale on every successful fetch.
#[derive(Debug, Clone)]
pub struct ResultPage<T> {
    pub entries: Vec<T>,
    pub total_items: u64,
    pub total_pages: u32,
    pub current_page: u32,
    /// 1-based inclusive display bounds for "showing X-Y of Z".
    pub range_from: u64,
    pub range_to: u64,
}

impl<T> ResultPage<T> {
    /// Fold a wire page into display form, deriving the range bounds from
    /// the page size and the server-echoed page number.
    pub fn from_wire(items_per_page: u32, page: LogDataPage<T>) -> Self {
        let count = page.log_entries.len() as u64;
        let current_page = page.current_page.max(1);
        let range_to = u64::from(items_per_page) * (u64::from(current_page) - 1) + count;
        let range_from = range_to - count + 1;
        Self {
            entries: page.log_entries,
            total_items: page.total_items,
            total_pages: page.total_pages,
            current_page,
            range_from,
            range_to,
        }
    }
}

/// Lifecycle of the audit view's search control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Init,
    Busy,
    Success,
    Error,
}

impl ButtonState {
    pub fn is_initial(self) -> bool {
        matches!(self, ButtonState::Init)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_criteria_start_on_first_page_sorted_descending() {
        let audit = AuditCriteria::default();
        assert_eq!(audit.pager.current_page, 1);
        assert_eq!(audit.pager.items_per_page, 50);
        assert_eq!(audit.pager.sort_field, "eventDateUtc");
        assert!(audit.pager.descending);

        let content = ContentCriteria::default();
        assert_eq!(content.pager.sort_field, "L.Datestamp");
        assert!(content.pager.descending);
    }

    #[test]
    fn change_sort_toggles_direction_on_repeat_field() {
        let mut pager = Pager::new("eventDateUtc");
        pager.change_sort("eventDateUtc");
        assert!(!pager.descending);
        pager.change_sort("eventDateUtc");
        assert!(pager.descending);
    }

    #[test]
    fn change_sort_switches_field_descending_and_resets_page() {
        let mut pager = Pager::new("eventDateUtc");
        pager.descending = false;
        pager.current_page = 7;
        pager.change_sort("eventType");
        assert_eq!(pager.sort_field, "eventType");
        assert!(pager.descending);
        assert_eq!(pager.current_page, 1);
    }

    #[test]
    fn page_moves_stop_at_the_boundaries() {
        let mut pager = Pager::new("eventDateUtc");
        assert!(!pager.previous_page());
        assert_eq!(pager.current_page, 1);

        pager.current_page = 3;
        assert!(!pager.next_page(3));
        assert_eq!(pager.current_page, 3);

        assert!(pager.previous_page());
        assert_eq!(pager.current_page, 2);
        assert!(pager.next_page(3));
        assert_eq!(pager.current_page, 3);
    }

    #[test]
    fn go_to_page_is_unchecked() {
        let mut pager = Pager::new("eventDateUtc");
        pager.go_to_page(99);
        assert_eq!(pager.current_page, 99);
    }

    #[test]
    fn result_page_range_bounds() {
        let page = LogDataPage {
            log_entries: vec![(); 20],
            total_pages: 5,
            current_page: 3,
            total_items: 95,
        };
        let result = ResultPage::from_wire(20, page);
        assert_eq!(result.range_from, 41);
        assert_eq!(result.range_to, 60);
        assert_eq!(result.range_from + result.entries.len() as u64 - 1, result.range_to);
    }

    #[test]
    fn result_page_range_bounds_for_short_last_page() {
        let page = LogDataPage {
            log_entries: vec![(); 15],
            total_pages: 5,
            current_page: 5,
            total_items: 95,
        };
        let result = ResultPage::from_wire(20, page);
        assert_eq!(result.range_from, 81);
        assert_eq!(result.range_to, 95);
    }

    #[test]
    fn empty_result_page_has_an_empty_range() {
        let page = LogDataPage::<()> {
            log_entries: vec![],
            total_pages: 0,
            current_page: 1,
            total_items: 0,
        };
        let result = ResultPage::from_wire(50, page);
        assert_eq!(result.range_to, 0);
        assert_eq!(result.range_from, 1);
    }

    #[test]
    fn criteria_serialize_with_wire_names() {
        let mut criteria = AuditCriteria::default();
        criteria.search_term = Some("publish".into());
        let value = serde_json::to_value(&criteria).unwrap();
        assert_eq!(value["currentPage"], 1);
        assert_eq!(value["itemsPerPage"], 50);
        assert_eq!(value["sort"], "eventDateUtc");
        assert_eq!(value["reverse"], true);
        assert_eq!(value["searchTerm"], "publish");
        assert!(value["eventType"].is_null());
    }

    proptest! {
        #[test]
        fn page_moves_never_leave_valid_bounds(
            start in 1u32..=25,
            total in 1u32..=25,
            forward in proptest::collection::vec(any::<bool>(), 0..64),
        ) {
            let mut pager = Pager::new("eventDateUtc");
            pager.current_page = start.min(total);
            for step in forward {
                if step {
                    pager.next_page(total);
                } else {
                    pager.previous_page();
                }
                prop_assert!(pager.current_page >= 1);
                prop_assert!(pager.current_page <= total);
            }
        }
    }
}
