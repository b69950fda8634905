//! Pure criteria/result state machine for one log view.
//!
//! Methods here mutate criteria and fold fetch outcomes; actually issuing
//! fetches is the controller's job. The `-> bool` returns on the mutation
//! methods say whether the mutation calls for a fetch.

use crate::model::{ButtonState, Criteria, LogDataPage, ResultPage};

/// Mutable state for one log view: the criteria being edited, the most
/// recently fetched page, and the search-control lifecycle flag.
#[derive(Debug)]
pub struct ViewState<C: Criteria, T> {
    pub criteria: C,
    pub page: Option<ResultPage<T>>,
    /// Total pages reported by the last successful fetch; 0 before that.
    pub total_pages: u32,
    pub button: ButtonState,
    pub is_loading: bool,
    /// Event/log types from the lookup, for dropdown population.
    pub types: Vec<String>,
    /// Distinct user names from the lookup, for dropdown population.
    pub user_names: Vec<String>,
}

impl<C: Criteria, T> ViewState<C, T> {
    pub fn new(criteria: C) -> Self {
        Self {
            criteria,
            page: None,
            total_pages: 0,
            button: ButtonState::Init,
            is_loading: true,
            types: Vec::new(),
            user_names: Vec::new(),
        }
    }

    /// Sort by `field`, flipping direction on a repeat, and return to the
    /// first page.
    pub fn change_sort(&mut self, field: &str) -> bool {
        self.criteria.pager_mut().change_sort(field);
        true
    }

    pub fn previous_page(&mut self) -> bool {
        self.criteria.pager_mut().previous_page()
    }

    pub fn next_page(&mut self) -> bool {
        let total = self.total_pages;
        self.criteria.pager_mut().next_page(total)
    }

    pub fn go_to_page(&mut self, page: u32) -> bool {
        self.criteria.pager_mut().go_to_page(page);
        true
    }

    /// Apply a filter edit, then return to the first page of the new result
    /// set.
    pub fn apply_filter_change(&mut self, edit: impl FnOnce(&mut C)) -> bool {
        edit(&mut self.criteria);
        self.criteria.pager_mut().reset_page();
        true
    }

    /// Guarded search trigger. A search already in flight (button not in its
    /// initial state) rejects the trigger; a permitted one arms the button
    /// and behaves like a filter change.
    pub fn begin_search(&mut self) -> bool {
        if !self.button.is_initial() {
            return false;
        }
        self.button = ButtonState::Busy;
        self.criteria.pager_mut().reset_page();
        true
    }

    /// Fold a successful response into the view, replacing the loaded page
    /// wholesale and echoing the server's page number back into the
    /// criteria. Returns true when the button flashed an outcome and a
    /// delayed reset should be scheduled.
    pub fn apply_fetch_success(&mut self, wire: LogDataPage<T>) -> bool {
        let page = ResultPage::from_wire(self.criteria.pager().items_per_page, wire);
        self.total_pages = page.total_pages;
        self.criteria.pager_mut().current_page = page.current_page;
        self.page = Some(page);
        self.is_loading = false;
        self.flash_outcome(ButtonState::Success)
    }

    /// Record a failed fetch. The previously loaded page stays visible.
    pub fn apply_fetch_failure(&mut self) -> bool {
        self.flash_outcome(ButtonState::Error)
    }

    fn flash_outcome(&mut self, outcome: ButtonState) -> bool {
        if self.button.is_initial() {
            return false;
        }
        self.button = outcome;
        true
    }

    /// Delayed reset after a flashed outcome. Idempotent, so overlapping
    /// reset timers are harmless.
    pub fn reset_button(&mut self) {
        self.button = ButtonState::Init;
    }
}
