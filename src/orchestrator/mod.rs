//! Query orchestration for the log views.
//!
//! This module owns the criteria/result state machine and the fetch
//! lifecycle (request, success/failure, UI flags) for one view. UI/CLI
//! layers drive it through commands and consume its events to keep
//! responsibilities separated.

mod controller;
mod state;

pub use controller::{
    audit_view, content_view, Controller, Edit, ViewCommand, ViewConfig, ViewEvent, NOTIFY_TITLE,
};
pub use state::ViewState;
