//! View lifecycle controller.
//!
//! Owns the fetch lifecycle for one log view and emits events for
//! presentation layers. All state mutation happens on this task; fetches and
//! lookups run in spawned tasks that report back over an internal channel,
//! so completions are applied in settle order.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::warn;

use super::state::ViewState;
use crate::api::LogApi;
use crate::export::{self, CsvRow, FileSink};
use crate::model::{
    AuditCriteria, ButtonState, ContentCriteria, LogDataPage, ResultPage, BUTTON_RESET_DELAY,
};
use crate::route;

/// Title used for every error notification.
pub const NOTIFY_TITLE: &str = "Error";

/// A deferred criteria edit applied on the controller task.
pub type Edit<C> = Box<dyn FnOnce(&mut C) + Send>;

/// Commands emitted by UI layers to drive the view.
pub enum ViewCommand<C> {
    /// Apply a criteria edit, reset to the first page, and fetch. Used by
    /// every filter/search-term/picker mutation.
    Filter(Edit<C>),
    /// Guarded search trigger (audit view). Rejected while a search is in
    /// flight; the optional edit is applied only when the trigger is
    /// admitted.
    Search(Option<Edit<C>>),
    /// Sort by the given field, toggling direction on a repeat.
    Sort(String),
    PreviousPage,
    NextPage,
    /// Jump to a page number the caller knows to be valid.
    GoToPage(u32),
    /// Re-run the current criteria without mutating them.
    Fetch,
    /// Export the currently loaded page through the file sink.
    ExportCsv,
    /// Stop the controller loop.
    Shutdown,
}

/// Events emitted back to presentation layers.
#[derive(Debug)]
pub enum ViewEvent<T> {
    /// A fetch settled successfully and replaced the loaded page.
    PageLoaded(ResultPage<T>),
    /// A fetch or lookup failed; destined for the notification sink.
    Notify {
        title: &'static str,
        message: &'static str,
    },
    ButtonChanged(ButtonState),
    TypesLoaded(Vec<String>),
    UserNamesLoaded(Vec<String>),
    CsvExported { filename: &'static str },
}

/// Fixed per-view strings and seeding hooks.
pub struct ViewConfig<C> {
    pub load_error: &'static str,
    pub types_error: &'static str,
    pub users_error: &'static str,
    pub csv_filename: &'static str,
    /// Applies a deferred `user:` route value once the name lookup resolves.
    pub seed_user: Option<fn(&mut C, &str)>,
}

impl<C> Clone for ViewConfig<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for ViewConfig<C> {}

/// Configuration of the audit trail view.
pub fn audit_view() -> ViewConfig<AuditCriteria> {
    ViewConfig {
        load_error: "Could not load audit log data.",
        types_error: "Could not load audit log types.",
        users_error: "Could not load log usernames.",
        csv_filename: export::AUDIT_CSV_FILENAME,
        seed_user: None,
    }
}

/// Configuration of the content log view.
pub fn content_view() -> ViewConfig<ContentCriteria> {
    ViewConfig {
        load_error: "Could not load log data.",
        types_error: "Could not load log types.",
        users_error: "Could not load log usernames.",
        csv_filename: export::CONTENT_CSV_FILENAME,
        seed_user: Some(|criteria, name| criteria.log_user_name = Some(name.to_string())),
    }
}

/// Internal completions flowing back to the controller task.
enum Internal<T> {
    Fetched(Result<LogDataPage<T>>),
    Types(Result<Vec<String>>),
    UserNames(Result<Vec<String>>),
    ButtonReset,
}

/// Query orchestrator for one log view. Owns the view state for the view's
/// lifetime; UI layers talk to it through [`ViewCommand`]s and consume
/// [`ViewEvent`]s.
pub struct Controller<A: LogApi> {
    api: Arc<A>,
    state: ViewState<A::Criteria, A::Entry>,
    config: ViewConfig<A::Criteria>,
    /// The activation route identifier, kept for deferred `user:` seeding.
    route_id: Option<String>,
    sink: Box<dyn FileSink>,
    event_tx: UnboundedSender<ViewEvent<A::Entry>>,
}

impl<A> Controller<A>
where
    A: LogApi,
    A::Entry: CsvRow,
{
    pub fn new(
        api: A,
        criteria: A::Criteria,
        config: ViewConfig<A::Criteria>,
        route_id: Option<String>,
        sink: Box<dyn FileSink>,
        event_tx: UnboundedSender<ViewEvent<A::Entry>>,
    ) -> Self {
        Self {
            api: Arc::new(api),
            state: ViewState::new(criteria),
            config,
            route_id,
            sink,
            event_tx,
        }
    }

    /// Run the view until a shutdown command arrives or every command sender
    /// is gone.
    ///
    /// Both lookups start immediately; the first data fetch waits for the
    /// user-name lookup so a `user:` route can finish seeding the criteria
    /// first. The type lookup has no ordering dependency.
    pub async fn run(
        mut self,
        mut cmd_rx: UnboundedReceiver<ViewCommand<A::Criteria>>,
    ) -> Result<()> {
        let (internal_tx, mut internal_rx) = tokio::sync::mpsc::unbounded_channel();

        self.spawn_types_lookup(&internal_tx);
        self.spawn_user_names_lookup(&internal_tx);

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => {
                            if !self.handle_command(cmd, &internal_tx) {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                Some(done) = internal_rx.recv() => {
                    self.handle_internal(done, &internal_tx);
                }
            }
        }

        Ok(())
    }

    /// Returns false when the loop should stop.
    fn handle_command(
        &mut self,
        cmd: ViewCommand<A::Criteria>,
        internal_tx: &UnboundedSender<Internal<A::Entry>>,
    ) -> bool {
        let fetch = match cmd {
            ViewCommand::Filter(edit) => self.state.apply_filter_change(edit),
            ViewCommand::Search(edit) => {
                if self.state.begin_search() {
                    if let Some(edit) = edit {
                        edit(&mut self.state.criteria);
                    }
                    self.emit(ViewEvent::ButtonChanged(ButtonState::Busy));
                    true
                } else {
                    false
                }
            }
            ViewCommand::Sort(field) => self.state.change_sort(&field),
            ViewCommand::PreviousPage => self.state.previous_page(),
            ViewCommand::NextPage => self.state.next_page(),
            ViewCommand::GoToPage(page) => self.state.go_to_page(page),
            ViewCommand::Fetch => true,
            ViewCommand::ExportCsv => {
                self.export_csv();
                false
            }
            ViewCommand::Shutdown => return false,
        };

        if fetch {
            self.spawn_fetch(internal_tx);
        }
        true
    }

    fn handle_internal(
        &mut self,
        done: Internal<A::Entry>,
        internal_tx: &UnboundedSender<Internal<A::Entry>>,
    ) {
        match done {
            Internal::Fetched(Ok(wire)) => {
                let flash = self.state.apply_fetch_success(wire);
                if let Some(page) = &self.state.page {
                    self.emit(ViewEvent::PageLoaded(page.clone()));
                }
                if flash {
                    self.emit(ViewEvent::ButtonChanged(ButtonState::Success));
                    self.schedule_button_reset(internal_tx);
                }
            }
            Internal::Fetched(Err(err)) => {
                warn!("log data fetch failed: {err:#}");
                self.emit(ViewEvent::Notify {
                    title: NOTIFY_TITLE,
                    message: self.config.load_error,
                });
                let flash = self.state.apply_fetch_failure();
                if flash {
                    self.emit(ViewEvent::ButtonChanged(ButtonState::Error));
                    self.schedule_button_reset(internal_tx);
                }
            }
            Internal::Types(Ok(types)) => {
                self.state.types = types.clone();
                self.emit(ViewEvent::TypesLoaded(types));
            }
            Internal::Types(Err(err)) => {
                warn!("type lookup failed: {err:#}");
                self.emit(ViewEvent::Notify {
                    title: NOTIFY_TITLE,
                    message: self.config.types_error,
                });
            }
            Internal::UserNames(Ok(names)) => {
                self.state.user_names = names.clone();
                self.complete_user_seed();
                self.emit(ViewEvent::UserNamesLoaded(names));
                // The first fetch was waiting on this lookup.
                self.spawn_fetch(internal_tx);
            }
            Internal::UserNames(Err(err)) => {
                // The first fetch stays deferred; the view keeps working for
                // explicit commands.
                warn!("user name lookup failed: {err:#}");
                self.emit(ViewEvent::Notify {
                    title: NOTIFY_TITLE,
                    message: self.config.users_error,
                });
            }
            Internal::ButtonReset => {
                self.state.reset_button();
                self.emit(ViewEvent::ButtonChanged(ButtonState::Init));
            }
        }
    }

    fn complete_user_seed(&mut self) {
        let Some(id) = self.route_id.as_deref() else {
            return;
        };
        let Some(seed_user) = self.config.seed_user else {
            return;
        };
        if let Some(name) = route::resolve_user_name(id, &self.state.user_names) {
            let name = name.to_string();
            seed_user(&mut self.state.criteria, &name);
        }
    }

    /// In-flight requests are never cancelled; whichever response settles
    /// last overwrites the loaded page.
    fn spawn_fetch(&self, internal_tx: &UnboundedSender<Internal<A::Entry>>) {
        let api = Arc::clone(&self.api);
        let criteria = self.state.criteria.clone();
        let internal_tx = internal_tx.clone();
        tokio::spawn(async move {
            let _ = internal_tx.send(Internal::Fetched(api.get_log_data(&criteria).await));
        });
    }

    fn spawn_types_lookup(&self, internal_tx: &UnboundedSender<Internal<A::Entry>>) {
        let api = Arc::clone(&self.api);
        let internal_tx = internal_tx.clone();
        tokio::spawn(async move {
            let _ = internal_tx.send(Internal::Types(api.get_types().await));
        });
    }

    fn spawn_user_names_lookup(&self, internal_tx: &UnboundedSender<Internal<A::Entry>>) {
        let api = Arc::clone(&self.api);
        let internal_tx = internal_tx.clone();
        tokio::spawn(async move {
            let _ = internal_tx.send(Internal::UserNames(api.get_user_names().await));
        });
    }

    /// The reset timer is never cancelled; a second search can race it, but
    /// both timers write the same idempotent value.
    fn schedule_button_reset(&self, internal_tx: &UnboundedSender<Internal<A::Entry>>) {
        let internal_tx = internal_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(BUTTON_RESET_DELAY).await;
            let _ = internal_tx.send(Internal::ButtonReset);
        });
    }

    /// Snapshot the loaded page as CSV and hand it to the file sink. A view
    /// with nothing loaded exports a header-only file.
    fn export_csv(&mut self) {
        let entries = self
            .state
            .page
            .as_ref()
            .map(|page| page.entries.as_slice())
            .unwrap_or(&[]);
        let payload = export::export_payload(entries);
        match self.sink.download(self.config.csv_filename, &payload) {
            Ok(()) => self.emit(ViewEvent::CsvExported {
                filename: self.config.csv_filename,
            }),
            Err(err) => warn!("csv export failed: {err:#}"),
        }
    }

    fn emit(&self, event: ViewEvent<A::Entry>) {
        let _ = self.event_tx.send(event);
    }
}
