//! Command-line front end: one query cycle per invocation.
//!
//! Builds the view criteria from flags (optionally seeded from a navigation
//! route identifier), runs the view controller until the page settles,
//! prints a text summary, and optionally exports the page as CSV.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use time::Date;
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::{HttpAuditApi, HttpContentApi, LogApi};
use crate::export::{CsvRow, DirSink};
use crate::model::{AuditCriteria, ContentCriteria, Pager, DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS};
use crate::orchestrator::{audit_view, content_view, Controller, ViewCommand, ViewConfig, ViewEvent};
use crate::{route, text_summary};

#[derive(Debug, Parser)]
#[command(
    name = "cmslog",
    version,
    about = "Browse and export CMS audit and content-change logs"
)]
pub struct Cli {
    /// Base URL of the log API
    #[arg(long, default_value = "http://localhost:8080/api")]
    pub base_url: String,

    #[command(subcommand)]
    pub view: ViewArgs,
}

#[derive(Debug, Subcommand)]
pub enum ViewArgs {
    /// Browse the audit trail
    Audit(AuditArgs),
    /// Browse the content-change log
    Content(ContentArgs),
}

/// Options shared by both views.
#[derive(Debug, Args)]
pub struct PageArgs {
    /// Page number to load
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Entries per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = parse_page_size)]
    pub page_size: u32,

    /// Field to sort by (defaults to the view's timestamp field)
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort oldest-first instead of newest-first
    #[arg(long)]
    pub ascending: bool,

    /// Navigation route identifier seeding the initial filters,
    /// e.g. date:2024-01-01:2024-01-31
    #[arg(long)]
    pub route: Option<String>,

    /// Free-text search term
    #[arg(long)]
    pub search: Option<String>,

    /// Only entries on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub date_from: Option<Date>,

    /// Only entries on or before this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub date_to: Option<Date>,

    /// Export the loaded page as CSV into this directory
    #[arg(long)]
    pub export_csv: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct AuditArgs {
    #[command(flatten)]
    pub common: PageArgs,

    /// Filter by event type
    #[arg(long)]
    pub event_type: Option<String>,

    /// Filter by the user who performed the event
    #[arg(long)]
    pub performing_user: Option<String>,

    /// Filter by the user affected by the event
    #[arg(long)]
    pub affected_user: Option<String>,
}

#[derive(Debug, Args)]
pub struct ContentArgs {
    #[command(flatten)]
    pub common: PageArgs,

    /// Filter by log type
    #[arg(long)]
    pub log_type: Option<String>,

    /// Filter by user name
    #[arg(long)]
    pub user: Option<String>,

    /// Filter by content node id
    #[arg(long)]
    pub node: Option<i64>,

    /// Display name of the filtered node
    #[arg(long)]
    pub node_name: Option<String>,
}

fn parse_page_size(raw: &str) -> Result<u32, String> {
    let n: u32 = raw
        .parse()
        .map_err(|_| format!("invalid page size: {raw}"))?;
    if PAGE_SIZE_OPTIONS.contains(&n) {
        Ok(n)
    } else {
        Err(format!("page size must be one of {PAGE_SIZE_OPTIONS:?}"))
    }
}

fn parse_date(raw: &str) -> Result<Date, String> {
    route::parse_iso_date(raw).ok_or_else(|| format!("invalid date (expected YYYY-MM-DD): {raw}"))
}

fn apply_common(pager: &mut Pager, common: &PageArgs) {
    pager.current_page = common.page.max(1);
    pager.items_per_page = common.page_size;
    if let Some(sort) = &common.sort {
        pager.sort_field = sort.clone();
    }
    if common.ascending {
        pager.descending = false;
    }
}

fn build_audit_criteria(args: &AuditArgs) -> AuditCriteria {
    let mut criteria = AuditCriteria::default();
    if let Some(id) = args.common.route.as_deref() {
        let seeded = route::parse_route(id, route::AUDIT_PREFIXES);
        route::seed_audit_criteria(&mut criteria, &seeded.seed);
        debug!(path = ?seeded.path, "navigation path");
    }
    apply_common(&mut criteria.pager, &args.common);
    if args.common.search.is_some() {
        criteria.search_term = args.common.search.clone();
    }
    if args.common.date_from.is_some() {
        criteria.date_from = args.common.date_from;
    }
    if args.common.date_to.is_some() {
        criteria.date_to = args.common.date_to;
    }
    criteria.event_type = args.event_type.clone();
    criteria.performing_user = args.performing_user.clone();
    criteria.affected_user = args.affected_user.clone();
    criteria
}

fn build_content_criteria(args: &ContentArgs) -> ContentCriteria {
    let mut criteria = ContentCriteria::default();
    if let Some(id) = args.common.route.as_deref() {
        let seeded = route::parse_route(id, route::CONTENT_PREFIXES);
        route::seed_content_criteria(&mut criteria, &seeded.seed);
        debug!(path = ?seeded.path, "navigation path");
    }
    apply_common(&mut criteria.pager, &args.common);
    if args.common.search.is_some() {
        criteria.search_term = args.common.search.clone();
    }
    if args.common.date_from.is_some() {
        criteria.date_from = args.common.date_from;
    }
    if args.common.date_to.is_some() {
        criteria.date_to = args.common.date_to;
    }
    criteria.log_type_name = args.log_type.clone();
    if args.user.is_some() {
        criteria.log_user_name = args.user.clone();
    }
    if args.node.is_some() {
        criteria.node_id = args.node;
    }
    if args.node_name.is_some() {
        criteria.node_name = args.node_name.clone();
    }
    criteria
}

pub async fn run(args: Cli) -> Result<()> {
    match args.view {
        ViewArgs::Audit(view) => {
            let criteria = build_audit_criteria(&view);
            let api = HttpAuditApi::new(&args.base_url)?;
            drive_view(
                api,
                criteria,
                audit_view(),
                view.common.route.clone(),
                view.common.export_csv.clone(),
            )
            .await
        }
        ViewArgs::Content(view) => {
            let criteria = build_content_criteria(&view);
            let api = HttpContentApi::new(&args.base_url)?;
            drive_view(
                api,
                criteria,
                content_view(),
                view.common.route.clone(),
                view.common.export_csv.clone(),
            )
            .await
        }
    }
}

/// Run one view until its page settles: print the summary, export when
/// requested, then shut the controller down.
async fn drive_view<A>(
    api: A,
    criteria: A::Criteria,
    config: ViewConfig<A::Criteria>,
    route_id: Option<String>,
    export_dir: Option<PathBuf>,
) -> Result<()>
where
    A: LogApi,
    A::Entry: CsvRow,
{
    let export = export_dir.is_some();
    let sink = DirSink::new(export_dir.unwrap_or_else(DirSink::default_dir));

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let controller = Controller::new(api, criteria, config, route_id, Box::new(sink), event_tx);
    let handle = tokio::spawn(controller.run(cmd_rx));

    let mut page_printed = false;
    while let Some(event) = event_rx.recv().await {
        match event {
            ViewEvent::PageLoaded(page) => {
                for line in text_summary::build_page_summary(&page).lines {
                    println!("{line}");
                }
                page_printed = true;
                if export {
                    let _ = cmd_tx.send(ViewCommand::ExportCsv);
                }
                let _ = cmd_tx.send(ViewCommand::Shutdown);
            }
            ViewEvent::Notify { title, message } => {
                eprintln!("{title}: {message}");
                // A failed type lookup still leaves the data fetch running;
                // any other failure means no page is coming.
                if message != config.types_error {
                    let _ = cmd_tx.send(ViewCommand::Shutdown);
                }
            }
            ViewEvent::CsvExported { filename } => {
                eprintln!("Exported {filename}");
            }
            ViewEvent::ButtonChanged(_)
            | ViewEvent::TypesLoaded(_)
            | ViewEvent::UserNamesLoaded(_) => {}
        }
    }

    handle.await??;
    if !page_printed {
        anyhow::bail!("no log data received");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use time::macros::date;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn page_size_must_come_from_the_fixed_set() {
        assert_eq!(parse_page_size("200"), Ok(200));
        assert!(parse_page_size("30").is_err());
        assert!(parse_page_size("lots").is_err());
    }

    #[test]
    fn route_seeds_then_flags_override() {
        let cli = Cli::parse_from([
            "cmslog",
            "content",
            "--route",
            "date:2024-01-01:2024-01-31",
            "--date-to",
            "2024-02-15",
            "--node",
            "7",
        ]);
        let ViewArgs::Content(view) = cli.view else {
            panic!("expected content view");
        };
        let criteria = build_content_criteria(&view);
        assert_eq!(criteria.date_from, Some(date!(2024 - 01 - 01)));
        assert_eq!(criteria.date_to, Some(date!(2024 - 02 - 15)));
        assert_eq!(criteria.node_id, Some(7));
    }

    #[test]
    fn audit_flags_populate_the_criteria() {
        let cli = Cli::parse_from([
            "cmslog",
            "audit",
            "--page",
            "3",
            "--page-size",
            "100",
            "--sort",
            "eventType",
            "--ascending",
            "--performing-user",
            "admin",
        ]);
        let ViewArgs::Audit(view) = cli.view else {
            panic!("expected audit view");
        };
        let criteria = build_audit_criteria(&view);
        assert_eq!(criteria.pager.current_page, 3);
        assert_eq!(criteria.pager.items_per_page, 100);
        assert_eq!(criteria.pager.sort_field, "eventType");
        assert!(!criteria.pager.descending);
        assert_eq!(criteria.performing_user.as_deref(), Some("admin"));
    }
}
