//! One-shot seeding of view criteria from a navigation route identifier.
//!
//! The backoffice tree hands a view a single string identifier encoding a
//! preset filter (`date:<from>:<to>`, `node:<id>`, `user:<name>`). Parsing
//! happens once at view activation; the result also carries the path the
//! navigation tree is synced against.

use time::macros::format_description;
use time::Date;

use crate::model::{AuditCriteria, ContentCriteria};

/// Route prefixes a view understands. First matching prefix wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePrefix {
    Date,
    Node,
    User,
}

/// Prefixes understood by the audit trail view.
pub const AUDIT_PREFIXES: &[RoutePrefix] = &[RoutePrefix::Date];

/// Prefixes understood by the content log view.
pub const CONTENT_PREFIXES: &[RoutePrefix] =
    &[RoutePrefix::Date, RoutePrefix::Node, RoutePrefix::User];

/// Filter values decoded from a route identifier. Values that fail to parse
/// seed nothing; the identifier still keeps its path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteSeed {
    DateRange { from: Option<Date>, to: Option<Date> },
    Node { id: Option<i64> },
    /// The user name is resolved later, once the user-name lookup completes.
    User,
    Passthrough,
}

/// A parsed route: the seed plus the navigation path for tree sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRoute {
    pub seed: RouteSeed,
    pub path: Vec<String>,
}

/// Parse `id` against the prefixes the view understands. Identifiers with no
/// matching prefix pass through verbatim as a single-element path.
pub fn parse_route(id: &str, prefixes: &[RoutePrefix]) -> SeededRoute {
    for prefix in prefixes {
        match prefix {
            RoutePrefix::Date if id.starts_with("date:") => {
                let mut parts = id.splitn(3, ':');
                parts.next();
                let from = parts.next().and_then(parse_iso_date);
                let to = parts.next().and_then(parse_iso_date);
                return SeededRoute {
                    seed: RouteSeed::DateRange { from, to },
                    path: vec!["TimePeriod".to_string(), id.to_string()],
                };
            }
            RoutePrefix::Node if id.starts_with("node:") => {
                let node_id = id["node:".len()..].parse::<i64>().ok();
                return SeededRoute {
                    seed: RouteSeed::Node { id: node_id },
                    path: vec!["LatestPages".to_string(), id.to_string()],
                };
            }
            RoutePrefix::User if id.starts_with("user:") => {
                return SeededRoute {
                    seed: RouteSeed::User,
                    path: vec!["ActiveUsers".to_string(), id.to_string()],
                };
            }
            _ => {}
        }
    }
    SeededRoute {
        seed: RouteSeed::Passthrough,
        path: vec![id.to_string()],
    }
}

/// Parse an ISO `YYYY-MM-DD` date, `None` on malformed input.
pub fn parse_iso_date(raw: &str) -> Option<Date> {
    Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()
}

/// Complete a deferred `user:` seed once the name lookup has resolved: split
/// the identifier again and match its name segment against the known names.
/// An unknown name seeds nothing.
pub fn resolve_user_name<'a>(id: &str, names: &'a [String]) -> Option<&'a str> {
    if !id.starts_with("user:") {
        return None;
    }
    let name = id.split(':').nth(1)?;
    names.iter().find(|n| n.as_str() == name).map(String::as_str)
}

/// Apply a parsed seed to audit criteria. Only date ranges seed this view.
pub fn seed_audit_criteria(criteria: &mut AuditCriteria, seed: &RouteSeed) {
    if let RouteSeed::DateRange { from, to } = seed {
        criteria.date_from = *from;
        criteria.date_to = *to;
    }
}

/// Apply a parsed seed to content criteria.
pub fn seed_content_criteria(criteria: &mut ContentCriteria, seed: &RouteSeed) {
    match seed {
        RouteSeed::DateRange { from, to } => {
            criteria.date_from = *from;
            criteria.date_to = *to;
        }
        RouteSeed::Node { id } => criteria.node_id = *id,
        RouteSeed::User | RouteSeed::Passthrough => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn date_route_seeds_both_bounds_and_time_period_path() {
        let route = parse_route("date:2024-01-01:2024-01-31", CONTENT_PREFIXES);
        assert_eq!(
            route.seed,
            RouteSeed::DateRange {
                from: Some(date!(2024 - 01 - 01)),
                to: Some(date!(2024 - 01 - 31)),
            }
        );
        assert_eq!(route.path[0], "TimePeriod");
        assert_eq!(route.path[1], "date:2024-01-01:2024-01-31");

        let mut criteria = ContentCriteria::default();
        seed_content_criteria(&mut criteria, &route.seed);
        assert_eq!(criteria.date_from, Some(date!(2024 - 01 - 01)));
        assert_eq!(criteria.date_to, Some(date!(2024 - 01 - 31)));
    }

    #[test]
    fn malformed_dates_keep_the_path_but_seed_nothing() {
        let route = parse_route("date:jan:feb", AUDIT_PREFIXES);
        assert_eq!(route.seed, RouteSeed::DateRange { from: None, to: None });
        assert_eq!(route.path[0], "TimePeriod");
    }

    #[test]
    fn node_route_seeds_node_id_and_latest_pages_path() {
        let route = parse_route("node:42", CONTENT_PREFIXES);
        assert_eq!(route.seed, RouteSeed::Node { id: Some(42) });
        assert_eq!(route.path[0], "LatestPages");

        let mut criteria = ContentCriteria::default();
        seed_content_criteria(&mut criteria, &route.seed);
        assert_eq!(criteria.node_id, Some(42));
    }

    #[test]
    fn audit_view_does_not_understand_node_routes() {
        let route = parse_route("node:42", AUDIT_PREFIXES);
        assert_eq!(route.seed, RouteSeed::Passthrough);
        assert_eq!(route.path, vec!["node:42".to_string()]);
    }

    #[test]
    fn user_route_defers_the_name_and_gains_active_users_path() {
        let route = parse_route("user:jane", CONTENT_PREFIXES);
        assert_eq!(route.seed, RouteSeed::User);
        assert_eq!(route.path[0], "ActiveUsers");
    }

    #[test]
    fn unknown_identifier_passes_through_as_its_own_path() {
        let route = parse_route("ContentLog", CONTENT_PREFIXES);
        assert_eq!(route.seed, RouteSeed::Passthrough);
        assert_eq!(route.path, vec!["ContentLog".to_string()]);
    }

    #[test]
    fn user_name_resolves_only_against_known_names() {
        let names = vec!["admin".to_string(), "jane".to_string()];
        assert_eq!(resolve_user_name("user:jane", &names), Some("jane"));
        assert_eq!(resolve_user_name("user:ghost", &names), None);
        assert_eq!(resolve_user_name("node:42", &names), None);
    }

    #[test]
    fn audit_seed_ignores_node_values() {
        let mut criteria = AuditCriteria::default();
        seed_audit_criteria(&mut criteria, &RouteSeed::Node { id: Some(9) });
        assert_eq!(criteria.date_from, None);
    }
}
