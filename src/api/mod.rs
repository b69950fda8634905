//! Seam to the remote log and lookup API.
//!
//! Each view talks to the service through one [`LogApi`] implementation; the
//! orchestrator treats every failure as opaque and reports it uniformly.

mod http;

pub use http::{HttpAuditApi, HttpContentApi};

use anyhow::Result;
use async_trait::async_trait;

use crate::model::{Criteria, LogDataPage};

/// Remote API surface one log view talks to.
///
/// `get_types` covers both flavours of the type lookup: audit event types and
/// content log types.
#[async_trait]
pub trait LogApi: Send + Sync + 'static {
    type Criteria: Criteria;
    type Entry: Clone + Send + Sync + 'static;

    async fn get_log_data(&self, criteria: &Self::Criteria) -> Result<LogDataPage<Self::Entry>>;

    async fn get_types(&self) -> Result<Vec<String>>;

    async fn get_user_names(&self) -> Result<Vec<String>>;
}
