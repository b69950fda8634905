//! reqwest-backed log API clients for both views.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use super::LogApi;
use crate::model::{AuditCriteria, AuditEntry, ContentCriteria, ContentEntry, LogDataPage};

const USER_AGENT: &str = concat!("cmslog/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("build http client")
}

async fn fetch_names(client: &reqwest::Client, url: String) -> Result<Vec<String>> {
    let resp = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("request {url}"))?
        .error_for_status()
        .with_context(|| format!("request {url} failed"))?;
    resp.json().await.context("decode name list")
}

/// HTTP client for the audit trail endpoints.
pub struct HttpAuditApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuditApi {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, tail: &str) -> String {
        format!("{}/audittrail/{tail}", self.base_url)
    }
}

#[async_trait]
impl LogApi for HttpAuditApi {
    type Criteria = AuditCriteria;
    type Entry = AuditEntry;

    async fn get_log_data(&self, criteria: &AuditCriteria) -> Result<LogDataPage<AuditEntry>> {
        let url = self.url("logdata");
        let resp = self
            .client
            .post(&url)
            .json(criteria)
            .send()
            .await
            .with_context(|| format!("request {url}"))?
            .error_for_status()
            .with_context(|| format!("request {url} failed"))?;
        resp.json().await.context("decode audit log page")
    }

    async fn get_types(&self) -> Result<Vec<String>> {
        fetch_names(&self.client, self.url("eventtypes")).await
    }

    async fn get_user_names(&self) -> Result<Vec<String>> {
        fetch_names(&self.client, self.url("usernames")).await
    }
}

/// HTTP client for the content-change log endpoints.
pub struct HttpContentApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpContentApi {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, tail: &str) -> String {
        format!("{}/contentlog/{tail}", self.base_url)
    }
}

#[async_trait]
impl LogApi for HttpContentApi {
    type Criteria = ContentCriteria;
    type Entry = ContentEntry;

    async fn get_log_data(&self, criteria: &ContentCriteria) -> Result<LogDataPage<ContentEntry>> {
        let url = self.url("logdata");
        let resp = self
            .client
            .post(&url)
            .json(criteria)
            .send()
            .await
            .with_context(|| format!("request {url}"))?
            .error_for_status()
            .with_context(|| format!("request {url} failed"))?;
        resp.json().await.context("decode content log page")
    }

    async fn get_types(&self) -> Result<Vec<String>> {
        fetch_names(&self.client, self.url("logtypes")).await
    }

    async fn get_user_names(&self) -> Result<Vec<String>> {
        fetch_names(&self.client, self.url("usernames")).await
    }
}
