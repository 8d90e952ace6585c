//! Directory service client.
//!
//! Membership is fetched from `GET {base_url}/groups/{group}/members`, which
//! answers with `{"members": ["alice@example.com", ...]}`.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use crate::error::DirectoryError;
use crate::principal::Principal;
use crate::resolver::PrincipalResolver;

#[derive(Debug, Clone)]
pub struct HttpDirectoryConfig {
    pub base_url: Url,
    /// Per-request timeout (default: 10 seconds).
    pub timeout: Duration,
}

impl HttpDirectoryConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(10),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct MembersResponse {
    members: Vec<Principal>,
}

pub struct HttpDirectory {
    http_client: reqwest::Client,
    base_url: Url,
}

impl HttpDirectory {
    pub fn new(config: HttpDirectoryConfig) -> Result<Self, DirectoryError> {
        if config.base_url.cannot_be_a_base() {
            return Err(DirectoryError::InvalidConfig(format!(
                "base url {} cannot have path segments",
                config.base_url
            )));
        }
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DirectoryError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            http_client,
            base_url: config.base_url,
        })
    }

    fn members_url(&self, group: &str) -> Result<Url, DirectoryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DirectoryError::InvalidConfig(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["groups", group, "members"]);
        Ok(url)
    }
}

#[async_trait]
impl PrincipalResolver for HttpDirectory {
    async fn resolve(&self, group: &str) -> Result<BTreeSet<Principal>, DirectoryError> {
        if group.is_empty() {
            return Ok(BTreeSet::new());
        }
        let url = self.members_url(group)?;

        let response = self
            .http_client
            .get(url.as_str())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(group = %group, error = %e, "directory request failed");
                DirectoryError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(DirectoryError::UnknownGroup(group.to_string()));
        }
        if !status.is_success() {
            return Err(DirectoryError::Unavailable(format!(
                "directory answered {status} for group {group}"
            )));
        }

        let body: MembersResponse = response
            .json()
            .await
            .map_err(|e| DirectoryError::InvalidResponse(e.to_string()))?;

        tracing::debug!(group = %group, members = body.members.len(), "resolved group");
        Ok(body.members.into_iter().collect())
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}
