//! Sources for the claims an asset's repository declares.
//!
//! An HTTP source reads `<repositoryUrl>/raw/<gitCommit>/claims.json`, which
//! holds `{"claims": [{"name": "..."}]}`. A missing file means the asset
//! declares no claims.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use cloudctl_core::resources::AssetClaims;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Claim {
    pub name: String,
}

impl Claim {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClaimSourceError {
    #[error("Invalid repository: {0}")]
    InvalidRepository(String),

    #[error("Claim source unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid claims document: {0}")]
    InvalidDocument(String),
}

impl ClaimSourceError {
    /// Only an unreachable source can heal without a spec change.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Reads the claims declared at one commit of a repository.
#[async_trait]
pub trait ClaimSource: Send + Sync {
    /// Claims sorted by name, without duplicates.
    async fn fetch(&self, source: &AssetClaims) -> Result<Vec<Claim>, ClaimSourceError>;

    fn backend_name(&self) -> &'static str;
}

pub type DynClaimSource = Arc<dyn ClaimSource>;

fn normalize(claims: impl IntoIterator<Item = Claim>) -> Vec<Claim> {
    claims
        .into_iter()
        .filter(|c| !c.name.trim().is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Every asset declares nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoClaims;

#[async_trait]
impl ClaimSource for NoClaims {
    async fn fetch(&self, _source: &AssetClaims) -> Result<Vec<Claim>, ClaimSourceError> {
        Ok(Vec::new())
    }

    fn backend_name(&self) -> &'static str {
        "none"
    }
}

/// Claims keyed by `(repositoryUrl, gitCommit)`.
#[derive(Debug, Default)]
pub struct StaticClaimSource {
    claims: DashMap<(String, String), Vec<Claim>>,
}

impl StaticClaimSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_claims<I, S>(&self, repository_url: &str, git_commit: &str, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let claims = names.into_iter().map(Claim::new).collect();
        self.claims.insert(
            (repository_url.to_string(), git_commit.to_string()),
            claims,
        );
    }

    #[must_use]
    pub fn with_claims<I, S>(self, repository_url: &str, git_commit: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_claims(repository_url, git_commit, names);
        self
    }
}

#[async_trait]
impl ClaimSource for StaticClaimSource {
    async fn fetch(&self, source: &AssetClaims) -> Result<Vec<Claim>, ClaimSourceError> {
        let key = (source.repository_url.clone(), source.git_commit.clone());
        let claims = self
            .claims
            .get(&key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        Ok(normalize(claims))
    }

    fn backend_name(&self) -> &'static str {
        "static"
    }
}

#[derive(Debug, Deserialize)]
struct ClaimsDocument {
    #[serde(default)]
    claims: Vec<Claim>,
}

/// Reads `claims.json` from a git host that serves raw files.
pub struct HttpClaimSource {
    http_client: reqwest::Client,
}

impl HttpClaimSource {
    pub fn new(timeout: Duration) -> Result<Self, ClaimSourceError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClaimSourceError::Unavailable(e.to_string()))?;
        Ok(Self { http_client })
    }

    fn document_url(source: &AssetClaims) -> Result<Url, ClaimSourceError> {
        let mut url = Url::parse(&source.repository_url).map_err(|e| {
            ClaimSourceError::InvalidRepository(format!("{}: {e}", source.repository_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| ClaimSourceError::InvalidRepository(source.repository_url.clone()))?
            .pop_if_empty()
            .extend(["raw", source.git_commit.as_str(), "claims.json"]);
        if !source.git_branch.is_empty() {
            url.query_pairs_mut()
                .append_pair("branch", &source.git_branch);
        }
        Ok(url)
    }
}

#[async_trait]
impl ClaimSource for HttpClaimSource {
    async fn fetch(&self, source: &AssetClaims) -> Result<Vec<Claim>, ClaimSourceError> {
        let url = Self::document_url(source)?;

        let response = self
            .http_client
            .get(url.as_str())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %url, error = %e, "claims request failed");
                ClaimSourceError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(url = %url, "no claims document");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(ClaimSourceError::Unavailable(format!(
                "{url} answered {status}"
            )));
        }

        let document: ClaimsDocument = response
            .json()
            .await
            .map_err(|e| ClaimSourceError::InvalidDocument(e.to_string()))?;
        Ok(normalize(document.claims))
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}
