use serde::{Deserialize, Serialize};

use super::{impl_resource, impl_status};
use crate::condition::Condition;
use crate::kind::ResourceKind;
use crate::meta::ObjectMeta;
use crate::time::Timestamp;

/// A deployable unit whose infrastructure claims live in a git repository.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: AssetSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AssetStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSpec {
    #[serde(default)]
    pub claims: AssetClaims,
}

/// Repository coordinates of the asset's claims.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetClaims {
    #[serde(default)]
    pub repository_url: String,
    #[serde(default)]
    pub git_branch: String,
    #[serde(default)]
    pub git_commit: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetStatus {
    /// Name of the deployment application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    /// Claim names resolved on the last successful pass.
    #[serde(default)]
    pub claims: Vec<String>,
    /// Names of the Project children provisioned for the claims.
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,
}

impl_resource!(Asset, ResourceKind::Asset, AssetSpec);
impl_status!(Asset, AssetStatus);
