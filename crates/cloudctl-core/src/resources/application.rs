use serde::{Deserialize, Serialize};

use super::impl_resource;
use crate::kind::ResourceKind;
use crate::meta::ObjectMeta;

/// Deployment-pipeline application consumed by Argo CD.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub metadata: ObjectMeta,
    pub spec: ApplicationSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    pub project: String,
    pub source: ApplicationSource,
    pub destination: ApplicationDestination,
    #[serde(default)]
    pub sync_policy: SyncPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSource {
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    pub target_revision: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDestination {
    pub server: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automated: Option<AutomatedSync>,
    #[serde(default)]
    pub sync_options: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomatedSync {
    pub prune: bool,
    pub self_heal: bool,
}

impl_resource!(Application, ResourceKind::Application, ApplicationSpec);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_uses_repo_url_field_name() {
        let spec = ApplicationSpec {
            source: ApplicationSource {
                repo_url: "https://git.example.com/checkout".to_string(),
                target_revision: "abc123".to_string(),
                path: "claims".to_string(),
            },
            ..Default::default()
        };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["source"]["repoURL"], "https://git.example.com/checkout");
        assert_eq!(json["source"]["targetRevision"], "abc123");
    }
}
