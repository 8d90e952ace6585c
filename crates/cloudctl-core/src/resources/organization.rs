use serde::{Deserialize, Serialize};

use super::{impl_resource, impl_status};
use crate::condition::Condition;
use crate::kind::ResourceKind;
use crate::meta::{ObjectKey, ObjectMeta};
use crate::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: OrganizationSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrganizationStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_by: Option<OrganizationReference>,
    #[serde(default)]
    pub member_of: Vec<OrganizationReference>,
    /// Directory group holding the approvers.
    #[serde(default)]
    pub approvers: String,
    /// Directory group holding the members.
    #[serde(default)]
    pub members: String,
}

/// Reference to another organization, defaulting to the referrer's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationReference {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl OrganizationReference {
    pub fn key(&self, default_namespace: &str) -> ObjectKey {
        ObjectKey::new(
            ResourceKind::Organization,
            self.namespace.as_deref().unwrap_or(default_namespace),
            &self.name,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationStatus {
    #[serde(default)]
    pub approvers: Vec<String>,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,
}

impl_resource!(Organization, ResourceKind::Organization, OrganizationSpec);
impl_status!(Organization, OrganizationStatus);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_defaults_namespace() {
        let local = OrganizationReference {
            name: "platform".to_string(),
            namespace: None,
        };
        assert_eq!(local.key("team-a").to_string(), "Organization/team-a/platform");

        let remote = OrganizationReference {
            name: "platform".to_string(),
            namespace: Some("root".to_string()),
        };
        assert_eq!(remote.key("team-a").to_string(), "Organization/root/platform");
    }
}
