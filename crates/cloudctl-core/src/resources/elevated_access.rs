use serde::{Deserialize, Serialize};
use std::fmt;

use super::{impl_resource, impl_status};
use crate::condition::Condition;
use crate::kind::ResourceKind;
use crate::meta::ObjectMeta;
use crate::time::Timestamp;

/// Request for a time-bounded permission grant on a product.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevatedAccessRequest {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ElevatedAccessRequestSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ElevatedAccessRequestStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevatedAccessRequestSpec {
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub elevated_permissions: Vec<String>,
    #[serde(default)]
    pub asset_names: Vec<String>,
    /// Duration string, e.g. `10m` or `1h30m`.
    #[serde(default)]
    pub ttl: String,
}

/// Lifecycle of a grant. `Expired` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantState {
    Active,
    Expired,
}

impl GrantState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GrantState::Expired)
    }
}

impl fmt::Display for GrantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantState::Active => write!(f, "Active"),
            GrantState::Expired => write!(f, "Expired"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevatedAccessRequestStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<GrantState>,
    /// Name of the permission child while the grant is active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,
}

impl ElevatedAccessRequestStatus {
    pub fn is_expired(&self) -> bool {
        self.state.is_some_and(|s| s.is_terminal())
    }
}

impl_resource!(
    ElevatedAccessRequest,
    ResourceKind::ElevatedAccessRequest,
    ElevatedAccessRequestSpec
);
impl_status!(ElevatedAccessRequest, ElevatedAccessRequestStatus);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_serializes_capitalized() {
        let status = ElevatedAccessRequestStatus {
            state: Some(GrantState::Expired),
            ..Default::default()
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "Expired");
        assert!(status.is_expired());
    }

    #[test]
    fn test_spec_from_manifest() {
        let ear: ElevatedAccessRequest = serde_json::from_value(json!({
            "metadata": {"name": "oncall", "namespace": "team-a"},
            "spec": {
                "userEmail": "a@example.com",
                "productName": "checkout",
                "elevatedPermissions": ["roles/editor"],
                "assetNames": ["checkout-nonprod"],
                "ttl": "1h30m"
            }
        }))
        .unwrap();
        assert_eq!(ear.spec.ttl, "1h30m");
        assert_eq!(ear.spec.elevated_permissions, vec!["roles/editor"]);
    }
}
