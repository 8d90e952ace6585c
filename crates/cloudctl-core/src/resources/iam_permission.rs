use serde::{Deserialize, Serialize};

use super::impl_resource;
use crate::kind::ResourceKind;
use crate::meta::ObjectMeta;

/// Permission grant for one principal on one product.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IamUserPermission {
    pub metadata: ObjectMeta,
    pub spec: IamUserPermissionSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IamUserPermissionSpec {
    pub user_email: String,
    pub product_name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub asset_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub temporary_permissions: Vec<TemporaryPermission>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporaryPermission {
    pub permission: Vec<String>,
    pub ttl: String,
}

impl_resource!(
    IamUserPermission,
    ResourceKind::IamUserPermission,
    IamUserPermissionSpec
);
