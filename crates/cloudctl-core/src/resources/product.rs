use serde::{Deserialize, Serialize};

use super::{impl_resource, impl_status};
use crate::condition::Condition;
use crate::kind::ResourceKind;
use crate::meta::{ObjectKey, ObjectMeta};
use crate::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ProductSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub organization: ProductOrganization,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductOrganization {
    #[serde(default)]
    pub name: String,
}

impl ProductSpec {
    /// The organization is always looked up in the product's namespace.
    pub fn organization_key(&self, namespace: &str) -> ObjectKey {
        ObjectKey::new(ResourceKind::Organization, namespace, &self.organization.name)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStatus {
    /// Project children by name.
    #[serde(default)]
    pub projects: Vec<String>,
    /// Principals resolved on the last successful pass.
    #[serde(default)]
    pub principals: Vec<String>,
    /// Permission children by name.
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,
}

impl_resource!(Product, ResourceKind::Product, ProductSpec);
impl_status!(Product, ProductStatus);
