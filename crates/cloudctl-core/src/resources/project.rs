use serde::{Deserialize, Serialize};

use super::impl_resource;
use crate::kind::ResourceKind;
use crate::meta::ObjectMeta;

/// Cloud project handed to the provisioning backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub metadata: ObjectMeta,
    pub spec: ProjectSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpec {
    pub for_provider: ProjectParameters,
    pub provider_config_ref: ProviderConfigReference,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectParameters {
    /// Cloud project id.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProviderConfigReference {
    pub name: String,
}

impl_resource!(Project, ResourceKind::Project, ProjectSpec);
