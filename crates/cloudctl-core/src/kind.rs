use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// API group of the platform's own resources.
pub const PLATFORM_API_VERSION: &str = "cloud.company.com/v1alpha1";

/// Every object kind the controllers read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Asset,
    ElevatedAccessRequest,
    Organization,
    Product,
    Application,
    Project,
    #[serde(rename = "IAMUserPermission")]
    IamUserPermission,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Asset,
        ResourceKind::ElevatedAccessRequest,
        ResourceKind::Organization,
        ResourceKind::Product,
        ResourceKind::Application,
        ResourceKind::Project,
        ResourceKind::IamUserPermission,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Asset => "Asset",
            ResourceKind::ElevatedAccessRequest => "ElevatedAccessRequest",
            ResourceKind::Organization => "Organization",
            ResourceKind::Product => "Product",
            ResourceKind::Application => "Application",
            ResourceKind::Project => "Project",
            ResourceKind::IamUserPermission => "IAMUserPermission",
        }
    }

    /// The `apiVersion` objects of this kind are written with.
    pub fn api_version(&self) -> &'static str {
        match self {
            ResourceKind::Application => "argoproj.io/v1alpha1",
            ResourceKind::Project => "cloudplatform.gcp.crossplane.io/v1beta1",
            ResourceKind::IamUserPermission => "iam.cloud.company.com/v1alpha1",
            _ => PLATFORM_API_VERSION,
        }
    }

    /// Kinds whose objects are derived by a controller rather than authored.
    pub fn is_derived(&self) -> bool {
        matches!(
            self,
            ResourceKind::Application | ResourceKind::Project | ResourceKind::IamUserPermission
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::invalid_kind(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.as_str().parse::<ResourceKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_kind_parse_is_case_insensitive() {
        assert_eq!(
            "iamuserpermission".parse::<ResourceKind>().unwrap(),
            ResourceKind::IamUserPermission
        );
        assert!("Deployment".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_api_versions() {
        assert_eq!(ResourceKind::Product.api_version(), PLATFORM_API_VERSION);
        assert_eq!(ResourceKind::Application.api_version(), "argoproj.io/v1alpha1");
        assert!(ResourceKind::Project.is_derived());
        assert!(!ResourceKind::Organization.is_derived());
    }
}
