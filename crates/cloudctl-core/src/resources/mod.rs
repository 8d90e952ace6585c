//! Typed views over the objects the controllers read and write.
//!
//! Parent kinds (`Asset`, `ElevatedAccessRequest`, `Organization`,
//! `Product`) are authored by users and carry a status written only by their
//! own controller. Child kinds (`Application`, `Project`,
//! `IamUserPermission`) are derived; their spec is a pure function of the
//! parent.

mod application;
mod asset;
mod elevated_access;
mod iam_permission;
mod organization;
mod product;
mod project;

pub use application::{
    Application, ApplicationDestination, ApplicationSource, ApplicationSpec, AutomatedSync,
    SyncPolicy,
};
pub use asset::{Asset, AssetClaims, AssetSpec, AssetStatus};
pub use elevated_access::{
    ElevatedAccessRequest, ElevatedAccessRequestSpec, ElevatedAccessRequestStatus, GrantState,
};
pub use iam_permission::{IamUserPermission, IamUserPermissionSpec, TemporaryPermission};
pub use organization::{Organization, OrganizationReference, OrganizationSpec, OrganizationStatus};
pub use product::{Product, ProductOrganization, ProductSpec, ProductStatus};
pub use project::{ProjectParameters, Project, ProjectSpec, ProviderConfigReference};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::condition::StatusConditions;
use crate::kind::ResourceKind;
use crate::meta::{ObjectKey, ObjectMeta};
use crate::time::Timestamp;

/// An object with a fixed kind and standard metadata.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn meta(&self) -> &ObjectMeta;
    fn meta_mut(&mut self) -> &mut ObjectMeta;

    fn key(&self) -> ObjectKey {
        self.meta().key(Self::KIND)
    }

    fn name(&self) -> &str {
        &self.meta().name
    }

    fn namespace(&self) -> &str {
        &self.meta().namespace
    }
}

/// Objects with a desired-state payload.
pub trait HasSpec: Resource {
    type Spec: Clone + PartialEq + std::fmt::Debug + Send + Sync;

    fn spec(&self) -> &Self::Spec;
    fn spec_mut(&mut self) -> &mut Self::Spec;
    fn from_parts(metadata: ObjectMeta, spec: Self::Spec) -> Self;
}

/// Bookkeeping every status block carries.
pub trait ObservedStatus {
    fn observed_generation(&self) -> Option<i64>;
    fn last_updated(&self) -> Option<Timestamp>;

    /// Records that the given generation was processed at `now`.
    fn observe(&mut self, generation: i64, now: Timestamp);
}

/// Objects with a controller-owned status block.
pub trait HasStatus: Resource {
    type Status: Default
        + Clone
        + PartialEq
        + std::fmt::Debug
        + Serialize
        + DeserializeOwned
        + StatusConditions
        + ObservedStatus
        + Send
        + Sync;

    fn status(&self) -> Option<&Self::Status>;
    fn status_mut(&mut self) -> &mut Self::Status;
}

macro_rules! impl_resource {
    ($ty:ident, $kind:expr, $spec:ident) => {
        impl $crate::resources::Resource for $ty {
            const KIND: $crate::kind::ResourceKind = $kind;

            fn meta(&self) -> &$crate::meta::ObjectMeta {
                &self.metadata
            }

            fn meta_mut(&mut self) -> &mut $crate::meta::ObjectMeta {
                &mut self.metadata
            }
        }

        impl $crate::resources::HasSpec for $ty {
            type Spec = $spec;

            fn spec(&self) -> &$spec {
                &self.spec
            }

            fn spec_mut(&mut self) -> &mut $spec {
                &mut self.spec
            }

            fn from_parts(metadata: $crate::meta::ObjectMeta, spec: $spec) -> Self {
                Self {
                    metadata,
                    spec,
                    ..Default::default()
                }
            }
        }
    };
}

macro_rules! impl_status {
    ($ty:ident, $status:ident) => {
        impl $crate::resources::HasStatus for $ty {
            type Status = $status;

            fn status(&self) -> Option<&$status> {
                self.status.as_ref()
            }

            fn status_mut(&mut self) -> &mut $status {
                self.status.get_or_insert_with(Default::default)
            }
        }

        impl $crate::resources::ObservedStatus for $status {
            fn observed_generation(&self) -> Option<i64> {
                self.observed_generation
            }

            fn last_updated(&self) -> Option<$crate::time::Timestamp> {
                self.last_updated
            }

            fn observe(&mut self, generation: i64, now: $crate::time::Timestamp) {
                self.observed_generation = Some(generation);
                self.last_updated = Some(now);
            }
        }

        impl $crate::condition::StatusConditions for $status {
            fn conditions(&self) -> &[$crate::condition::Condition] {
                &self.conditions
            }

            fn conditions_mut(&mut self) -> &mut Vec<$crate::condition::Condition> {
                &mut self.conditions
            }
        }
    };
}

pub(crate) use impl_resource;
pub(crate) use impl_status;
