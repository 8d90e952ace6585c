//! Object identity and metadata shared by every resource kind.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CoreError, Result};
use crate::kind::ResourceKind;
use crate::time::Timestamp;

/// Label carrying the owner's namespace on derived objects that live in a
/// different namespace than their owner.
pub const OWNER_NAMESPACE_LABEL: &str = "cloud.company.com/owner-namespace";

/// Identity of one object in the store: `(kind, namespace, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    pub kind: ResourceKind,
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(kind: ResourceKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parses `Kind/namespace/name`.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, '/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(kind), Some(namespace), Some(name))
                if !namespace.is_empty() && !name.is_empty() =>
            {
                Ok(Self::new(kind.parse()?, namespace, name))
            }
            _ => Err(CoreError::invalid_key(s)),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// Link from a derived object to the object that owns it.
///
/// The store deletes an object once every controller owner is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: ResourceKind,
    pub name: String,
    pub uid: String,
    #[serde(default)]
    pub controller: bool,
    #[serde(default)]
    pub block_owner_deletion: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_timestamp: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finalizers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owner_references: Vec<OwnerReference>,
}

impl ObjectMeta {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn key(&self, kind: ResourceKind) -> ObjectKey {
        ObjectKey::new(kind, &self.namespace, &self.name)
    }

    pub fn generation(&self) -> i64 {
        self.generation.unwrap_or(0)
    }

    pub fn is_deleting(&self) -> bool {
        self.deletion_timestamp.is_some()
    }

    pub fn has_finalizer(&self, finalizer: &str) -> bool {
        self.finalizers.iter().any(|f| f == finalizer)
    }

    /// Returns `true` if the finalizer was added.
    pub fn add_finalizer(&mut self, finalizer: &str) -> bool {
        if self.has_finalizer(finalizer) {
            return false;
        }
        self.finalizers.push(finalizer.to_string());
        true
    }

    /// Returns `true` if the finalizer was present.
    pub fn remove_finalizer(&mut self, finalizer: &str) -> bool {
        let before = self.finalizers.len();
        self.finalizers.retain(|f| f != finalizer);
        before != self.finalizers.len()
    }

    /// The owner reference marked `controller: true`, if any.
    pub fn controller_owner(&self) -> Option<&OwnerReference> {
        self.owner_references.iter().find(|r| r.controller)
    }

    /// Whether the controlling owner has the given uid.
    pub fn is_controlled_by(&self, uid: &str) -> bool {
        self.controller_owner().is_some_and(|r| r.uid == uid)
    }

    /// Builds the owner reference a child of this object must carry.
    pub fn controller_reference(&self, kind: ResourceKind) -> Result<OwnerReference> {
        let uid = self
            .uid
            .clone()
            .ok_or_else(|| CoreError::missing_uid(self.key(kind)))?;
        Ok(OwnerReference {
            api_version: kind.api_version().to_string(),
            kind,
            name: self.name.clone(),
            uid,
            controller: true,
            block_owner_deletion: true,
        })
    }

    /// Replaces any existing controller reference with `owner`, keeping
    /// non-controller references. Returns `true` if anything changed.
    pub fn set_controller_reference(&mut self, owner: OwnerReference) -> bool {
        if self.controller_owner() == Some(&owner) {
            return false;
        }
        self.owner_references.retain(|r| !r.controller);
        self.owner_references.push(owner);
        true
    }
}
