use serde::{Deserialize, Serialize};

use crate::meta::{ObjectKey, OwnerReference};
use crate::time::{Timestamp, now_utc};

/// Type of change to a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceEventType {
    Created,
    /// Metadata or spec changed.
    Updated,
    /// Only the status subresource changed.
    StatusUpdated,
    Deleted,
}

impl ResourceEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceEventType::Created => "created",
            ResourceEventType::Updated => "updated",
            ResourceEventType::StatusUpdated => "statusUpdated",
            ResourceEventType::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for ResourceEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event representing a change to one stored object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEvent {
    pub event_type: ResourceEventType,
    pub key: ObjectKey,
    /// Owner references of the object as of this change.
    #[serde(default)]
    pub owner_references: Vec<OwnerReference>,
    /// Namespace of the owner when it differs from the object's own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_namespace: Option<String>,
    pub timestamp: Timestamp,
}

impl ResourceEvent {
    pub fn new(event_type: ResourceEventType, key: ObjectKey) -> Self {
        Self {
            event_type,
            key,
            owner_references: Vec::new(),
            owner_namespace: None,
            timestamp: now_utc(),
        }
    }

    pub fn created(key: ObjectKey) -> Self {
        Self::new(ResourceEventType::Created, key)
    }

    pub fn updated(key: ObjectKey) -> Self {
        Self::new(ResourceEventType::Updated, key)
    }

    pub fn status_updated(key: ObjectKey) -> Self {
        Self::new(ResourceEventType::StatusUpdated, key)
    }

    pub fn deleted(key: ObjectKey) -> Self {
        Self::new(ResourceEventType::Deleted, key)
    }

    pub fn with_owners(mut self, owners: Vec<OwnerReference>) -> Self {
        self.owner_references = owners;
        self
    }

    pub fn with_owner_namespace(mut self, namespace: Option<String>) -> Self {
        self.owner_namespace = namespace;
        self
    }

    /// Key of the controlling owner.
    pub fn controller_key(&self) -> Option<ObjectKey> {
        let namespace = self.owner_namespace.as_deref().unwrap_or(&self.key.namespace);
        self.owner_references
            .iter()
            .find(|r| r.controller)
            .map(|r| ObjectKey::new(r.kind, namespace, &r.name))
    }
}
