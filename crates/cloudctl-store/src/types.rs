//! Data types passed across the store boundary.

use serde_json::Value;

use cloudctl_core::{ObjectKey, OwnerReference, ResourceKind};

use crate::error::StoreError;

/// An object as held by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub key: ObjectKey,
    pub resource_version: String,
    /// Full object, including `metadata.resourceVersion`.
    pub object: Value,
}

impl StoredObject {
    pub fn new(key: ObjectKey, resource_version: impl Into<String>, object: Value) -> Self {
        Self {
            key,
            resource_version: resource_version.into(),
            object,
        }
    }

    pub fn owner_references(&self) -> Vec<OwnerReference> {
        self.object
            .pointer("/metadata/ownerReferences")
            .cloned()
            .and_then(|refs| serde_json::from_value(refs).ok())
            .unwrap_or_default()
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.object
            .pointer("/metadata/labels")
            .and_then(|labels| labels.get(name))
            .and_then(Value::as_str)
    }

    pub fn is_deleting(&self) -> bool {
        self.object
            .pointer("/metadata/deletionTimestamp")
            .is_some_and(|v| !v.is_null())
    }

    pub fn finalizers(&self) -> Vec<String> {
        self.object
            .pointer("/metadata/finalizers")
            .cloned()
            .and_then(|f| serde_json::from_value(f).ok())
            .unwrap_or_default()
    }
}

/// Result of a delete request.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    /// The object is gone, together with the dependents cascaded from it.
    Removed {
        object: StoredObject,
        dependents: Vec<StoredObject>,
    },
    /// Finalizers are pending; the object now carries a deletion timestamp.
    Finalizing(StoredObject),
}

impl DeleteOutcome {
    pub fn object(&self) -> &StoredObject {
        match self {
            DeleteOutcome::Removed { object, .. } => object,
            DeleteOutcome::Finalizing(object) => object,
        }
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, DeleteOutcome::Removed { .. })
    }
}

/// Reads `kind`, `metadata.namespace` and `metadata.name` from a raw object.
pub fn object_key(object: &Value) -> Result<ObjectKey, StoreError> {
    let kind: ResourceKind = object
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::invalid_object("missing kind"))?
        .parse()
        .map_err(|e: cloudctl_core::CoreError| StoreError::invalid_object(e.to_string()))?;
    let field = |name: &str| {
        object
            .pointer(&format!("/metadata/{name}"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| StoreError::invalid_object(format!("missing metadata.{name}")))
    };
    Ok(ObjectKey::new(kind, field("namespace")?, field("name")?))
}
