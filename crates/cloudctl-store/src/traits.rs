//! The trait every object store backend implements.

use async_trait::async_trait;
use serde_json::Value;

use cloudctl_core::{ObjectKey, ResourceKind};

use crate::error::StoreError;
use crate::types::{DeleteOutcome, StoredObject};

/// Storage contract shared by every backend.
///
/// Objects are raw JSON carrying `kind` and `metadata`. Implementations own
/// `metadata.uid`, `metadata.generation`, `metadata.resourceVersion`,
/// `metadata.creationTimestamp` and `metadata.deletionTimestamp`; values
/// supplied by callers for these fields are ignored.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredObject>, StoreError>;

    /// Lists objects of one kind, optionally restricted to a namespace,
    /// ordered by key.
    async fn list(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
    ) -> Result<Vec<StoredObject>, StoreError>;

    /// Creates a new object. Any `status` in the payload is discarded.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the key is occupied.
    async fn create(&self, object: &Value) -> Result<StoredObject, StoreError>;

    /// Replaces metadata and spec. Status is preserved.
    ///
    /// When `if_match` is set the current resource version must equal it.
    /// The generation is bumped when the spec changes. An update that leaves
    /// a deleting object without finalizers removes it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the object does not exist and
    /// `StoreError::VersionConflict` if the precondition fails.
    async fn update(
        &self,
        object: &Value,
        if_match: Option<&str>,
    ) -> Result<StoredObject, StoreError>;

    /// Replaces the status sub-record only.
    async fn update_status(
        &self,
        key: &ObjectKey,
        status: &Value,
    ) -> Result<StoredObject, StoreError>;

    /// Deletes an object. Objects with finalizers are only marked; otherwise
    /// the object and every object it controls are removed.
    async fn delete(&self, key: &ObjectKey) -> Result<DeleteOutcome, StoreError>;

    fn backend_name(&self) -> &'static str;
}
