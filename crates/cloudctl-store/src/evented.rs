//! EventedStore - a store wrapper that emits events after writes.
//!
//! Events are emitted only after the inner operation succeeds, so every event
//! corresponds to a change the store actually holds.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use cloudctl_core::events::{EventBroadcaster, ResourceEvent, ResourceEventType};
use cloudctl_core::{OWNER_NAMESPACE_LABEL, ObjectKey, ResourceKind};

use crate::error::StoreError;
use crate::traits::ObjectStore;
use crate::types::{DeleteOutcome, StoredObject};

pub struct EventedStore<S: ObjectStore> {
    inner: S,
    broadcaster: Arc<EventBroadcaster>,
}

impl<S: ObjectStore> EventedStore<S> {
    pub fn new(inner: S, broadcaster: Arc<EventBroadcaster>) -> Self {
        Self { inner, broadcaster }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn broadcaster(&self) -> &Arc<EventBroadcaster> {
        &self.broadcaster
    }

    fn emit(&self, event_type: ResourceEventType, stored: &StoredObject) {
        if !self.broadcaster.has_subscribers() {
            return;
        }
        let event = ResourceEvent::new(event_type, stored.key.clone())
            .with_owners(stored.owner_references())
            .with_owner_namespace(stored.label(OWNER_NAMESPACE_LABEL).map(str::to_string));
        let count = self.broadcaster.send(event);
        debug!(
            event_type = %event_type,
            key = %stored.key,
            subscribers = count,
            "emitted resource event"
        );
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for EventedStore<S> {
    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredObject>, StoreError> {
        self.inner.get(key).await
    }

    async fn list(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
    ) -> Result<Vec<StoredObject>, StoreError> {
        self.inner.list(kind, namespace).await
    }

    async fn create(&self, object: &Value) -> Result<StoredObject, StoreError> {
        let stored = self.inner.create(object).await?;
        self.emit(ResourceEventType::Created, &stored);
        Ok(stored)
    }

    async fn update(
        &self,
        object: &Value,
        if_match: Option<&str>,
    ) -> Result<StoredObject, StoreError> {
        let stored = self.inner.update(object, if_match).await?;
        // Releasing the last finalizer of a deleting object removes it.
        if stored.is_deleting() && stored.finalizers().is_empty() {
            self.emit(ResourceEventType::Deleted, &stored);
        } else {
            self.emit(ResourceEventType::Updated, &stored);
        }
        Ok(stored)
    }

    async fn update_status(
        &self,
        key: &ObjectKey,
        status: &Value,
    ) -> Result<StoredObject, StoreError> {
        let stored = self.inner.update_status(key, status).await?;
        self.emit(ResourceEventType::StatusUpdated, &stored);
        Ok(stored)
    }

    async fn delete(&self, key: &ObjectKey) -> Result<DeleteOutcome, StoreError> {
        let outcome = self.inner.delete(key).await?;
        match &outcome {
            DeleteOutcome::Removed { object, dependents } => {
                self.emit(ResourceEventType::Deleted, object);
                for dependent in dependents {
                    self.emit(ResourceEventType::Deleted, dependent);
                }
            }
            DeleteOutcome::Finalizing(object) => {
                self.emit(ResourceEventType::Updated, object);
            }
        }
        Ok(outcome)
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}
