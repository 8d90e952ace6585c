use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::{Map, Value};
use tracing::debug;

use cloudctl_core::{ObjectKey, ResourceKind, SharedClock, SystemClock};
use cloudctl_store::{DeleteOutcome, ObjectStore, StoreError, StoredObject, object_key};

/// In-memory object store backend using a sharded concurrent map.
///
/// Provides:
/// - monotonically increasing resource versions shared across all objects
/// - generation tracking, bumped when `spec` changes
/// - finalizer-aware deletion with deletion timestamps
/// - cascading deletion of objects whose controller owner is removed
#[derive(Debug)]
pub struct InMemoryStore {
    data: DashMap<ObjectKey, Value>,
    version_counter: AtomicU64,
    clock: SharedClock,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Uses `clock` for creation and deletion timestamps.
    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            data: DashMap::new(),
            version_counter: AtomicU64::new(1),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn next_version(&self) -> String {
        self.version_counter
            .fetch_add(1, Ordering::SeqCst)
            .to_string()
    }

    fn now(&self) -> Value {
        Value::String(self.clock.now().to_string())
    }

    /// Removes `key` and everything transitively controlled by it. Dependents
    /// that carry finalizers are marked for deletion instead.
    fn remove_cascading(&self, key: &ObjectKey) -> Option<(StoredObject, Vec<StoredObject>)> {
        let (_, removed) = self.data.remove(key)?;
        let removed = to_stored(key.clone(), removed);

        let mut dependents = Vec::new();
        let mut owners: Vec<String> = uid_of(&removed.object).into_iter().collect();
        while let Some(owner_uid) = owners.pop() {
            let children: Vec<ObjectKey> = self
                .data
                .iter()
                .filter(|entry| controller_uid(entry.value()).as_deref() == Some(&owner_uid))
                .map(|entry| entry.key().clone())
                .collect();

            for child in children {
                if self.mark_deleting(&child).is_some() {
                    continue;
                }
                if let Some((_, value)) = self.data.remove(&child) {
                    debug!(key = %child, owner_uid = %owner_uid, "cascade delete");
                    owners.extend(uid_of(&value));
                    dependents.push(to_stored(child, value));
                }
            }
        }
        Some((removed, dependents))
    }

    /// Sets the deletion timestamp if the object has finalizers. Returns the
    /// updated object, or `None` if it can be removed right away.
    fn mark_deleting(&self, key: &ObjectKey) -> Option<StoredObject> {
        let mut entry = self.data.get_mut(key)?;
        let value = entry.value_mut();
        if finalizers(value).is_empty() {
            return None;
        }
        if deletion_timestamp(value).is_none() {
            let rv = self.next_version();
            let meta = metadata_mut(value).ok()?;
            meta.insert("deletionTimestamp".to_string(), self.now());
            meta.insert("resourceVersion".to_string(), Value::String(rv));
        }
        Some(to_stored(key.clone(), value.clone()))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredObject>, StoreError> {
        Ok(self
            .data
            .get(key)
            .map(|entry| to_stored(key.clone(), entry.value().clone())))
    }

    async fn list(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
    ) -> Result<Vec<StoredObject>, StoreError> {
        let mut objects: Vec<StoredObject> = self
            .data
            .iter()
            .filter(|entry| {
                let key = entry.key();
                key.kind == kind && namespace.is_none_or(|ns| key.namespace == ns)
            })
            .map(|entry| to_stored(entry.key().clone(), entry.value().clone()))
            .collect();
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn create(&self, object: &Value) -> Result<StoredObject, StoreError> {
        let key = object_key(object)?;
        let mut value = object.clone();
        let root = as_map_mut(&mut value)?;
        root.remove("status");

        let meta = metadata_mut(&mut value)?;
        meta.insert(
            "uid".to_string(),
            Value::String(uuid::Uuid::new_v4().to_string()),
        );
        meta.insert("generation".to_string(), Value::from(1));
        meta.insert("creationTimestamp".to_string(), self.now());
        meta.remove("deletionTimestamp");

        match self.data.entry(key.clone()) {
            Entry::Occupied(_) => Err(StoreError::already_exists(&key)),
            Entry::Vacant(slot) => {
                metadata_mut(&mut value)?.insert(
                    "resourceVersion".to_string(),
                    Value::String(self.next_version()),
                );
                slot.insert(value.clone());
                Ok(to_stored(key, value))
            }
        }
    }

    async fn update(
        &self,
        object: &Value,
        if_match: Option<&str>,
    ) -> Result<StoredObject, StoreError> {
        let key = object_key(object)?;
        let mut value = object.clone();
        as_map_mut(&mut value)?;

        let stored = {
            let mut entry = self
                .data
                .get_mut(&key)
                .ok_or_else(|| StoreError::not_found(&key))?;
            let current = entry.value_mut();

            let current_version = resource_version(current);
            match if_match {
                Some(expected) if expected != current_version => {
                    return Err(StoreError::version_conflict(&key, expected, current_version));
                }
                _ => {}
            }

            let generation = current
                .pointer("/metadata/generation")
                .and_then(Value::as_i64)
                .unwrap_or(1);
            let generation = if current.get("spec") != value.get("spec") {
                generation + 1
            } else {
                generation
            };

            let preserved: Vec<(&str, Option<Value>)> = ["uid", "creationTimestamp", "deletionTimestamp"]
                .into_iter()
                .map(|field| (field, current.pointer(&format!("/metadata/{field}")).cloned()))
                .collect();
            let status = current.get("status").cloned();

            let root = as_map_mut(&mut value)?;
            root.remove("status");
            if let Some(status) = status {
                root.insert("status".to_string(), status);
            }
            let meta = metadata_mut(&mut value)?;
            for (field, preserved) in preserved {
                match preserved {
                    Some(v) => meta.insert(field.to_string(), v),
                    None => meta.remove(field),
                };
            }
            meta.insert("generation".to_string(), Value::from(generation));
            meta.insert(
                "resourceVersion".to_string(),
                Value::String(self.next_version()),
            );

            *current = value.clone();
            to_stored(key.clone(), value)
        };

        if stored.is_deleting() && stored.finalizers().is_empty() {
            debug!(key = %key, "last finalizer released");
            self.remove_cascading(&key);
        }
        Ok(stored)
    }

    async fn update_status(
        &self,
        key: &ObjectKey,
        status: &Value,
    ) -> Result<StoredObject, StoreError> {
        let mut entry = self
            .data
            .get_mut(key)
            .ok_or_else(|| StoreError::not_found(key))?;
        let current = entry.value_mut();
        let rv = self.next_version();
        let root = as_map_mut(current)?;
        if status.is_null() {
            root.remove("status");
        } else {
            root.insert("status".to_string(), status.clone());
        }
        metadata_mut(current)?.insert("resourceVersion".to_string(), Value::String(rv));
        Ok(to_stored(key.clone(), current.clone()))
    }

    async fn delete(&self, key: &ObjectKey) -> Result<DeleteOutcome, StoreError> {
        if !self.data.contains_key(key) {
            return Err(StoreError::not_found(key));
        }
        if let Some(marked) = self.mark_deleting(key) {
            return Ok(DeleteOutcome::Finalizing(marked));
        }
        match self.remove_cascading(key) {
            Some((object, dependents)) => Ok(DeleteOutcome::Removed { object, dependents }),
            None => Err(StoreError::not_found(key)),
        }
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

fn to_stored(key: ObjectKey, value: Value) -> StoredObject {
    let rv = resource_version(&value);
    StoredObject::new(key, rv, value)
}

fn resource_version(value: &Value) -> String {
    value
        .pointer("/metadata/resourceVersion")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn uid_of(value: &Value) -> Option<String> {
    value
        .pointer("/metadata/uid")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn controller_uid(value: &Value) -> Option<String> {
    value
        .pointer("/metadata/ownerReferences")?
        .as_array()?
        .iter()
        .find(|r| r.get("controller").and_then(Value::as_bool) == Some(true))?
        .get("uid")?
        .as_str()
        .map(str::to_string)
}

fn finalizers(value: &Value) -> Vec<&str> {
    value
        .pointer("/metadata/finalizers")
        .and_then(Value::as_array)
        .map(|f| f.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn deletion_timestamp(value: &Value) -> Option<&Value> {
    value
        .pointer("/metadata/deletionTimestamp")
        .filter(|v| !v.is_null())
}

fn as_map_mut(value: &mut Value) -> Result<&mut Map<String, Value>, StoreError> {
    value
        .as_object_mut()
        .ok_or_else(|| StoreError::invalid_object("object must be a JSON map"))
}

fn metadata_mut(value: &mut Value) -> Result<&mut Map<String, Value>, StoreError> {
    value
        .get_mut("metadata")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| StoreError::invalid_object("missing metadata"))
}
