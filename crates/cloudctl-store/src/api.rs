//! Typed access to one kind of object.

use std::marker::PhantomData;

use serde_json::Value;
use tracing::debug;

use cloudctl_core::{HasStatus, ObjectKey, Resource};

use crate::error::StoreError;
use crate::types::StoredObject;
use crate::DynStore;

/// Typed handle over a [`DynStore`] for objects of kind `K`.
///
/// Encodes with `apiVersion` and `kind` filled in and decodes with
/// `metadata.resourceVersion` set from the store.
pub struct Api<K> {
    store: DynStore,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Clone for Api<K> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: Resource> Api<K> {
    pub fn new(store: DynStore) -> Self {
        Self {
            store,
            _kind: PhantomData,
        }
    }

    pub fn store(&self) -> &DynStore {
        &self.store
    }

    pub fn key(&self, namespace: &str, name: &str) -> ObjectKey {
        ObjectKey::new(K::KIND, namespace, name)
    }

    pub async fn get(&self, namespace: &str, name: &str) -> Result<Option<K>, StoreError> {
        let key = self.key(namespace, name);
        self.store.get(&key).await?.map(decode).transpose()
    }

    pub async fn list(&self, namespace: Option<&str>) -> Result<Vec<K>, StoreError> {
        self.store
            .list(K::KIND, namespace)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub async fn create(&self, object: &K) -> Result<K, StoreError> {
        let stored = self.store.create(&encode(object)?).await?;
        debug!(key = %stored.key, resource_version = %stored.resource_version, "created");
        decode(stored)
    }

    /// Replaces metadata and spec, guarded by the object's resource version
    /// when it carries one.
    pub async fn replace(&self, object: &K) -> Result<K, StoreError> {
        let if_match = object.meta().resource_version.clone();
        let stored = self
            .store
            .update(&encode(object)?, if_match.as_deref())
            .await?;
        debug!(key = %stored.key, resource_version = %stored.resource_version, "replaced");
        decode(stored)
    }

    /// Returns `false` if the object was already gone.
    pub async fn delete(&self, namespace: &str, name: &str) -> Result<bool, StoreError> {
        let key = self.key(namespace, name);
        match self.store.delete(&key).await {
            Ok(outcome) => {
                debug!(key = %key, removed = outcome.is_removed(), "deleted");
                Ok(true)
            }
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Decodes a raw object read through [`store`](Self::store).
    pub fn decode(&self, stored: StoredObject) -> Result<K, StoreError> {
        decode(stored)
    }
}

impl<K: HasStatus> Api<K> {
    /// Writes the object's status sub-record. Metadata and spec in `object`
    /// are ignored.
    pub async fn replace_status(&self, object: &K) -> Result<K, StoreError> {
        let status = match object.status() {
            Some(status) => serde_json::to_value(status)?,
            None => Value::Null,
        };
        let stored = self.store.update_status(&object.key(), &status).await?;
        decode(stored)
    }
}

fn encode<K: Resource>(object: &K) -> Result<Value, StoreError> {
    let mut value = serde_json::to_value(object)?;
    let map = value
        .as_object_mut()
        .ok_or_else(|| StoreError::invalid_object("object must serialize to a JSON map"))?;
    map.insert(
        "apiVersion".to_string(),
        Value::String(K::KIND.api_version().to_string()),
    );
    map.insert("kind".to_string(), Value::String(K::KIND.to_string()));
    Ok(value)
}

fn decode<K: Resource>(stored: StoredObject) -> Result<K, StoreError> {
    if stored.key.kind != K::KIND {
        return Err(StoreError::invalid_object(format!(
            "expected {}, got {}",
            K::KIND,
            stored.key
        )));
    }
    let mut object: K = serde_json::from_value(stored.object)?;
    object.meta_mut().resource_version = Some(stored.resource_version);
    Ok(object)
}
