//! Existence checks for objects a parent refers to.

use cloudctl_core::ObjectKey;
use cloudctl_store::DynStore;

use crate::error::ReconcileError;

/// Confirms referenced objects exist before a pass mutates anything.
///
/// A single read per reference, no retry: a missing reference fails the pass
/// with a retryable error and redelivery does the rest.
#[derive(Clone)]
pub struct ReferenceValidator {
    store: DynStore,
}

impl ReferenceValidator {
    pub fn new(store: DynStore) -> Self {
        Self { store }
    }

    pub async fn validate_key(&self, key: &ObjectKey) -> Result<(), ReconcileError> {
        match self.store.get(key).await? {
            Some(_) => Ok(()),
            None => {
                tracing::debug!(reference = %key, "referenced object missing");
                Err(ReconcileError::missing_reference(key))
            }
        }
    }

    /// Validates every key, failing on the first missing one.
    pub async fn validate_all<'a, I>(&self, keys: I) -> Result<(), ReconcileError>
    where
        I: IntoIterator<Item = &'a ObjectKey>,
    {
        for key in keys {
            self.validate_key(key).await?;
        }
        Ok(())
    }
}
