//! The four controllers.

mod asset;
mod elevated_access;
mod organization;
mod product;

pub use asset::AssetReconciler;
pub use elevated_access::ElevatedAccessReconciler;
pub use organization::{ORGANIZATION_FINALIZER, OrganizationReconciler};
pub use product::ProductReconciler;

use cloudctl_core::{Condition, HasStatus, ObservedStatus, StatusConditions, Timestamp};
use cloudctl_store::Api;

use crate::error::ReconcileError;

/// Marks `object` ready for its current generation and writes the status if
/// anything differs from `before`. Returns `true` if a write happened.
pub(crate) async fn commit_status<K: HasStatus>(
    api: &Api<K>,
    mut object: K,
    before: Option<K::Status>,
    now: Timestamp,
) -> Result<bool, ReconcileError> {
    let generation = object.meta().generation();
    let status = object.status_mut();
    status.set_condition(Condition::ready(now, generation));

    if before.as_ref() == Some(&*status) {
        return Ok(false);
    }
    status.observe(generation, now);
    api.replace_status(&object).await?;
    Ok(true)
}

/// Marks `object` ready and always writes the status with a fresh
/// observation time.
pub(crate) async fn record_status<K: HasStatus>(
    api: &Api<K>,
    mut object: K,
    now: Timestamp,
) -> Result<(), ReconcileError> {
    let generation = object.meta().generation();
    let status = object.status_mut();
    status.set_condition(Condition::ready(now, generation));
    status.observe(generation, now);
    api.replace_status(&object).await?;
    Ok(())
}
