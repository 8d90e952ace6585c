//! Converges the set of children a parent controls onto a desired set.
//!
//! Each desired child is read, then created or patched only when its spec,
//! controller reference or owner label differ. Children still controlled by
//! the parent but absent from the desired set are deleted. Running the same
//! input twice leaves every resource version untouched.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use cloudctl_core::{HasSpec, OWNER_NAMESPACE_LABEL, ObjectKey, ObjectMeta, OwnerReference, Resource};
use cloudctl_store::{Api, StoreError, StoredObject};

use crate::error::ReconcileError;

/// The parent side of an ownership link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub key: ObjectKey,
    pub owner: OwnerReference,
}

impl ParentRef {
    /// Fails if the parent has not been persisted yet (no uid).
    pub fn of<P: Resource>(parent: &P) -> Result<Self, ReconcileError> {
        Ok(Self {
            key: parent.key(),
            owner: parent.meta().controller_reference(P::KIND)?,
        })
    }

    pub fn uid(&self) -> &str {
        &self.owner.uid
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredChild<S> {
    pub name: String,
    pub spec: S,
}

impl<S> DesiredChild<S> {
    pub fn new(name: impl Into<String>, spec: S) -> Self {
        Self {
            name: name.into(),
            spec,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChildOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Names touched by one fan-out, each list sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanoutResult {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    pub deleted: Vec<String>,
}

impl FanoutResult {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Every child that exists after the fan-out.
    pub fn present(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .created
            .iter()
            .chain(&self.updated)
            .chain(&self.unchanged)
            .cloned()
            .collect();
        names.sort();
        names
    }
}

/// Upserts `desired` into `namespace` and prunes the parent's other children
/// there. `previous` lists names recorded by an earlier pass so children
/// left behind by a failed pass are found without a full scan.
pub async fn reconcile_fanout<C>(
    api: &Api<C>,
    parent: &ParentRef,
    namespace: &str,
    desired: Vec<DesiredChild<C::Spec>>,
    previous: &[String],
) -> Result<FanoutResult, ReconcileError>
where
    C: HasSpec,
{
    let mut result = FanoutResult::default();
    let mut wanted = BTreeSet::new();

    for child in &desired {
        if !wanted.insert(child.name.clone()) {
            return Err(ReconcileError::invalid_spec(format!(
                "duplicate child name {} derived for {}",
                child.name, parent.key
            )));
        }
        match ensure_child(api, parent, namespace, child).await? {
            ChildOutcome::Created => result.created.push(child.name.clone()),
            ChildOutcome::Updated => result.updated.push(child.name.clone()),
            ChildOutcome::Unchanged => result.unchanged.push(child.name.clone()),
        }
    }

    // Raw reads: a child that no longer decodes must not block the pass.
    let mut stale: BTreeSet<String> = previous.iter().cloned().collect();
    stale.extend(
        api.store()
            .list(C::KIND, Some(namespace))
            .await?
            .into_iter()
            .filter(|c| controller_uid(c).as_deref() == Some(parent.uid()))
            .map(|c| c.key.name),
    );

    for name in stale.difference(&wanted) {
        // Only delete what this parent still controls.
        let key = api.key(namespace, name);
        let Some(existing) = api.store().get(&key).await? else {
            continue;
        };
        if controller_uid(&existing).as_deref() != Some(parent.uid()) {
            continue;
        }
        if api.delete(namespace, name).await? {
            info!(parent = %parent.key, child = %key, "pruned child");
            result.deleted.push(name.clone());
        }
    }

    result.created.sort();
    result.updated.sort();
    result.unchanged.sort();
    Ok(result)
}

async fn ensure_child<C>(
    api: &Api<C>,
    parent: &ParentRef,
    namespace: &str,
    desired: &DesiredChild<C::Spec>,
) -> Result<ChildOutcome, ReconcileError>
where
    C: HasSpec,
{
    let key = api.key(namespace, &desired.name);
    let stored = match api.store().get(&key).await? {
        Some(stored) => stored,
        None => {
            let mut meta = ObjectMeta::new(namespace, &desired.name);
            meta.set_controller_reference(parent.owner.clone());
            set_owner_namespace(&mut meta, parent);

            match api.create(&C::from_parts(meta, desired.spec.clone())).await {
                Ok(created) => {
                    info!(parent = %parent.key, child = %created.key(), "created child");
                    return Ok(ChildOutcome::Created);
                }
                Err(err) if err.is_already_exists() => api
                    .store()
                    .get(&key)
                    .await?
                    .ok_or_else(|| StoreError::not_found(&key))?,
                Err(err) => return Err(err.into()),
            }
        }
    };

    match stored.owner_references().into_iter().find(|r| r.controller) {
        Some(owner) if owner.uid != parent.uid() => {
            return Err(ReconcileError::ownership_conflict(
                key,
                format!("{}/{}", owner.kind, owner.name),
            ));
        }
        _ => {}
    }

    let mut patched = match api.decode(stored.clone()) {
        Ok(existing) => existing,
        Err(err) => return rewrite_child(api, parent, desired, stored, &err).await,
    };
    let mut changed = patched
        .meta_mut()
        .set_controller_reference(parent.owner.clone());
    changed |= set_owner_namespace(patched.meta_mut(), parent);
    if patched.spec() != &desired.spec {
        *patched.spec_mut() = desired.spec.clone();
        changed = true;
    }

    if !changed {
        debug!(child = %patched.key(), "child up to date");
        return Ok(ChildOutcome::Unchanged);
    }

    let replaced = api.replace(&patched).await?;
    info!(parent = %parent.key, child = %replaced.key(), "updated child");
    Ok(ChildOutcome::Updated)
}

/// Overwrites a child that no longer decodes with its desired form, keeping
/// whatever metadata still parses.
async fn rewrite_child<C>(
    api: &Api<C>,
    parent: &ParentRef,
    desired: &DesiredChild<C::Spec>,
    stored: StoredObject,
    err: &StoreError,
) -> Result<ChildOutcome, ReconcileError>
where
    C: HasSpec,
{
    warn!(parent = %parent.key, child = %stored.key, error = %err, "rewriting undecodable child");
    let mut meta = stored
        .object
        .get("metadata")
        .cloned()
        .and_then(|meta| serde_json::from_value::<ObjectMeta>(meta).ok())
        .unwrap_or_else(|| ObjectMeta::new(&stored.key.namespace, &desired.name));
    meta.resource_version = Some(stored.resource_version);
    meta.set_controller_reference(parent.owner.clone());
    set_owner_namespace(&mut meta, parent);

    api.replace(&C::from_parts(meta, desired.spec.clone())).await?;
    Ok(ChildOutcome::Updated)
}

fn controller_uid(stored: &StoredObject) -> Option<String> {
    stored
        .owner_references()
        .into_iter()
        .find(|r| r.controller)
        .map(|r| r.uid)
}

/// Children outside the parent's namespace carry the parent's namespace as a
/// label so events on them can be routed back. Returns `true` on change.
fn set_owner_namespace(meta: &mut ObjectMeta, parent: &ParentRef) -> bool {
    if meta.namespace == parent.key.namespace {
        return meta.labels.remove(OWNER_NAMESPACE_LABEL).is_some();
    }
    let previous = meta
        .labels
        .insert(OWNER_NAMESPACE_LABEL.to_string(), parent.key.namespace.clone());
    previous.as_deref() != Some(parent.key.namespace.as_str())
}
