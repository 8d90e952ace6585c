//! Organization controller: validates the org graph, resolves approver and
//! member groups into status, and holds a finalizer while Products still
//! reference the organization.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::try_join;
use tracing::{info, instrument};

use cloudctl_core::events::{ResourceEvent, ResourceEventType};
use cloudctl_core::resources::{Organization, OrganizationSpec, Product};
use cloudctl_core::{HasStatus, ObjectKey, Resource, ResourceKind};
use cloudctl_directory::Principal;

use super::commit_status;
use crate::context::Context;
use crate::error::ReconcileError;
use crate::runtime::{Action, Reconciler};

pub const ORGANIZATION_FINALIZER: &str = "finalizer.organization.cloud.company.com";

#[derive(Debug, Default, Clone, Copy)]
pub struct OrganizationReconciler;

#[async_trait]
impl Reconciler for OrganizationReconciler {
    type Object = Organization;

    fn name(&self) -> &'static str {
        "organization"
    }

    #[instrument(skip_all, fields(organization = %org.key()))]
    async fn reconcile(
        &self,
        org: Arc<Organization>,
        ctx: &Context,
    ) -> Result<Action, ReconcileError> {
        if org.meta().is_deleting() {
            return finalize(&org, ctx).await;
        }

        let references = referenced_organizations(&org)?;
        ctx.references().validate_all(&references).await?;

        let (approvers, members) = try_join(
            ctx.resolver.resolve(&org.spec.approvers),
            ctx.resolver.resolve(&org.spec.members),
        )
        .await?;

        let api = ctx.api::<Organization>();
        let mut updated = Organization::clone(&org);
        if updated.meta_mut().add_finalizer(ORGANIZATION_FINALIZER) {
            updated = api.replace(&updated).await?;
        }

        let status = updated.status_mut();
        status.approvers = to_strings(approvers);
        status.members = to_strings(members);
        commit_status(&api, updated, org.status().cloned(), ctx.now()).await?;

        Ok(Action::requeue(ctx.config.directory_resync_interval))
    }

    async fn related(
        &self,
        event: &ResourceEvent,
        ctx: &Context,
    ) -> Result<Vec<ObjectKey>, ReconcileError> {
        if event.event_type == ResourceEventType::StatusUpdated {
            return Ok(Vec::new());
        }
        let api = ctx.api::<Organization>();

        match event.key.kind {
            // A deleting organization may be waiting on this product.
            ResourceKind::Product => Ok(api
                .list(Some(&event.key.namespace))
                .await?
                .into_iter()
                .filter(|org| org.meta().is_deleting())
                .map(|org| org.key())
                .collect()),
            // Organizations gated on this one.
            ResourceKind::Organization
                if matches!(
                    event.event_type,
                    ResourceEventType::Created | ResourceEventType::Deleted
                ) =>
            {
                Ok(api
                    .list(None)
                    .await?
                    .into_iter()
                    .filter(|org| org.key() != event.key)
                    .filter(|org| {
                        references_of(&org.spec, org.namespace()).any(|key| key == event.key)
                    })
                    .map(|org| org.key())
                    .collect())
            }
            _ => Ok(Vec::new()),
        }
    }
}

async fn finalize(org: &Organization, ctx: &Context) -> Result<Action, ReconcileError> {
    if !org.meta().has_finalizer(ORGANIZATION_FINALIZER) {
        return Ok(Action::await_change());
    }

    let products = ctx.api::<Product>().list(Some(org.namespace())).await?;
    if let Some(product) = products
        .iter()
        .find(|p| p.spec.organization.name == org.name())
    {
        return Err(ReconcileError::in_use(org.key(), product.key()));
    }

    let mut released = org.clone();
    released.meta_mut().remove_finalizer(ORGANIZATION_FINALIZER);
    ctx.api::<Organization>().replace(&released).await?;
    info!("released organization finalizer");
    Ok(Action::await_change())
}

fn references_of<'a>(
    spec: &'a OrganizationSpec,
    namespace: &'a str,
) -> impl Iterator<Item = ObjectKey> + 'a {
    spec.owned_by
        .iter()
        .chain(&spec.member_of)
        .map(move |reference| reference.key(namespace))
}

fn referenced_organizations(org: &Organization) -> Result<Vec<ObjectKey>, ReconcileError> {
    let own = org.key();
    let mut keys = Vec::new();
    for key in references_of(&org.spec, org.namespace()) {
        if key.name.trim().is_empty() {
            return Err(ReconcileError::invalid_spec(
                "organization references need a name",
            ));
        }
        if key == own {
            return Err(ReconcileError::invalid_spec(format!(
                "{own} cannot reference itself"
            )));
        }
        keys.push(key);
    }
    Ok(keys)
}

fn to_strings(principals: BTreeSet<Principal>) -> Vec<String> {
    principals.into_iter().map(Principal::into_inner).collect()
}
