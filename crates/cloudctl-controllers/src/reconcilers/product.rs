//! Product controller: non-prod and prod cloud projects, plus one viewer
//! grant on the non-prod project per principal of the owning organization.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use cloudctl_core::events::{ResourceEvent, ResourceEventType};
use cloudctl_core::resources::{
    IamUserPermission, IamUserPermissionSpec, Organization, Product, ProductSpec, Project,
    ProjectParameters, ProjectSpec, ProviderConfigReference,
};
use cloudctl_core::{HasStatus, ObjectKey, Resource, ResourceKind};
use cloudctl_directory::{Principal, resolve_all};

use super::commit_status;
use crate::context::Context;
use crate::error::ReconcileError;
use crate::fanout::{DesiredChild, ParentRef, reconcile_fanout};
use crate::naming::{self, roles};
use crate::runtime::{Action, Reconciler};

#[derive(Debug, Default, Clone, Copy)]
pub struct ProductReconciler;

#[async_trait]
impl Reconciler for ProductReconciler {
    type Object = Product;

    fn name(&self) -> &'static str {
        "product"
    }

    #[instrument(skip_all, fields(product = %product.key()))]
    async fn reconcile(
        &self,
        product: Arc<Product>,
        ctx: &Context,
    ) -> Result<Action, ReconcileError> {
        if product.meta().is_deleting() {
            return Ok(Action::await_change());
        }
        validate(&product.spec)?;

        // Everything that can fail before a child is touched.
        let org_key = product.spec.organization_key(product.namespace());
        ctx.references().validate_key(&org_key).await?;
        let org = ctx
            .api::<Organization>()
            .get(&org_key.namespace, &org_key.name)
            .await?
            .ok_or_else(|| ReconcileError::missing_reference(&org_key))?;
        let groups = [org.spec.members.as_str(), org.spec.approvers.as_str()];
        let principals: BTreeSet<Principal> = resolve_all(ctx.resolver.as_ref(), groups)
            .await?
            .into_iter()
            .filter(|principal| !principal.as_str().is_empty())
            .collect();
        debug!(principals = principals.len(), "resolved product principals");

        let parent = ParentRef::of(product.as_ref())?;
        let key = product.key();
        let previous = product.status().cloned().unwrap_or_default();

        let nonprod = naming::project_id(&key, roles::NONPROD);
        let prod = naming::project_id(&key, roles::PROD);
        let projects = reconcile_fanout(
            &ctx.api::<Project>(),
            &parent,
            product.namespace(),
            vec![
                project(&nonprod, &ctx.config.provider_config),
                project(&prod, &ctx.config.provider_config),
            ],
            &previous.projects,
        )
        .await?;

        let grants = principals
            .iter()
            .map(|principal| {
                DesiredChild::new(
                    naming::child_name(&key, &roles::permission(principal.as_str())),
                    IamUserPermissionSpec {
                        user_email: principal.to_string(),
                        product_name: product.spec.name.clone(),
                        permissions: ctx.config.default_permissions.clone(),
                        asset_names: vec![nonprod.clone()],
                        temporary_permissions: Vec::new(),
                    },
                )
            })
            .collect();
        let permissions = reconcile_fanout(
            &ctx.api::<IamUserPermission>(),
            &parent,
            product.namespace(),
            grants,
            &previous.permissions,
        )
        .await?;

        let mut updated = Product::clone(&product);
        let status = updated.status_mut();
        status.projects = projects.present();
        status.principals = principals.into_iter().map(Principal::into_inner).collect();
        status.permissions = permissions.present();
        commit_status(&ctx.api(), updated, product.status().cloned(), ctx.now()).await?;

        Ok(Action::requeue(ctx.config.directory_resync_interval))
    }

    /// Products that name the organization in the event.
    async fn related(
        &self,
        event: &ResourceEvent,
        ctx: &Context,
    ) -> Result<Vec<ObjectKey>, ReconcileError> {
        if event.key.kind != ResourceKind::Organization
            || event.event_type == ResourceEventType::StatusUpdated
        {
            return Ok(Vec::new());
        }
        Ok(ctx
            .api::<Product>()
            .list(Some(&event.key.namespace))
            .await?
            .into_iter()
            .filter(|product| product.spec.organization.name == event.key.name)
            .map(|product| product.key())
            .collect())
    }
}

fn validate(spec: &ProductSpec) -> Result<(), ReconcileError> {
    if spec.name.trim().is_empty() {
        return Err(ReconcileError::invalid_spec("name is required"));
    }
    if spec.organization.name.trim().is_empty() {
        return Err(ReconcileError::invalid_spec("organization.name is required"));
    }
    Ok(())
}

fn project(id: &str, provider_config: &str) -> DesiredChild<ProjectSpec> {
    DesiredChild::new(
        id,
        ProjectSpec {
            for_provider: ProjectParameters {
                name: id.to_string(),
            },
            provider_config_ref: ProviderConfigReference {
                name: provider_config.to_string(),
            },
        },
    )
}
