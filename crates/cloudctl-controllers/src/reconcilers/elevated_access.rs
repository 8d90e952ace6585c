//! ElevatedAccessRequest controller: a single time-bounded permission grant.
//!
//! The grant is an `IamUserPermission` named from `(product, principal)` and
//! owned by the request. It exists while the request is `Active` and is
//! deleted on expiry. Nothing reactivates an expired request.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use cloudctl_core::resources::{
    ElevatedAccessRequest, ElevatedAccessRequestSpec, GrantState, IamUserPermission,
    IamUserPermissionSpec, TemporaryPermission,
};
use cloudctl_core::{HasStatus, ObjectKey, Resource, ResourceKind};
use cloudctl_directory::Principal;
use cloudctl_store::StoreError;

use super::record_status;
use crate::context::Context;
use crate::error::ReconcileError;
use crate::fanout::{DesiredChild, ParentRef, reconcile_fanout};
use crate::lifecycle::{GrantWindow, next_state, parse_ttl};
use crate::naming::{self, roles};
use crate::runtime::{Action, Reconciler};

#[derive(Debug, Default, Clone, Copy)]
pub struct ElevatedAccessReconciler;

#[async_trait]
impl Reconciler for ElevatedAccessReconciler {
    type Object = ElevatedAccessRequest;

    fn name(&self) -> &'static str {
        "elevated-access"
    }

    #[instrument(skip_all, fields(request = %request.key()))]
    async fn reconcile(
        &self,
        request: Arc<ElevatedAccessRequest>,
        ctx: &Context,
    ) -> Result<Action, ReconcileError> {
        if request.meta().is_deleting() {
            return Ok(Action::await_change());
        }

        let parent = ParentRef::of(request.as_ref())?;
        let before = request.status().cloned();
        let recorded = before.as_ref().and_then(|status| status.state);
        let previous_grant: Vec<String> = before
            .as_ref()
            .and_then(|status| status.grant_name.clone())
            .into_iter()
            .collect();

        if recorded == Some(GrantState::Expired) {
            revoke(ctx, &parent, request.namespace(), &previous_grant).await?;
            let mut updated = ElevatedAccessRequest::clone(&request);
            updated.status_mut().grant_name = None;
            record_status(&ctx.api(), updated, ctx.now()).await?;
            return Ok(Action::await_change());
        }

        let spec = &request.spec;
        let checked =
            validate(spec).and_then(|principal| Ok((principal, parse_ttl(&spec.ttl)?)));
        let (principal, ttl) = match checked {
            Ok(checked) => checked,
            Err(err) => {
                if !previous_grant.is_empty() {
                    fail_closed(ctx, &request, &parent, &previous_grant).await?;
                }
                return Err(err);
            }
        };
        let granted_at = request.meta().creation_timestamp.ok_or_else(|| {
            StoreError::internal(format!("{} has no creationTimestamp", request.key()))
        })?;
        let window = GrantWindow::new(granted_at, ttl);

        let now = ctx.now();
        let state = next_state(recorded, window.state_at(now));
        let mut updated = ElevatedAccessRequest::clone(&request);

        let action = match state {
            GrantState::Active => {
                let name = grant_name(request.namespace(), &spec.product_name, &principal);
                reconcile_fanout(
                    &ctx.api::<IamUserPermission>(),
                    &parent,
                    request.namespace(),
                    vec![DesiredChild::new(name.clone(), grant_spec(spec, &principal))],
                    &previous_grant,
                )
                .await?;

                let status = updated.status_mut();
                status.grant_name = Some(name);
                status.expires_at = Some(window.expires_at);
                Action::requeue(window.recheck_delay(now, ctx.config.grant_recheck_interval))
            }
            GrantState::Expired => {
                revoke(ctx, &parent, request.namespace(), &previous_grant).await?;
                info!(expires_at = %window.expires_at, "elevated access expired");

                let status = updated.status_mut();
                status.grant_name = None;
                status.expires_at = Some(window.expires_at);
                Action::await_change()
            }
        };

        updated.status_mut().state = Some(state);
        record_status(&ctx.api(), updated, now).await?;
        Ok(action)
    }
}

/// Revokes a recorded grant when the spec it was issued under no longer
/// validates. A request past its recorded expiry becomes `Expired`.
async fn fail_closed(
    ctx: &Context,
    request: &ElevatedAccessRequest,
    parent: &ParentRef,
    previous_grant: &[String],
) -> Result<(), ReconcileError> {
    revoke(ctx, parent, request.namespace(), previous_grant).await?;
    info!(grant = ?previous_grant, "revoked grant of invalid request");

    let now = ctx.now();
    let mut updated = request.clone();
    let status = updated.status_mut();
    status.grant_name = None;
    status.state = match status.expires_at {
        Some(expires_at) if expires_at <= now => Some(GrantState::Expired),
        _ => None,
    };
    ctx.api().replace_status(&updated).await?;
    Ok(())
}

fn validate(spec: &ElevatedAccessRequestSpec) -> Result<Principal, ReconcileError> {
    let principal = Principal::new(&spec.user_email);
    if principal.as_str().is_empty() || !principal.as_str().contains('@') {
        return Err(ReconcileError::invalid_spec(format!(
            "userEmail '{}' is not an email address",
            spec.user_email
        )));
    }
    if spec.product_name.trim().is_empty() {
        return Err(ReconcileError::invalid_spec("productName is required"));
    }
    Ok(principal)
}

/// Name of the grant for `principal` on a product.
pub(crate) fn grant_name(namespace: &str, product: &str, principal: &Principal) -> String {
    let product = ObjectKey::new(ResourceKind::Product, namespace, product);
    naming::child_name(&product, &roles::elevated(principal.as_str()))
}

fn grant_spec(spec: &ElevatedAccessRequestSpec, principal: &Principal) -> IamUserPermissionSpec {
    IamUserPermissionSpec {
        user_email: principal.to_string(),
        product_name: spec.product_name.clone(),
        permissions: spec.elevated_permissions.clone(),
        asset_names: spec.asset_names.clone(),
        temporary_permissions: vec![TemporaryPermission {
            permission: spec.elevated_permissions.clone(),
            ttl: spec.ttl.clone(),
        }],
    }
}

async fn revoke(
    ctx: &Context,
    parent: &ParentRef,
    namespace: &str,
    previous: &[String],
) -> Result<(), ReconcileError> {
    reconcile_fanout(
        &ctx.api::<IamUserPermission>(),
        parent,
        namespace,
        Vec::new(),
        previous,
    )
    .await?;
    Ok(())
}
