//! Asset controller: one deployment Application per asset plus one Project
//! per claim declared in the asset's repository.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;
use url::Url;

use cloudctl_core::resources::{
    Application, ApplicationDestination, ApplicationSource, ApplicationSpec, Asset, AssetClaims,
    AutomatedSync, Project, ProjectParameters, ProjectSpec, ProviderConfigReference, SyncPolicy,
};
use cloudctl_core::{HasStatus, ObjectKey, Resource};

use super::commit_status;
use crate::claims::Claim;
use crate::config::ArgoCdConfig;
use crate::context::Context;
use crate::error::ReconcileError;
use crate::fanout::{DesiredChild, ParentRef, reconcile_fanout};
use crate::naming::{self, roles};
use crate::runtime::{Action, Reconciler};

#[derive(Debug, Default, Clone, Copy)]
pub struct AssetReconciler;

#[async_trait]
impl Reconciler for AssetReconciler {
    type Object = Asset;

    fn name(&self) -> &'static str {
        "asset"
    }

    #[instrument(skip_all, fields(asset = %asset.key()))]
    async fn reconcile(&self, asset: Arc<Asset>, ctx: &Context) -> Result<Action, ReconcileError> {
        if asset.meta().is_deleting() {
            return Ok(Action::await_change());
        }
        validate_claims(&asset.spec.claims)?;

        let parent = ParentRef::of(asset.as_ref())?;
        let key = asset.key();
        let claims = ctx.claims.fetch(&asset.spec.claims).await?;
        let previous = asset.status().cloned().unwrap_or_default();

        let application = naming::child_name(&key, roles::CLAIMS_APPLICATION);
        let argocd = &ctx.config.argocd;
        reconcile_fanout(
            &ctx.api::<Application>(),
            &parent,
            &argocd.namespace,
            vec![DesiredChild::new(
                application.clone(),
                application_spec(argocd, &asset.spec.claims, asset.namespace()),
            )],
            previous.application.as_slice(),
        )
        .await?;

        let desired = claims
            .iter()
            .map(|claim| claim_project(&key, claim, &ctx.config.provider_config))
            .collect();
        let projects = reconcile_fanout(
            &ctx.api::<Project>(),
            &parent,
            asset.namespace(),
            desired,
            &previous.projects,
        )
        .await?;

        let mut updated = Asset::clone(&asset);
        let status = updated.status_mut();
        status.application = Some(application);
        status.claims = claims.into_iter().map(|c| c.name).collect();
        status.projects = projects.present();
        commit_status(&ctx.api(), updated, asset.status().cloned(), ctx.now()).await?;

        Ok(Action::await_change())
    }
}

fn validate_claims(claims: &AssetClaims) -> Result<(), ReconcileError> {
    if claims.repository_url.trim().is_empty() {
        return Err(ReconcileError::invalid_spec("claims.repositoryUrl is required"));
    }
    Url::parse(&claims.repository_url).map_err(|e| {
        ReconcileError::invalid_spec(format!(
            "claims.repositoryUrl '{}' is not a URL: {e}",
            claims.repository_url
        ))
    })?;
    if claims.git_commit.trim().is_empty() {
        return Err(ReconcileError::invalid_spec("claims.gitCommit is required"));
    }
    Ok(())
}

fn application_spec(
    argocd: &ArgoCdConfig,
    claims: &AssetClaims,
    namespace: &str,
) -> ApplicationSpec {
    ApplicationSpec {
        project: argocd.project.clone(),
        source: ApplicationSource {
            repo_url: claims.repository_url.clone(),
            target_revision: claims.git_commit.clone(),
            path: argocd.path.clone(),
        },
        destination: ApplicationDestination {
            server: argocd.destination_server.clone(),
            namespace: namespace.to_string(),
        },
        sync_policy: SyncPolicy {
            automated: Some(AutomatedSync {
                prune: true,
                self_heal: true,
            }),
            sync_options: argocd.sync_options.clone(),
        },
    }
}

fn claim_project(
    asset: &ObjectKey,
    claim: &Claim,
    provider_config: &str,
) -> DesiredChild<ProjectSpec> {
    let id = naming::project_id(asset, &roles::claim(&claim.name));
    DesiredChild::new(
        id.clone(),
        ProjectSpec {
            for_provider: ProjectParameters { name: id },
            provider_config_ref: ProviderConfigReference {
                name: provider_config.to_string(),
            },
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(repo: &str, commit: &str) -> AssetClaims {
        AssetClaims {
            repository_url: repo.to_string(),
            git_branch: "main".to_string(),
            git_commit: commit.to_string(),
        }
    }

    #[test]
    fn test_validate_claims() {
        assert!(validate_claims(&claims("https://git.example.com/checkout", "abc123")).is_ok());
        assert!(validate_claims(&claims("", "abc123")).is_err());
        assert!(validate_claims(&claims("not a url", "abc123")).is_err());
        assert!(validate_claims(&claims("https://git.example.com/checkout", " ")).is_err());
    }

    #[test]
    fn test_application_spec() {
        let spec = application_spec(
            &ArgoCdConfig::default(),
            &claims("https://git.example.com/checkout", "abc123"),
            "team-a",
        );
        assert_eq!(spec.project, "default");
        assert_eq!(spec.source.target_revision, "abc123");
        assert_eq!(spec.source.path, "claims");
        assert_eq!(spec.destination.server, "https://kubernetes.default.svc");
        assert_eq!(spec.destination.namespace, "team-a");
        assert_eq!(
            spec.sync_policy.automated,
            Some(AutomatedSync {
                prune: true,
                self_heal: true
            })
        );
        assert_eq!(spec.sync_policy.sync_options, vec!["CreateNamespace=true"]);
    }
}
