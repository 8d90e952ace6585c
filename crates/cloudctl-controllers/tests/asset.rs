mod common;

use cloudctl_controllers::naming::{self, roles};
use cloudctl_controllers::{Action, AssetReconciler};
use cloudctl_core::resources::{Application, Asset, Project};
use cloudctl_core::{HasStatus, OWNER_NAMESPACE_LABEL, READY, Resource, StatusConditions};

use common::{Harness, NS, asset};

const REPO: &str = "https://git.example.com/org/checkout";

#[tokio::test]
async fn test_asset_creates_application_in_argocd_namespace() {
    let h = Harness::new();
    let created = h.create(asset("checkout", REPO, "abc123")).await;

    let action = h.run(&AssetReconciler, "checkout").await;
    assert_eq!(action, Action::AwaitChange);

    let apps = h.api::<Application>().list(Some("argocd")).await.unwrap();
    assert_eq!(apps.len(), 1);
    let app = &apps[0];
    assert_eq!(
        app.name(),
        naming::child_name(&created.key(), roles::CLAIMS_APPLICATION)
    );
    assert!(app.meta().is_controlled_by(created.metadata.uid.as_deref().unwrap()));
    assert_eq!(
        app.meta().labels.get(OWNER_NAMESPACE_LABEL).map(String::as_str),
        Some(NS)
    );
    assert_eq!(app.spec.source.repo_url, REPO);
    assert_eq!(app.spec.source.target_revision, "abc123");
    assert_eq!(app.spec.destination.namespace, NS);

    let status = h.get::<Asset>("checkout").await.unwrap().status.unwrap();
    assert_eq!(status.application.as_deref(), Some(app.name()));
    assert!(status.claims.is_empty());
    assert!(status.condition(READY).unwrap().is_true());
}

#[tokio::test]
async fn test_claims_fan_out_to_projects_and_prune() {
    let h = Harness::new();
    h.claims.set_claims(REPO, "abc123", ["bucket", "redis"]);
    h.claims.set_claims(REPO, "def456", ["bucket"]);
    let created = h.create(asset("checkout", REPO, "abc123")).await;

    h.run(&AssetReconciler, "checkout").await;
    let projects = h.list::<Project>().await;
    assert_eq!(projects.len(), 2);
    let bucket = naming::project_id(&created.key(), &roles::claim("bucket"));
    assert!(projects.iter().any(|p| p.name() == bucket));

    let api = h.api::<Asset>();
    let mut moved = api.get(NS, "checkout").await.unwrap().unwrap();
    moved.spec.claims.git_commit = "def456".to_string();
    api.replace(&moved).await.unwrap();

    h.run(&AssetReconciler, "checkout").await;
    let projects = h.list::<Project>().await;
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name(), bucket);

    let app = h
        .api::<Application>()
        .list(Some("argocd"))
        .await
        .unwrap()
        .remove(0);
    assert_eq!(app.spec.source.target_revision, "def456");

    let status = h.get::<Asset>("checkout").await.unwrap().status.unwrap();
    assert_eq!(status.claims, vec!["bucket"]);
    assert_eq!(status.projects, vec![bucket]);
}

#[tokio::test]
async fn test_invalid_repository_is_terminal() {
    let h = Harness::new();
    h.create(asset("checkout", "not a url", "abc123")).await;

    let action = h.run(&AssetReconciler, "checkout").await;
    assert_eq!(action, Action::AwaitChange);
    assert!(h.api::<Application>().list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deleting_asset_cascades_to_children() {
    let h = Harness::new();
    h.claims.set_claims(REPO, "abc123", ["bucket"]);
    h.create(asset("checkout", REPO, "abc123")).await;
    h.run(&AssetReconciler, "checkout").await;
    assert_eq!(h.list::<Project>().await.len(), 1);

    h.api::<Asset>().delete(NS, "checkout").await.unwrap();
    assert!(h.list::<Project>().await.is_empty());
    assert!(h.api::<Application>().list(None).await.unwrap().is_empty());
    assert_eq!(h.run(&AssetReconciler, "checkout").await, Action::AwaitChange);
}
