mod common;

use std::time::Duration;

use serde_json::json;

use cloudctl_controllers::error::reason;
use cloudctl_controllers::{Action, DesiredChild, ParentRef, ProductReconciler, reconcile_fanout};
use cloudctl_core::resources::{
    IamUserPermission, Product, Project, ProjectParameters, ProjectSpec, ProviderConfigReference,
};
use cloudctl_core::{HasSpec, HasStatus, ObjectMeta, READY, Resource, StatusConditions};

use common::{Harness, NS, organization, product};

fn spec(id: &str) -> ProjectSpec {
    ProjectSpec {
        for_provider: ProjectParameters {
            name: id.to_string(),
        },
        provider_config_ref: ProviderConfigReference {
            name: "gcp-provider".to_string(),
        },
    }
}

fn desired(ids: &[&str]) -> Vec<DesiredChild<ProjectSpec>> {
    ids.iter().map(|id| DesiredChild::new(*id, spec(id))).collect()
}

#[tokio::test]
async fn test_fanout_is_idempotent() {
    let h = Harness::new();
    let parent = h.create(product("checkout", "payments")).await;
    let parent = ParentRef::of(&parent).unwrap();
    let api = h.api::<Project>();

    let first = reconcile_fanout(&api, &parent, NS, desired(&["p1", "p2"]), &[])
        .await
        .unwrap();
    assert_eq!(first.created, vec!["p1", "p2"]);

    let versions: Vec<_> = h
        .list::<Project>()
        .await
        .into_iter()
        .map(|p| p.metadata.resource_version)
        .collect();

    let second = reconcile_fanout(&api, &parent, NS, desired(&["p1", "p2"]), &[])
        .await
        .unwrap();
    assert!(second.is_noop());
    assert_eq!(second.unchanged, vec!["p1", "p2"]);

    let after: Vec<_> = h
        .list::<Project>()
        .await
        .into_iter()
        .map(|p| p.metadata.resource_version)
        .collect();
    assert_eq!(versions, after);
}

#[tokio::test]
async fn test_fanout_prunes_only_own_children() {
    let h = Harness::new();
    let checkout = h.create(product("checkout", "payments")).await;
    let billing = h.create(product("billing", "payments")).await;
    let checkout = ParentRef::of(&checkout).unwrap();
    let billing = ParentRef::of(&billing).unwrap();
    let api = h.api::<Project>();

    reconcile_fanout(&api, &checkout, NS, desired(&["c1", "c2"]), &[])
        .await
        .unwrap();
    reconcile_fanout(&api, &billing, NS, desired(&["b1"]), &[])
        .await
        .unwrap();

    // "b1" is recorded as previous but belongs to another parent.
    let result = reconcile_fanout(
        &api,
        &checkout,
        NS,
        desired(&["c1"]),
        &["c2".to_string(), "b1".to_string()],
    )
    .await
    .unwrap();
    assert_eq!(result.deleted, vec!["c2"]);

    let mut names: Vec<String> = h
        .list::<Project>()
        .await
        .iter()
        .map(|p| p.name().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["b1", "c1"]);
}

#[tokio::test]
async fn test_fanout_adopts_orphan_and_heals_drift() {
    let h = Harness::new();
    let parent = h.create(product("checkout", "payments")).await;
    let parent = ParentRef::of(&parent).unwrap();
    let api = h.api::<Project>();

    let mut orphan_spec = spec("p1");
    orphan_spec.provider_config_ref.name = "other".to_string();
    h.create(Project::from_parts(ObjectMeta::new(NS, "p1"), orphan_spec))
        .await;

    let result = reconcile_fanout(&api, &parent, NS, desired(&["p1"]), &[])
        .await
        .unwrap();
    assert_eq!(result.updated, vec!["p1"]);

    let adopted = h.get::<Project>("p1").await.unwrap();
    assert!(adopted.meta().is_controlled_by(parent.uid()));
    assert_eq!(adopted.spec, spec("p1"));
}

#[tokio::test]
async fn test_foreign_owner_is_a_terminal_conflict() {
    let h = Harness::new();
    h.directory.set_group("members", Vec::<&str>::new());
    h.create(organization("payments", "", "members")).await;

    let squatter = h.create(product("squatter", "payments")).await;
    let squatter = ParentRef::of(&squatter).unwrap();
    let checkout = h.create(product("checkout", "payments")).await;
    let taken = cloudctl_controllers::naming::project_id(
        &checkout.key(),
        cloudctl_controllers::naming::roles::NONPROD,
    );
    reconcile_fanout(&h.api::<Project>(), &squatter, NS, desired(&[taken.as_str()]), &[])
        .await
        .unwrap();

    let err = reconcile_fanout(
        &h.api::<Project>(),
        &ParentRef::of(&checkout).unwrap(),
        NS,
        desired(&[taken.as_str()]),
        &[],
    )
    .await
    .unwrap_err();
    assert!(!err.is_retryable());

    let action = h.run(&ProductReconciler, "checkout").await;
    assert_eq!(action, Action::AwaitChange);
    let stored = h.get::<Product>("checkout").await.unwrap();
    assert_eq!(
        stored.status().unwrap().condition(READY).unwrap().reason,
        reason::OWNERSHIP_CONFLICT
    );
    let owner = h.get::<Project>(&taken).await.unwrap();
    assert!(owner.meta().is_controlled_by(squatter.uid()));
}

#[tokio::test]
async fn test_undecodable_child_is_rewritten() {
    let h = Harness::new();
    h.directory.set_group("members", ["a@example.com"]);
    h.create(organization("payments", "", "members")).await;
    h.create(product("checkout", "payments")).await;
    h.run(&ProductReconciler, "checkout").await;

    let grant = h.list::<IamUserPermission>().await.remove(0);
    let key = grant.key();
    let mut raw = h.store.get(&key).await.unwrap().unwrap().object;
    raw["spec"]["userEmail"] = json!(42);
    h.store.update(&raw, None).await.unwrap();
    assert!(h.api::<IamUserPermission>().get(NS, grant.name()).await.is_err());

    let action = h.run(&ProductReconciler, "checkout").await;
    assert_eq!(action, Action::Requeue(Duration::from_secs(600)));

    let healed = h.get::<IamUserPermission>(grant.name()).await.unwrap();
    assert_eq!(healed.spec, grant.spec);
    assert_eq!(healed.metadata.uid, grant.metadata.uid);
    let stored = h.get::<Product>("checkout").await.unwrap();
    assert!(stored.status().unwrap().condition(READY).unwrap().is_true());
}

#[tokio::test]
async fn test_undecodable_foreign_child_does_not_block_other_parents() {
    let h = Harness::new();
    let other = h.create(product("billing", "payments")).await;
    let other = ParentRef::of(&other).unwrap();
    let api = h.api::<Project>();
    reconcile_fanout(&api, &other, NS, desired(&["b1"]), &[])
        .await
        .unwrap();
    let key = api.key(NS, "b1");
    let mut raw = h.store.get(&key).await.unwrap().unwrap().object;
    raw["spec"]["forProvider"] = json!("broken");
    h.store.update(&raw, None).await.unwrap();

    let parent = h.create(product("checkout", "payments")).await;
    let parent = ParentRef::of(&parent).unwrap();
    let result = reconcile_fanout(&api, &parent, NS, desired(&["p1"]), &["gone".to_string()])
        .await
        .unwrap();
    assert_eq!(result.created, vec!["p1"]);
    assert!(h.store.get(&key).await.unwrap().is_some());
}

#[tokio::test]
async fn test_parent_without_uid_is_rejected() {
    let unsaved = product("checkout", "payments");
    assert!(ParentRef::of(&unsaved).is_err());
}
