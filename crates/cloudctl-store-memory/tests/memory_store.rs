use serde_json::{Value, json};
use time::macros::datetime;

use cloudctl_core::events::{EventBroadcaster, ResourceEventType};
use cloudctl_core::{ManualClock, ObjectKey, ResourceKind};
use cloudctl_store::{DeleteOutcome, EventedStore, ObjectStore};
use cloudctl_store_memory::InMemoryStore;

fn organization(name: &str) -> Value {
    json!({
        "apiVersion": "cloud.company.com/v1alpha1",
        "kind": "Organization",
        "metadata": {"name": name, "namespace": "team-a"},
        "spec": {"approvers": "approvers", "members": "members"}
    })
}

fn project(name: &str, owner_uid: &str) -> Value {
    json!({
        "kind": "Project",
        "metadata": {
            "name": name,
            "namespace": "team-a",
            "ownerReferences": [{
                "apiVersion": "cloud.company.com/v1alpha1",
                "kind": "Product",
                "name": "checkout",
                "uid": owner_uid,
                "controller": true,
                "blockOwnerDeletion": true
            }]
        },
        "spec": {"forProvider": {"name": name}, "providerConfigRef": {"name": "gcp-provider"}}
    })
}

fn product() -> Value {
    json!({
        "kind": "Product",
        "metadata": {"name": "checkout", "namespace": "team-a"},
        "spec": {"name": "checkout", "organization": {"name": "payments"}}
    })
}

fn key(kind: ResourceKind, name: &str) -> ObjectKey {
    ObjectKey::new(kind, "team-a", name)
}

#[tokio::test]
async fn test_create_assigns_system_metadata() {
    let clock = ManualClock::shared(datetime!(2024-03-01 09:00:00 UTC));
    let store = InMemoryStore::with_clock(clock);

    let mut payload = organization("payments");
    payload["status"] = json!({"members": ["intruder@example.com"]});
    let stored = store.create(&payload).await.unwrap();

    let meta = &stored.object["metadata"];
    assert!(meta["uid"].as_str().is_some_and(|uid| !uid.is_empty()));
    assert_eq!(meta["generation"], 1);
    assert_eq!(meta["creationTimestamp"], "2024-03-01T09:00:00Z");
    assert_eq!(meta["resourceVersion"], stored.resource_version.as_str());
    assert!(stored.object.get("status").is_none());
}

#[tokio::test]
async fn test_create_rejects_occupied_key() {
    let store = InMemoryStore::new();
    store.create(&organization("payments")).await.unwrap();
    let err = store.create(&organization("payments")).await.unwrap_err();
    assert!(err.is_already_exists());
}

#[tokio::test]
async fn test_update_checks_resource_version() {
    let store = InMemoryStore::new();
    let created = store.create(&organization("payments")).await.unwrap();

    let mut edit = created.object.clone();
    edit["spec"]["members"] = json!("everyone");
    let updated = store
        .update(&edit, Some(&created.resource_version))
        .await
        .unwrap();
    assert_ne!(updated.resource_version, created.resource_version);

    let err = store
        .update(&edit, Some(&created.resource_version))
        .await
        .unwrap_err();
    assert!(err.is_version_conflict());
}

#[tokio::test]
async fn test_generation_bumps_only_on_spec_change() {
    let store = InMemoryStore::new();
    let created = store.create(&organization("payments")).await.unwrap();

    let mut labelled = created.object.clone();
    labelled["metadata"]["labels"] = json!({"tier": "gold"});
    let stored = store.update(&labelled, None).await.unwrap();
    assert_eq!(stored.object["metadata"]["generation"], 1);

    let mut edited = stored.object.clone();
    edited["spec"]["approvers"] = json!("leads");
    let stored = store.update(&edited, None).await.unwrap();
    assert_eq!(stored.object["metadata"]["generation"], 2);
}

#[tokio::test]
async fn test_status_is_a_separate_subresource() {
    let store = InMemoryStore::new();
    let created = store.create(&organization("payments")).await.unwrap();
    let org = key(ResourceKind::Organization, "payments");

    store
        .update_status(&org, &json!({"members": ["a@example.com"]}))
        .await
        .unwrap();

    let mut edit = created.object.clone();
    edit["status"] = json!({"members": []});
    edit["spec"]["members"] = json!("others");
    let stored = store.update(&edit, None).await.unwrap();
    assert_eq!(stored.object["status"]["members"][0], "a@example.com");
    assert_eq!(stored.object["spec"]["members"], "others");
    assert_eq!(
        stored.object["metadata"]["uid"],
        created.object["metadata"]["uid"]
    );
}

#[tokio::test]
async fn test_delete_with_finalizer_marks_then_removes() {
    let clock = ManualClock::shared(datetime!(2024-03-01 09:00:00 UTC));
    let store = InMemoryStore::with_clock(clock);
    let mut payload = organization("payments");
    payload["metadata"]["finalizers"] = json!(["finalizer.organization.cloud.company.com"]);
    store.create(&payload).await.unwrap();
    let org = key(ResourceKind::Organization, "payments");

    let outcome = store.delete(&org).await.unwrap();
    let DeleteOutcome::Finalizing(marked) = outcome else {
        panic!("expected finalizing outcome");
    };
    assert_eq!(
        marked.object["metadata"]["deletionTimestamp"],
        "2024-03-01T09:00:00Z"
    );

    // Repeated deletes keep the object marked.
    assert!(!store.delete(&org).await.unwrap().is_removed());

    let mut released = marked.object.clone();
    released["metadata"]["finalizers"] = json!([]);
    store.update(&released, None).await.unwrap();
    assert!(store.get(&org).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_cascades_to_controlled_objects() {
    let store = InMemoryStore::new();
    let parent = store.create(&product()).await.unwrap();
    let uid = parent.object["metadata"]["uid"].as_str().unwrap().to_string();

    store.create(&project("checkout-nonprod", &uid)).await.unwrap();
    store.create(&project("checkout-prod", &uid)).await.unwrap();
    store.create(&project("unrelated", "other-uid")).await.unwrap();

    let outcome = store
        .delete(&key(ResourceKind::Product, "checkout"))
        .await
        .unwrap();
    let DeleteOutcome::Removed { dependents, .. } = outcome else {
        panic!("expected removal");
    };
    assert_eq!(dependents.len(), 2);

    let remaining = store.list(ResourceKind::Project, None).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].key.name, "unrelated");
}

#[tokio::test]
async fn test_delete_missing_object() {
    let store = InMemoryStore::new();
    let err = store
        .delete(&key(ResourceKind::Product, "ghost"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_list_filters_by_namespace_and_sorts() {
    let store = InMemoryStore::new();
    store.create(&organization("zeta")).await.unwrap();
    store.create(&organization("alpha")).await.unwrap();
    let mut elsewhere = organization("beta");
    elsewhere["metadata"]["namespace"] = json!("team-b");
    store.create(&elsewhere).await.unwrap();

    let team_a = store
        .list(ResourceKind::Organization, Some("team-a"))
        .await
        .unwrap();
    let names: Vec<_> = team_a.iter().map(|o| o.key.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);

    let all = store.list(ResourceKind::Organization, None).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_evented_store_emits_events() {
    let broadcaster = EventBroadcaster::new_shared();
    let mut events = broadcaster.subscribe();
    let store = EventedStore::new(InMemoryStore::new(), broadcaster.clone());

    let parent = store.create(&product()).await.unwrap();
    let uid = parent.object["metadata"]["uid"].as_str().unwrap().to_string();
    store.create(&project("checkout-nonprod", &uid)).await.unwrap();
    store
        .update_status(&key(ResourceKind::Product, "checkout"), &json!({"projects": []}))
        .await
        .unwrap();
    store
        .delete(&key(ResourceKind::Product, "checkout"))
        .await
        .unwrap();

    let created = events.recv().await.unwrap();
    assert_eq!(created.event_type, ResourceEventType::Created);
    assert_eq!(created.key, key(ResourceKind::Product, "checkout"));

    let child = events.recv().await.unwrap();
    assert_eq!(child.event_type, ResourceEventType::Created);
    assert_eq!(
        child.controller_key(),
        Some(key(ResourceKind::Product, "checkout"))
    );

    assert_eq!(
        events.recv().await.unwrap().event_type,
        ResourceEventType::StatusUpdated
    );

    let deleted = events.recv().await.unwrap();
    assert_eq!(deleted.event_type, ResourceEventType::Deleted);
    assert_eq!(deleted.key.kind, ResourceKind::Product);
    let cascaded = events.recv().await.unwrap();
    assert_eq!(cascaded.event_type, ResourceEventType::Deleted);
    assert_eq!(cascaded.key.kind, ResourceKind::Project);

    assert_eq!(store.backend_name(), "memory");
}
