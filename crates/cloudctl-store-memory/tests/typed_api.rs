use std::sync::Arc;

use cloudctl_core::resources::{
    Organization, OrganizationSpec, Product, ProductOrganization, ProductSpec,
};
use cloudctl_core::{HasSpec, HasStatus, ObjectMeta};
use cloudctl_store::{Api, DynStore};
use cloudctl_store_memory::InMemoryStore;

fn store() -> DynStore {
    Arc::new(InMemoryStore::new())
}

fn product() -> Product {
    Product::from_parts(
        ObjectMeta::new("team-a", "checkout"),
        ProductSpec {
            name: "checkout".to_string(),
            organization: ProductOrganization {
                name: "payments".to_string(),
            },
        },
    )
}

#[tokio::test]
async fn test_typed_round_trip_through_store() {
    let api: Api<Product> = Api::new(store());
    let created = api.create(&product()).await.unwrap();
    assert!(created.metadata.uid.is_some());
    assert_eq!(created.metadata.generation, Some(1));

    let fetched = api.get("team-a", "checkout").await.unwrap().unwrap();
    assert_eq!(fetched.spec, created.spec);
    assert_eq!(fetched.metadata.resource_version, created.metadata.resource_version);

    assert!(api.get("team-a", "missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_replace_uses_optimistic_concurrency() {
    let api: Api<Product> = Api::new(store());
    let created = api.create(&product()).await.unwrap();

    let mut first = created.clone();
    first.spec.name = "checkout-v2".to_string();
    let replaced = api.replace(&first).await.unwrap();
    assert_eq!(replaced.metadata.generation, Some(2));

    let mut stale = created;
    stale.spec.name = "checkout-v3".to_string();
    let err = api.replace(&stale).await.unwrap_err();
    assert!(err.is_version_conflict());
}

#[tokio::test]
async fn test_replace_status_leaves_spec_alone() {
    let api: Api<Organization> = Api::new(store());
    let mut org = api
        .create(&Organization::from_parts(
            ObjectMeta::new("team-a", "payments"),
            OrganizationSpec {
                members: "payments-devs".to_string(),
                ..Default::default()
            },
        ))
        .await
        .unwrap();

    org.spec.members = "ignored".to_string();
    org.status_mut().members = vec!["a@example.com".to_string()];
    let written = api.replace_status(&org).await.unwrap();

    assert_eq!(written.spec.members, "payments-devs");
    assert_eq!(written.status().unwrap().members, vec!["a@example.com"]);
}

#[tokio::test]
async fn test_delete_reports_missing_objects() {
    let api: Api<Product> = Api::new(store());
    api.create(&product()).await.unwrap();
    assert!(api.delete("team-a", "checkout").await.unwrap());
    assert!(!api.delete("team-a", "checkout").await.unwrap());
    assert!(api.list(Some("team-a")).await.unwrap().is_empty());
}
