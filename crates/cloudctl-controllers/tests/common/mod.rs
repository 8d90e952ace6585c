#![allow(dead_code)]

use std::sync::Arc;

use time::OffsetDateTime;
use time::macros::datetime;

use cloudctl_controllers::claims::StaticClaimSource;
use cloudctl_controllers::runtime::run_once;
use cloudctl_controllers::{Action, Context, ControllerConfig, Reconciler};
use cloudctl_core::resources::{
    Asset, AssetClaims, AssetSpec, ElevatedAccessRequest, ElevatedAccessRequestSpec, Organization,
    OrganizationSpec, Product, ProductOrganization, ProductSpec,
};
use cloudctl_core::{HasSpec, ManualClock, ObjectMeta, Resource};
use cloudctl_directory::StaticDirectory;
use cloudctl_store::{Api, DynStore};
use cloudctl_store_memory::InMemoryStore;

pub const NS: &str = "team-a";

pub fn t0() -> OffsetDateTime {
    datetime!(2024-03-01 09:00:00 UTC)
}

pub struct Harness {
    pub store: DynStore,
    pub clock: Arc<ManualClock>,
    pub directory: Arc<StaticDirectory>,
    pub claims: Arc<StaticClaimSource>,
    pub ctx: Context,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(|clock| Arc::new(InMemoryStore::with_clock(clock)) as DynStore)
    }

    pub fn with_store(build: impl FnOnce(Arc<ManualClock>) -> DynStore) -> Self {
        let clock = ManualClock::shared(t0());
        let store = build(clock.clone());
        let directory = Arc::new(StaticDirectory::new());
        let claims = Arc::new(StaticClaimSource::new());
        let ctx = Context::new(store.clone(), directory.clone())
            .with_claims(claims.clone())
            .with_clock(clock.clone())
            .with_config(ControllerConfig::default());
        Self {
            store,
            clock,
            directory,
            claims,
            ctx,
        }
    }

    pub fn api<K: Resource>(&self) -> Api<K> {
        self.ctx.api()
    }

    pub async fn create<K: Resource>(&self, object: K) -> K {
        self.api::<K>().create(&object).await.unwrap()
    }

    pub async fn get<K: Resource>(&self, name: &str) -> Option<K> {
        self.api::<K>().get(NS, name).await.unwrap()
    }

    pub async fn list<K: Resource>(&self) -> Vec<K> {
        self.api::<K>().list(Some(NS)).await.unwrap()
    }

    pub async fn run<R: Reconciler>(&self, reconciler: &R, name: &str) -> Action {
        let key = self.api::<R::Object>().key(NS, name);
        run_once(reconciler, &self.ctx, &key).await
    }
}

pub fn organization(name: &str, approvers: &str, members: &str) -> Organization {
    Organization::from_parts(
        ObjectMeta::new(NS, name),
        OrganizationSpec {
            approvers: approvers.to_string(),
            members: members.to_string(),
            ..Default::default()
        },
    )
}

pub fn product(name: &str, organization: &str) -> Product {
    Product::from_parts(
        ObjectMeta::new(NS, name),
        ProductSpec {
            name: name.to_string(),
            organization: ProductOrganization {
                name: organization.to_string(),
            },
        },
    )
}

pub fn request(name: &str, email: &str, product: &str, ttl: &str) -> ElevatedAccessRequest {
    ElevatedAccessRequest::from_parts(
        ObjectMeta::new(NS, name),
        ElevatedAccessRequestSpec {
            user_email: email.to_string(),
            product_name: product.to_string(),
            elevated_permissions: vec!["roles/editor".to_string()],
            asset_names: vec![format!("{product}-nonprod")],
            ttl: ttl.to_string(),
        },
    )
}

pub fn asset(name: &str, repository_url: &str, git_commit: &str) -> Asset {
    Asset::from_parts(
        ObjectMeta::new(NS, name),
        AssetSpec {
            claims: AssetClaims {
                repository_url: repository_url.to_string(),
                git_branch: "main".to_string(),
                git_commit: git_commit.to_string(),
            },
        },
    )
}
