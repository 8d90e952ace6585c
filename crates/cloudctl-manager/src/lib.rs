//! Controller manager: wires the object store, event stream, directory and
//! claim source to the four reconcilers and runs them until shutdown.

pub mod bootstrap;
pub mod config;
pub mod observability;

use std::sync::Arc;

use cloudctl_controllers::claims::{HttpClaimSource, NoClaims, StaticClaimSource};
use cloudctl_controllers::{
    AssetReconciler, ClaimSourceError, Context, Controller, DynClaimSource,
    ElevatedAccessReconciler, OrganizationReconciler, ProductReconciler, Reconciler,
};
use cloudctl_core::events::EventBroadcaster;
use cloudctl_directory::{
    DirectoryError, DynResolver, HttpDirectory, HttpDirectoryConfig, StaticDirectory,
};
use cloudctl_store::{DynStore, EventedStore};
use cloudctl_store_memory::InMemoryStore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::{ClaimsBackend, ClaimsConfig, DirectoryBackend, DirectoryConfig};

pub use crate::bootstrap::{BootstrapError, BootstrapStats, load_manifests};
pub use crate::config::{ConfigError, ManagerConfig};

#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Claims(#[from] ClaimSourceError),

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
}

pub struct Manager {
    config: ManagerConfig,
    store: DynStore,
    broadcaster: Arc<EventBroadcaster>,
    ctx: Arc<Context>,
}

impl Manager {
    /// Validates the configuration and builds every collaborator. Nothing
    /// runs until [`Manager::run`].
    pub fn new(config: ManagerConfig) -> Result<Self, ManagerError> {
        config.validate().map_err(ConfigError::Invalid)?;

        let broadcaster = EventBroadcaster::new_shared();
        let store: DynStore = Arc::new(EventedStore::new(
            InMemoryStore::new(),
            broadcaster.clone(),
        ));
        let resolver = build_resolver(&config.directory)?;
        let claims = build_claim_source(&config.claims)?;

        info!(
            directory = resolver.backend_name(),
            claims = claims.backend_name(),
            "manager configured"
        );

        let ctx = Context::new(store.clone(), resolver)
            .with_claims(claims)
            .with_config(config.controllers.clone());

        Ok(Self {
            config,
            store,
            broadcaster,
            ctx: Arc::new(ctx),
        })
    }

    pub fn store(&self) -> &DynStore {
        &self.store
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// Applies the configured manifest directory, if any.
    pub async fn bootstrap(&self) -> Result<Option<BootstrapStats>, ManagerError> {
        match &self.config.bootstrap.manifests_dir {
            Some(dir) => Ok(Some(load_manifests(dir, &self.store).await?)),
            None => Ok(None),
        }
    }

    /// Bootstraps the store, then runs all controllers until `shutdown` fires
    /// and every in-flight pass has finished.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), ManagerError> {
        self.bootstrap().await?;

        let mut controllers = JoinSet::new();
        self.spawn(&mut controllers, OrganizationReconciler, &shutdown);
        self.spawn(&mut controllers, ProductReconciler, &shutdown);
        self.spawn(&mut controllers, AssetReconciler, &shutdown);
        self.spawn(&mut controllers, ElevatedAccessReconciler, &shutdown);
        info!(controllers = controllers.len(), "manager started");

        while let Some(joined) = controllers.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "controller task failed");
                shutdown.cancel();
            }
        }

        info!("manager stopped");
        Ok(())
    }

    fn spawn<R: Reconciler>(
        &self,
        set: &mut JoinSet<()>,
        reconciler: R,
        shutdown: &CancellationToken,
    ) {
        let controller = Controller::new(reconciler, self.ctx.clone());
        let events = self.broadcaster.subscribe();
        set.spawn(controller.run(events, shutdown.clone()));
    }
}

fn build_resolver(config: &DirectoryConfig) -> Result<DynResolver, ManagerError> {
    match config.backend {
        DirectoryBackend::Static => Ok(Arc::new(StaticDirectory::from_groups(
            config.groups.clone(),
        ))),
        DirectoryBackend::Http => {
            let base_url = config.base_url.clone().ok_or_else(|| {
                DirectoryError::InvalidConfig("directory.base_url is not set".into())
            })?;
            let http = HttpDirectory::new(
                HttpDirectoryConfig::new(base_url).with_timeout(config.timeout),
            )?;
            Ok(Arc::new(http))
        }
    }
}

fn build_claim_source(config: &ClaimsConfig) -> Result<DynClaimSource, ManagerError> {
    match config.backend {
        ClaimsBackend::None => Ok(Arc::new(NoClaims)),
        ClaimsBackend::Static => {
            let source = StaticClaimSource::new();
            for entry in &config.repositories {
                source.set_claims(&entry.repository_url, &entry.git_commit, &entry.claims);
            }
            Ok(Arc::new(source))
        }
        ClaimsBackend::Http => Ok(Arc::new(HttpClaimSource::new(config.timeout)?)),
    }
}
