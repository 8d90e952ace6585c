//! Shared dependencies handed to every reconcile pass.

use std::sync::Arc;

use cloudctl_core::{Resource, SharedClock, SystemClock, Timestamp};
use cloudctl_directory::DynResolver;
use cloudctl_store::{Api, DynStore};

use crate::claims::{DynClaimSource, NoClaims};
use crate::config::ControllerConfig;
use crate::reference::ReferenceValidator;

#[derive(Clone)]
pub struct Context {
    pub store: DynStore,
    pub resolver: DynResolver,
    pub claims: DynClaimSource,
    pub clock: SharedClock,
    pub config: ControllerConfig,
}

impl Context {
    pub fn new(store: DynStore, resolver: DynResolver) -> Self {
        Self {
            store,
            resolver,
            claims: Arc::new(NoClaims),
            clock: Arc::new(SystemClock),
            config: ControllerConfig::default(),
        }
    }

    #[must_use]
    pub fn with_claims(mut self, claims: DynClaimSource) -> Self {
        self.claims = claims;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn api<K: Resource>(&self) -> Api<K> {
        Api::new(self.store.clone())
    }

    pub fn references(&self) -> ReferenceValidator {
        ReferenceValidator::new(self.store.clone())
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}
