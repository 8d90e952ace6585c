//! Level-triggered reconcilers for the cloud platform's custom resources.
//!
//! Every controller follows the same pass: fetch the parent, validate its
//! references, resolve principals, derive the desired children, converge the
//! actual children onto them, then write status and return an [`Action`].
//!
//! Building blocks, leaves first:
//! - [`reference`] - existence checks for referenced objects
//! - [`naming`] - deterministic, bounded child names
//! - [`fanout`] - create/update/prune of a parent's children
//! - [`lifecycle`] - TTL grant state machine
//! - [`runtime`] - per-key work queue, event mapping and the pass driver
//! - [`reconcilers`] - the four controllers

pub mod claims;
pub mod config;
pub mod context;
pub mod error;
pub mod fanout;
pub mod lifecycle;
pub mod naming;
pub mod reconcilers;
pub mod reference;
pub mod runtime;

pub use claims::{Claim, ClaimSource, ClaimSourceError, DynClaimSource};
pub use config::{ArgoCdConfig, ControllerConfig};
pub use context::Context;
pub use error::{ErrorCategory, ReconcileError};
pub use fanout::{DesiredChild, FanoutResult, ParentRef, reconcile_fanout};
pub use reconcilers::{
    AssetReconciler, ElevatedAccessReconciler, OrganizationReconciler, ProductReconciler,
};
pub use runtime::{Action, Controller, Reconciler};
