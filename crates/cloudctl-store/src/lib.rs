//! Object store boundary for cloudctl controllers.
//!
//! Backends implement [`ObjectStore`] over raw JSON objects. Controllers use
//! the typed [`Api`] handle, and [`EventedStore`] turns every successful write
//! into a [`ResourceEvent`](cloudctl_core::events::ResourceEvent).

pub mod api;
mod error;
pub mod evented;
mod traits;
mod types;

pub use api::Api;
pub use error::{ErrorCategory, StoreError};
pub use evented::EventedStore;
pub use traits::ObjectStore;
pub use types::{DeleteOutcome, StoredObject, object_key};

pub type StoreResult<T> = Result<T, StoreError>;

pub type DynStore = std::sync::Arc<dyn ObjectStore>;

pub mod prelude {
    pub use crate::api::Api;
    pub use crate::error::{ErrorCategory, StoreError};
    pub use crate::evented::EventedStore;
    pub use crate::traits::ObjectStore;
    pub use crate::types::{DeleteOutcome, StoredObject};
    pub use crate::{DynStore, StoreResult};
}
