//! In-memory object store.
//!
//! Holds every object in a [`dashmap::DashMap`] keyed by
//! [`ObjectKey`](cloudctl_core::ObjectKey). Suitable for tests and for
//! running the controllers against bootstrapped manifests.

mod storage;

pub use storage::InMemoryStore;
