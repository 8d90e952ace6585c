//! Change notifications emitted by the object store.
//!
//! Every write that lands in the store produces one [`ResourceEvent`] on the
//! shared [`EventBroadcaster`]. Controllers subscribe and map events to the
//! keys they need to reconcile: their own kind directly, derived objects via
//! their controller owner reference.

mod broadcaster;
mod types;

pub use broadcaster::EventBroadcaster;
pub use types::{ResourceEvent, ResourceEventType};
