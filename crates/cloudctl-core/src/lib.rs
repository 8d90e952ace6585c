pub mod condition;
pub mod error;
pub mod events;
pub mod kind;
pub mod meta;
pub mod resources;
pub mod time;

pub use condition::{Condition, ConditionStatus, READY, StatusConditions};
pub use error::{CoreError, ErrorCategory, Result};
pub use kind::ResourceKind;
pub use meta::{OWNER_NAMESPACE_LABEL, ObjectKey, ObjectMeta, OwnerReference};
pub use resources::{HasSpec, HasStatus, ObservedStatus, Resource};
pub use time::{Clock, ManualClock, SharedClock, SystemClock, Timestamp, now_utc};
