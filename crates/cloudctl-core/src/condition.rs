//! Status conditions written by controllers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::time::Timestamp;

/// Condition type every controller maintains.
pub const READY: &str = "Ready";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => write!(f, "True"),
            Self::False => write!(f, "False"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    pub reason: String,
    #[serde(default)]
    pub message: String,
    pub last_transition_time: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl Condition {
    pub fn ready(now: Timestamp, generation: i64) -> Self {
        Self {
            type_: READY.to_string(),
            status: ConditionStatus::True,
            reason: "Reconciled".to_string(),
            message: String::new(),
            last_transition_time: now,
            observed_generation: Some(generation),
        }
    }

    pub fn not_ready(
        reason: impl Into<String>,
        message: impl Into<String>,
        now: Timestamp,
        generation: i64,
    ) -> Self {
        Self {
            type_: READY.to_string(),
            status: ConditionStatus::False,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: now,
            observed_generation: Some(generation),
        }
    }

    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }
}

/// Status blocks that carry a condition list.
pub trait StatusConditions {
    fn conditions(&self) -> &[Condition];
    fn conditions_mut(&mut self) -> &mut Vec<Condition>;

    fn condition(&self, type_: &str) -> Option<&Condition> {
        self.conditions().iter().find(|c| c.type_ == type_)
    }

    /// Upserts by type. The transition time only moves when the status flips.
    fn set_condition(&mut self, mut condition: Condition) {
        let conditions = self.conditions_mut();
        match conditions.iter_mut().find(|c| c.type_ == condition.type_) {
            Some(existing) => {
                if existing.status == condition.status {
                    condition.last_transition_time = existing.last_transition_time;
                }
                *existing = condition;
            }
            None => conditions.push(condition),
        }
    }
}
