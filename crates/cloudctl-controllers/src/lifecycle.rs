//! Time-bounded grant state machine.
//!
//! A grant is `Active` while `now < granted_at + ttl` and `Expired` from
//! that instant on. `Expired` is terminal: nothing moves a grant out of it.

use std::time::Duration;

use cloudctl_core::Timestamp;
use cloudctl_core::resources::GrantState;

use crate::error::ReconcileError;

/// Parses durations such as `10m`, `1h30m` or `1h 30m`.
pub fn parse_ttl(ttl: &str) -> Result<Duration, ReconcileError> {
    let ttl = ttl.trim();
    if ttl.is_empty() {
        return Err(ReconcileError::invalid_spec("ttl must not be empty"));
    }
    humantime::parse_duration(ttl)
        .map_err(|e| ReconcileError::invalid_spec(format!("invalid ttl '{ttl}': {e}")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantWindow {
    pub granted_at: Timestamp,
    pub expires_at: Timestamp,
}

impl GrantWindow {
    pub fn new(granted_at: Timestamp, ttl: Duration) -> Self {
        Self {
            granted_at,
            expires_at: granted_at.saturating_add(ttl),
        }
    }

    pub fn state_at(&self, now: Timestamp) -> GrantState {
        if now < self.expires_at {
            GrantState::Active
        } else {
            GrantState::Expired
        }
    }

    pub fn remaining(&self, now: Timestamp) -> Duration {
        now.until(self.expires_at)
    }

    /// When to look again while active: never later than `interval`, never
    /// later than the expiry instant.
    pub fn recheck_delay(&self, now: Timestamp, interval: Duration) -> Duration {
        interval.min(self.remaining(now))
    }
}

/// Combines the recorded state with what the window says now.
pub fn next_state(recorded: Option<GrantState>, observed: GrantState) -> GrantState {
    match recorded {
        Some(GrantState::Expired) => GrantState::Expired,
        _ => observed,
    }
}
