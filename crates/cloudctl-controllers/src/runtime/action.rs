use std::time::Duration;

/// What a controller does with a key after a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Run another pass after the delay even without new events.
    Requeue(Duration),
    /// Wait for the next relevant event.
    AwaitChange,
}

impl Action {
    pub fn requeue(after: Duration) -> Self {
        Self::Requeue(after)
    }

    pub fn await_change() -> Self {
        Self::AwaitChange
    }

    pub fn requeue_after(&self) -> Option<Duration> {
        match self {
            Self::Requeue(after) => Some(*after),
            Self::AwaitChange => None,
        }
    }
}
