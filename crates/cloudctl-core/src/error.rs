use thiserror::Error;

/// Core error types for cloudctl object handling
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid resource kind: {0}")]
    InvalidKind(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Time parsing error: {0}")]
    TimeError(#[from] time::error::Parse),

    #[error("Object {key} has no uid yet")]
    MissingUid { key: String },
}

impl CoreError {
    /// Create a new InvalidKind error
    pub fn invalid_kind(kind: impl Into<String>) -> Self {
        Self::InvalidKind(kind.into())
    }

    /// Create a new InvalidKey error
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey(key.into())
    }

    /// Create a new InvalidTimestamp error
    pub fn invalid_timestamp(value: impl Into<String>) -> Self {
        Self::InvalidTimestamp(value.into())
    }

    /// Create a new MissingUid error
    pub fn missing_uid(key: impl ToString) -> Self {
        Self::MissingUid {
            key: key.to_string(),
        }
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidKind(_) | Self::InvalidKey(_) | Self::InvalidTimestamp(_) => {
                ErrorCategory::Validation
            }
            Self::JsonError(_) => ErrorCategory::Serialization,
            Self::TimeError(_) => ErrorCategory::System,
            Self::MissingUid { .. } => ErrorCategory::System,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Serialization,
    System,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Serialization => write!(f, "serialization"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CoreError::invalid_kind("Widget");
        assert_eq!(err.to_string(), "Invalid resource kind: Widget");
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_missing_uid_error() {
        let err = CoreError::missing_uid("Product/team-a/checkout");
        assert_eq!(err.to_string(), "Object Product/team-a/checkout has no uid yet");
        assert_eq!(err.category(), ErrorCategory::System);
    }
}
