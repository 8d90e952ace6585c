/// Errors returned by directory backends.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DirectoryError {
    /// The directory could not be reached or answered with a server error.
    #[error("Directory unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown group: {0}")]
    UnknownGroup(String),

    #[error("Invalid directory response: {0}")]
    InvalidResponse(String),

    #[error("Invalid directory configuration: {0}")]
    InvalidConfig(String),
}

impl DirectoryError {
    /// Only configuration errors are permanent; groups may appear later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidConfig(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(DirectoryError::Unavailable("timeout".into()).is_retryable());
        assert!(DirectoryError::UnknownGroup("admins".into()).is_retryable());
        assert!(!DirectoryError::InvalidConfig("no base url".into()).is_retryable());
    }
}
