use std::fmt;

use cloudctl_core::CoreError;
use cloudctl_directory::DirectoryError;
use cloudctl_store::StoreError;

use crate::claims::ClaimSourceError;

/// Reasons written to the `Ready` condition for failures that need a spec
/// change before another pass can succeed.
pub const TERMINAL_REASONS: [&str; 2] = [reason::INVALID_SPEC, reason::OWNERSHIP_CONFLICT];

pub mod reason {
    pub const RECONCILED: &str = "Reconciled";
    pub const MISSING_REFERENCE: &str = "MissingReference";
    pub const INVALID_SPEC: &str = "InvalidSpec";
    pub const OWNERSHIP_CONFLICT: &str = "OwnershipConflict";
    pub const IN_USE: &str = "InUse";
    pub const STORE_ERROR: &str = "StoreError";
    pub const DIRECTORY_ERROR: &str = "DirectoryError";
    pub const CLAIMS_ERROR: &str = "ClaimsError";
    pub const INTERNAL_ERROR: &str = "InternalError";
}

/// Errors that abort a reconcile pass.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Referenced object not found: {key}")]
    MissingReference { key: String },

    #[error("Invalid spec: {0}")]
    InvalidSpec(String),

    #[error("{child} is controlled by another owner ({owner})")]
    OwnershipConflict { child: String, owner: String },

    #[error("{key} is still referenced by {by}")]
    InUse { key: String, by: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Claim source error: {0}")]
    Claims(#[from] ClaimSourceError),

    #[error("Object model error: {0}")]
    Core(#[from] CoreError),
}

impl ReconcileError {
    pub fn missing_reference(key: impl ToString) -> Self {
        Self::MissingReference {
            key: key.to_string(),
        }
    }

    pub fn invalid_spec(message: impl Into<String>) -> Self {
        Self::InvalidSpec(message.into())
    }

    pub fn ownership_conflict(child: impl ToString, owner: impl ToString) -> Self {
        Self::OwnershipConflict {
            child: child.to_string(),
            owner: owner.to_string(),
        }
    }

    pub fn in_use(key: impl ToString, by: impl ToString) -> Self {
        Self::InUse {
            key: key.to_string(),
            by: by.to_string(),
        }
    }

    /// Whether a later pass over the same generation can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::MissingReference { .. } | Self::InUse { .. } => true,
            Self::InvalidSpec(_) | Self::OwnershipConflict { .. } => false,
            Self::Store(err) => err.is_retryable(),
            Self::Directory(err) => err.is_retryable(),
            Self::Claims(err) => err.is_retryable(),
            Self::Core(_) => true,
        }
    }

    /// Reason written to the `Ready` condition.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingReference { .. } => reason::MISSING_REFERENCE,
            Self::InvalidSpec(_) => reason::INVALID_SPEC,
            Self::OwnershipConflict { .. } => reason::OWNERSHIP_CONFLICT,
            Self::InUse { .. } => reason::IN_USE,
            Self::Store(_) => reason::STORE_ERROR,
            Self::Directory(_) => reason::DIRECTORY_ERROR,
            Self::Claims(err) if !err.is_retryable() => reason::INVALID_SPEC,
            Self::Claims(_) => reason::CLAIMS_ERROR,
            Self::Core(_) => reason::INTERNAL_ERROR,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingReference { .. } => ErrorCategory::Dependency,
            Self::InvalidSpec(_) => ErrorCategory::Validation,
            Self::OwnershipConflict { .. } | Self::InUse { .. } => ErrorCategory::Conflict,
            Self::Store(_) | Self::Directory(_) | Self::Claims(_) => ErrorCategory::Infrastructure,
            Self::Core(_) => ErrorCategory::Internal,
        }
    }
}

/// Error categories for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Dependency,
    Validation,
    Conflict,
    Infrastructure,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dependency => write!(f, "dependency"),
            Self::Validation => write!(f, "validation"),
            Self::Conflict => write!(f, "conflict"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
