use crate::thread_path::ThreadPathError;

#[derive(Debug, thiserror::Error)]
pub enum BlogError {
    /// The caller broke a usage contract, e.g. asked a reply for its
    /// descendant count.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("{kind} {key} not found")]
    NotFound { kind: &'static str, key: String },

    /// Input rejected before it reached the store.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    CorruptThreadPath(#[from] ThreadPathError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl BlogError {
    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        BlogError::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BlogError::NotFound { .. })
    }
}

pub type Result<T, E = BlogError> = std::result::Result<T, E>;
