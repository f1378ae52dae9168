use thiserror::Error;

/// Error taxonomy of the group state manager.
///
/// Entry-level load failures (`AssetNotFound`, `AssetDecodeFailure`,
/// `AssetTimeout`, `MetadataMalformed`) are caught at the group loader
/// boundary and never abort sibling entries. `DuplicateLoadAttempt` is a race
/// signal that gets suppressed, not surfaced. `StateInvariantViolation` is a
/// programming-error signal, not a recoverable condition.
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("asset not found: {url}")]
    AssetNotFound { url: String },

    #[error("failed to decode asset {url}: {reason}")]
    AssetDecodeFailure { url: String, reason: String },

    #[error("fetch of {url} timed out after {secs}s")]
    AssetTimeout { url: String, secs: u64 },

    #[error("malformed metadata for entry {id}: {reason}")]
    MetadataMalformed { id: String, reason: &'static str },

    #[error("duplicate load attempt for entry {id}")]
    DuplicateLoadAttempt { id: String },

    #[error("state invariant violated: {detail}")]
    StateInvariantViolation { detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ViewerError {
    /// Whether this failure concerns a single entry and must not abort the
    /// surrounding group operation.
    pub fn is_entry_level(&self) -> bool {
        matches!(
            self,
            ViewerError::AssetNotFound { .. }
                | ViewerError::AssetDecodeFailure { .. }
                | ViewerError::AssetTimeout { .. }
                | ViewerError::MetadataMalformed { .. }
                | ViewerError::DuplicateLoadAttempt { .. }
        )
    }
}
