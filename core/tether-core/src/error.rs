//!
//! Error Taxonomy
//!
//! All registry and facade operations return `Result<_, SyncError>`. The
//! taxonomy is deliberately small:
//!
//! - `NotInitialized` / `AlreadyInitialized`: lifecycle preconditions
//! - `InvalidHandle`: negative, out of range, or destroyed handle
//! - `Underlying`: verbatim pthread status passthrough (EBUSY, ETIMEDOUT,
//!   EDEADLK, EPERM, ...)
//! - `AllocationFailed`: heap exhaustion during registry growth
//!
//! Busy and timed-out statuses are not errors of this layer; they travel
//! through `Underlying` untouched so the host sees exactly what the
//! synchronization library reported.
//!

use thiserror::Error;

use crate::status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("runtime is not initialized")]
    NotInitialized,

    #[error("runtime is already initialized")]
    AlreadyInitialized,

    #[error("invalid handle")]
    InvalidHandle,

    #[error("synchronization library reported status {0}")]
    Underlying(i32),

    #[error("allocation failed during registry growth")]
    AllocationFailed,
}

impl SyncError {
    /// C ABI status code for this error.
    ///
    /// Layer errors map to the negative constants in [`status`]; pthread
    /// statuses pass through as their (positive) errno value.
    pub fn code(&self) -> i32 {
        match self {
            SyncError::NotInitialized => status::NOT_INITIALIZED,
            SyncError::AlreadyInitialized => status::ALREADY_INITIALIZED,
            SyncError::InvalidHandle => status::INVALID_HANDLE,
            SyncError::Underlying(code) => *code,
            SyncError::AllocationFailed => status::ALLOC_FAILED,
        }
    }
}

/// Collapse a facade result into a C ABI status code.
pub fn status_code(result: Result<(), SyncError>) -> i32 {
    match result {
        Ok(()) => status::OK,
        Err(err) => err.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SyncError::NotInitialized.code(), status::NOT_INITIALIZED);
        assert_eq!(SyncError::AlreadyInitialized.code(), status::ALREADY_INITIALIZED);
        assert_eq!(SyncError::InvalidHandle.code(), status::INVALID_HANDLE);
        assert_eq!(SyncError::AllocationFailed.code(), status::ALLOC_FAILED);
        assert_eq!(SyncError::Underlying(16).code(), 16);
    }

    #[test]
    fn test_status_code() {
        assert_eq!(status_code(Ok(())), status::OK);
        assert_eq!(status_code(Err(SyncError::InvalidHandle)), status::INVALID_HANDLE);
    }

    #[test]
    fn test_display() {
        assert_eq!(SyncError::InvalidHandle.to_string(), "invalid handle");
        assert_eq!(
            SyncError::Underlying(110).to_string(),
            "synchronization library reported status 110"
        );
    }
}
