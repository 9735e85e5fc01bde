//! Transaction log and rollback errors

use std::path::Path;

use super::AebError;

/// Creates a transaction failure
pub fn failed(message: impl Into<String>) -> AebError {
    AebError::TransactionFailed {
        message: message.into(),
    }
}

/// Creates an unresolved log error
pub fn unresolved_log(path: &Path) -> AebError {
    AebError::UnresolvedLog {
        path: path.display().to_string(),
    }
}

/// Creates an invalid log error
pub fn invalid_log(path: &Path, reason: impl Into<String>) -> AebError {
    AebError::InvalidLog {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Creates an indeterminate state error
pub fn indeterminate(message: impl Into<String>) -> AebError {
    AebError::IndeterminateState {
        message: message.into(),
    }
}

/// Creates a reference count database error
pub fn refcount(message: impl Into<String>) -> AebError {
    AebError::RefCountDatabase {
        message: message.into(),
    }
}
