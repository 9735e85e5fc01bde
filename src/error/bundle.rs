//! Manifest parsing and bundle validation errors

use super::AebError;

/// Creates a bundle not found error
pub fn not_found(path: impl Into<String>) -> AebError {
    AebError::BundleNotFound { path: path.into() }
}

/// Creates a manifest parse error
pub fn parse_failed(message: impl Into<String>) -> AebError {
    AebError::ManifestParse {
        message: message.into(),
    }
}

/// Creates a bundle validation failed error
pub fn validation_failed(message: impl Into<String>) -> AebError {
    AebError::ValidationFailed {
        message: message.into(),
    }
}

/// Creates an invalid content path error
pub fn invalid_content_path(path: impl Into<String>) -> AebError {
    AebError::InvalidContentPath { path: path.into() }
}

/// Creates a missing bundle file error
pub fn missing_file(url: impl Into<String>) -> AebError {
    AebError::MissingBundleFile { url: url.into() }
}
