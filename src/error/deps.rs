//! Dependency, incompatibility and registry errors

use super::AebError;

/// Creates an already installed error
pub fn already_installed(id: impl Into<String>) -> AebError {
    AebError::AlreadyInstalled { id: id.into() }
}

/// Creates a not installed error
pub fn not_installed(id: impl Into<String>) -> AebError {
    AebError::NotInstalled { id: id.into() }
}

/// Creates an unmet requirement error
pub fn requirement_not_met(message: impl Into<String>) -> AebError {
    AebError::RequirementNotMet {
        message: message.into(),
    }
}

/// Creates an incompatibility error naming the conflicting extension
pub fn incompatible(name: impl Into<String>) -> AebError {
    AebError::Incompatible { name: name.into() }
}

/// Creates an error naming the extension that blocks an uninstall
pub fn required_by(name: impl Into<String>) -> AebError {
    AebError::RequiredBy { name: name.into() }
}

/// Creates an error for an extension scheduled for removal
pub fn pending_removal(id: impl Into<String>) -> AebError {
    AebError::PendingRemoval { id: id.into() }
}
