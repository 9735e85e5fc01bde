//! Error types and handling for the extension installer
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`bundle`]: Manifest parsing and bundle validation errors
//! - [`deps`]: Dependency, incompatibility and registry errors
//! - [`transaction`]: Transaction log and rollback errors
//! - [`config`]: Configuration errors
//! - [`fs`]: File system errors

pub mod bundle;
pub mod config;
pub mod deps;
pub mod fs;
pub mod transaction;


use miette::Diagnostic;
use thiserror::Error;

/// Main error type for installer operations
#[derive(Error, Diagnostic, Debug)]
pub enum AebError {
    // Parse errors
    #[error("Bundle not found: {path}")]
    #[diagnostic(
        code(aeb::bundle::not_found),
        help("Pass the path of an .aeb archive or of a bundle's install.rdf")
    )]
    BundleNotFound { path: String },

    #[error("Unable to load bundle: {message}")]
    #[diagnostic(code(aeb::bundle::parse_failed))]
    ManifestParse { message: String },

    #[error("Unsupported bundle type: {kind}")]
    #[diagnostic(
        code(aeb::bundle::unsupported_type),
        help("Only single-extension bundles (type 2) can be installed")
    )]
    UnsupportedBundleType { kind: String },

    // Validation errors
    #[error("This extension is invalid. {message}")]
    #[diagnostic(code(aeb::bundle::invalid))]
    ValidationFailed { message: String },

    #[error("The extension contains an invalid content path: {path}")]
    #[diagnostic(
        code(aeb::bundle::invalid_content_path),
        help("Content must live under Bin, Doc, Help, DefaultSettings, PlugIns, Templates, SupportFiles or Wizards")
    )]
    InvalidContentPath { path: String },

    #[error("Bundle file is missing: {url}")]
    #[diagnostic(code(aeb::bundle::missing_file))]
    MissingBundleFile { url: String },

    // Dependency errors
    #[error("Extension '{id}' is already installed")]
    #[diagnostic(
        code(aeb::deps::already_installed),
        help("Uninstall the existing extension first")
    )]
    AlreadyInstalled { id: String },

    #[error("Extension '{id}' is pending removal")]
    #[diagnostic(
        code(aeb::deps::pending_removal),
        help("Run 'aeb process-pending' to finish the removal first")
    )]
    PendingRemoval { id: String },

    #[error("Extension '{id}' is not registered as installed")]
    #[diagnostic(code(aeb::deps::not_installed))]
    NotInstalled { id: String },

    #[error("{message}")]
    #[diagnostic(code(aeb::deps::requirement_not_met))]
    RequirementNotMet { message: String },

    #[error("An installed extension [{name}] is incompatible")]
    #[diagnostic(code(aeb::deps::incompatible))]
    Incompatible { name: String },

    #[error("Another extension [{name}] requires this extension. Remove the other first.")]
    #[diagnostic(code(aeb::deps::required_by))]
    RequiredBy { name: String },

    // Transaction errors
    #[error("Unable to install a file from the extension: {message}")]
    #[diagnostic(code(aeb::transaction::failed))]
    TransactionFailed { message: String },

    #[error("An unresolved transaction log exists at {path}")]
    #[diagnostic(
        code(aeb::transaction::unresolved_log),
        help("A previous install did not finish. Run 'aeb process-pending' to recover")
    )]
    UnresolvedLog { path: String },

    #[error("Invalid transaction log {path}: {reason}")]
    #[diagnostic(code(aeb::transaction::invalid_log))]
    InvalidLog { path: String, reason: String },

    #[error("Reference count database error: {message}")]
    #[diagnostic(code(aeb::transaction::refcount))]
    RefCountDatabase { message: String },

    #[error("Installation is in an indeterminate state: {message}")]
    #[diagnostic(
        code(aeb::transaction::indeterminate),
        severity(Error),
        help("Rolling back failed part way. Check write permission on the application directories and repair manually")
    )]
    IndeterminateState { message: String },

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    #[diagnostic(code(aeb::config::not_found))]
    ConfigNotFound { path: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(aeb::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(aeb::config::invalid))]
    ConfigInvalid { message: String },

    // File system errors
    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(aeb::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(aeb::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(aeb::fs::io_error))]
    IoError { message: String },

    #[error("Archive error: {message}")]
    #[diagnostic(code(aeb::fs::archive))]
    Archive { message: String },
}

impl AebError {
    /// Whether the error leaves the installation in a state that needs manual repair
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, AebError::IndeterminateState { .. })
    }
}

impl From<std::io::Error> for AebError {
    fn from(err: std::io::Error) -> Self {
        AebError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for AebError {
    fn from(err: serde_yaml::Error) -> Self {
        AebError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AebError {
    fn from(err: serde_json::Error) -> Self {
        AebError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for AebError {
    fn from(err: zip::result::ZipError) -> Self {
        AebError::Archive {
            message: err.to_string(),
        }
    }
}

impl From<inquire::InquireError> for AebError {
    fn from(err: inquire::InquireError) -> Self {
        AebError::IoError {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, AebError>;
