//! Domain models for the extension installer
//!
//! This module contains pure value types: identifiers, versions, version
//! requirements, and the host platform and application they are checked
//! against.

pub mod identifier;
pub mod platform;
pub mod requirement;
pub mod version;

pub use identifier::Identifier;
pub use platform::Platform;
pub use requirement::Requirement;
pub use version::Version;

/// Identity of the host application extensions are installed into
#[derive(Debug, Clone)]
pub struct HostApplication {
    pub id: Identifier,
    pub version: Version,
    pub platform: Platform,
}

impl HostApplication {
    /// Whether an applicability filter selects this host
    ///
    /// `None` applies to every host.
    pub fn is_selected_by(&self, filter: Option<&Requirement>) -> bool {
        filter.is_none_or(|f| f.matches(&self.id, &self.version))
    }
}
