//! Host platform identifiers
//!
//! Bundles carry platform specific content under `platform/<id>/` and may
//! restrict themselves with `targetPlatform` entries. The id has the form
//! `<os>-<arch>`, e.g. `linux-x86_64` or `windows-aarch64`.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Platform(String);

impl Platform {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().to_lowercase())
    }

    /// Platform this binary was built for
    pub fn current() -> Self {
        Self::new(format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a manifest's `targetPlatform` value names this platform
    pub fn accepts(&self, target: &str) -> bool {
        target.trim().eq_ignore_ascii_case(&self.0)
    }

    /// Archive and directory prefix of this platform's content
    pub fn content_prefix(&self) -> String {
        format!("platform/{}", self.as_str())
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_platform_shape() {
        let platform = Platform::current();
        assert!(platform.as_str().contains('-'));
        assert_eq!(platform.as_str(), platform.as_str().to_lowercase());
    }

    #[test]
    fn test_accepts_is_case_insensitive() {
        let platform = Platform::new("Linux-x86_64");
        assert!(platform.accepts("linux-X86_64"));
        assert!(!platform.accepts("windows-x86_64"));
    }

    #[test]
    fn test_content_prefix() {
        assert_eq!(
            Platform::new("linux-x86_64").content_prefix(),
            "platform/linux-x86_64"
        );
    }
}
