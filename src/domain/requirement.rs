//! Version range requirements

use std::fmt;

use super::{Identifier, Version};

/// An identifier plus an inclusive version range
///
/// A requirement is only valid when all three parts are. Construction with
/// any invalid part yields the canonical invalid requirement, which never
/// [`meets`](Requirement::meets) anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Requirement {
    id: Identifier,
    min: Version,
    max: Version,
}

impl Requirement {
    pub fn new(id: Identifier, min: Version, max: Version) -> Self {
        if id.is_valid() && min.is_valid() && max.is_valid() {
            Self { id, min, max }
        } else {
            Self::default()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.id.is_valid()
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn min(&self) -> &Version {
        &self.min
    }

    pub fn max(&self) -> &Version {
        &self.max
    }

    /// Whether `version` lies within `[min, max]`
    pub fn meets(&self, version: &Version) -> bool {
        self.is_valid() && self.min <= *version && *version <= self.max
    }

    /// Whether `id` at `version` satisfies this requirement
    pub fn matches(&self, id: &Identifier, version: &Version) -> bool {
        self.id == *id && self.meets(version)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{} [{}, {}]", self.id, self.min, self.max)
        } else {
            f.write_str("<invalid requirement>")
        }
    }
}
