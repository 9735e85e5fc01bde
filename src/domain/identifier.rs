//! Extension identifiers
//!
//! An identifier is either email shaped (`viewer@example.com`) or a UUID
//! (`{8d2f...}`). Identifiers are lower-cased and UUID braces are stripped so
//! that two spellings of the same id compare equal.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use uuid::Uuid;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^[a-z0-9\-._]*@[a-z0-9\-._]+$").unwrap()
    })
}

/// Normalized extension identifier
///
/// Invalid input produces the invalid identifier, whose string form is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        if email_pattern().is_match(&lowered) {
            return Self(lowered);
        }

        let unbraced = lowered
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .unwrap_or(&lowered);
        // Only the canonical hyphenated layout is accepted.
        if unbraced.len() == 36 {
            if let Ok(uuid) = Uuid::try_parse(unbraced) {
                return Self(uuid.hyphenated().to_string());
            }
        }

        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
