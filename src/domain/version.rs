//! Extension versions
//!
//! A version is a `.` separated list of segments. Every segment holds up to
//! four slots in a fixed order: number, letters, number, letters, e.g.
//! `1.5b2pre`. Any slot may be the wildcard `*`.
//!
//! Two relations are defined:
//! - [`Version::compare`] is a total order. Absent slots count as `0` or the
//!   empty string, and a wildcard sorts above every concrete value.
//! - `==` is the matching relation used by requirements: a wildcard slot
//!   matches whatever the other side holds, so `1.*` equals both `1.5` and
//!   `1.7`. It is not transitive.
//!
//! Slots are compared strictly left to right, so `1.*a` sorts above `1.5`
//! (decided by `*` against `5`) but does not equal it (`a` against nothing).
//!
//! Both relations fill absent slots and segments with their defaults before
//! comparing. `1`, `1.0` and `1.0.0` are therefore equal, even though they do
//! not hold the same set of slots; equality never requires both sides to
//! spell out the same slots.

use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

fn segment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^(\d+|\*)?([A-Za-z_+\-]+|\*)?(\d+|\*)?([A-Za-z_+\-]+|\*)?$").unwrap()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Number {
    Value(u64),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Alpha {
    Value(String),
    Wildcard,
}

/// Ordering of two slots where the wildcard is the largest value
fn slot_order<T: Ord>(a: Option<&T>, b: Option<&T>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.cmp(b),
    }
}

impl Number {
    /// `None` stands for the wildcard
    fn concrete(slot: Option<&Number>) -> Option<u64> {
        match slot {
            None => Some(0),
            Some(Number::Value(n)) => Some(*n),
            Some(Number::Wildcard) => None,
        }
    }
}

impl Alpha {
    fn concrete(slot: Option<&Alpha>) -> Option<&str> {
        match slot {
            None => Some(""),
            Some(Alpha::Value(s)) => Some(s.as_str()),
            Some(Alpha::Wildcard) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Segment {
    first: Option<Number>,
    second: Option<Alpha>,
    third: Option<Number>,
    fourth: Option<Alpha>,
}

impl Segment {
    fn parse(part: &str) -> Option<Self> {
        if part.is_empty() {
            return None;
        }
        let caps = segment_pattern().captures(part)?;
        let number = |idx: usize| -> Option<Option<Number>> {
            match caps.get(idx).map(|m| m.as_str()) {
                None => Some(None),
                Some("*") => Some(Some(Number::Wildcard)),
                Some(digits) => digits.parse().ok().map(|n| Some(Number::Value(n))),
            }
        };
        let alpha = |idx: usize| -> Option<Alpha> {
            caps.get(idx).map(|m| match m.as_str() {
                "*" => Alpha::Wildcard,
                s => Alpha::Value(s.to_string()),
            })
        };
        Some(Self {
            first: number(1)?,
            second: alpha(2),
            third: number(3)?,
            fourth: alpha(4),
        })
    }

    fn compare(&self, other: &Self) -> Ordering {
        let num = |a: Option<&Number>, b: Option<&Number>| {
            slot_order(Number::concrete(a).as_ref(), Number::concrete(b).as_ref())
        };
        let alpha = |a: Option<&Alpha>, b: Option<&Alpha>| {
            slot_order(Alpha::concrete(a).as_ref(), Alpha::concrete(b).as_ref())
        };
        num(self.first.as_ref(), other.first.as_ref())
            .then_with(|| alpha(self.second.as_ref(), other.second.as_ref()))
            .then_with(|| num(self.third.as_ref(), other.third.as_ref()))
            .then_with(|| alpha(self.fourth.as_ref(), other.fourth.as_ref()))
    }

    fn matches(&self, other: &Self) -> bool {
        fn slot<T: PartialEq>(a: Option<T>, b: Option<T>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
        }
        slot(
            Number::concrete(self.first.as_ref()),
            Number::concrete(other.first.as_ref()),
        ) && slot(
            Alpha::concrete(self.second.as_ref()),
            Alpha::concrete(other.second.as_ref()),
        ) && slot(
            Number::concrete(self.third.as_ref()),
            Number::concrete(other.third.as_ref()),
        ) && slot(
            Alpha::concrete(self.fourth.as_ref()),
            Alpha::concrete(other.fourth.as_ref()),
        )
    }
}

/// Extension or application version
///
/// The default value is the invalid version, which sorts below every valid one.
#[derive(Debug, Clone, Default)]
pub struct Version {
    text: String,
    segments: Option<Vec<Segment>>,
}

impl Version {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Self::default();
        }
        let segments: Option<Vec<Segment>> = text.split('.').map(Segment::parse).collect();
        match segments {
            Some(segments) => Self {
                text: text.to_string(),
                segments: Some(segments),
            },
            None => Self::default(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.segments.is_some()
    }

    /// Total order over versions; an invalid version is the minimum
    pub fn compare(&self, other: &Self) -> Ordering {
        let (ours, theirs) = match (&self.segments, &other.segments) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => (a, b),
        };
        let missing = Segment::default();
        for i in 0..ours.len().max(theirs.len()) {
            let a = ours.get(i).unwrap_or(&missing);
            let b = theirs.get(i).unwrap_or(&missing);
            let order = a.compare(b);
            if order != Ordering::Equal {
                return order;
            }
        }
        Ordering::Equal
    }
}

impl From<&str> for Version {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        let (ours, theirs) = match (&self.segments, &other.segments) {
            (None, None) => return true,
            (Some(a), Some(b)) => (a, b),
            _ => return false,
        };
        let missing = Segment::default();
        (0..ours.len().max(theirs.len())).all(|i| {
            ours.get(i)
                .unwrap_or(&missing)
                .matches(theirs.get(i).unwrap_or(&missing))
        })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            Some(Ordering::Equal)
        } else {
            Some(self.compare(other))
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
