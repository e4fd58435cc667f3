use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedVersionError {
    #[error("version {raw:?} has {found} components, expected 3")]
    ComponentCount { raw: String, found: usize },
    #[error("version {raw:?} has a non-numeric component {segment:?}")]
    NonNumeric { raw: String, segment: String },
}

/// A `MAJOR.MINOR.PATCH` triple. Pre-release and build metadata are not
/// part of the accepted grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionVector {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl VersionVector {
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a dotted `MAJOR.MINOR.PATCH` string.
    ///
    /// # Errors
    /// Returns an error unless the input is exactly three dot-separated runs
    /// of ASCII digits.
    pub fn parse(raw: &str) -> Result<Self, MalformedVersionError> {
        let segments: Vec<&str> = raw.split('.').collect();
        if segments.len() != 3 {
            return Err(MalformedVersionError::ComponentCount {
                raw: raw.to_string(),
                found: segments.len(),
            });
        }

        let mut components = [0u64; 3];
        for (slot, segment) in components.iter_mut().zip(&segments) {
            *slot = parse_component(segment).ok_or_else(|| MalformedVersionError::NonNumeric {
                raw: raw.to_string(),
                segment: (*segment).to_string(),
            })?;
        }

        let [major, minor, patch] = components;
        Ok(Self::new(major, minor, patch))
    }

    /// Parse a release tag such as `v2.3.1`. The leading `v` is optional.
    ///
    /// # Errors
    /// See [`VersionVector::parse`].
    pub fn parse_tag(tag: &str) -> Result<Self, MalformedVersionError> {
        Self::parse(tag.strip_prefix('v').unwrap_or(tag))
    }

    #[must_use]
    pub const fn components(self) -> [u64; 3] {
        [self.major, self.minor, self.patch]
    }
}

// `u64::from_str` accepts a leading `+`.
fn parse_component(segment: &str) -> Option<u64> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

impl FromStr for VersionVector {
    type Err = MalformedVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Returns `true` when `candidate` takes precedence over `current`.
///
/// Components are compared in major, minor, patch order and the first
/// difference decides. Equal versions are not newer.
#[must_use]
pub fn is_newer(current: VersionVector, candidate: VersionVector) -> bool {
    for (now, new) in current.components().into_iter().zip(candidate.components()) {
        match new.cmp(&now) {
            Ordering::Greater => return true,
            Ordering::Less => return false,
            Ordering::Equal => {}
        }
    }
    false
}
