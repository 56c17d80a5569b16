//! Format version ledger
//!
//! Every profile records its schema version in `meta.version`. Profiles
//! written before the tag existed carry nothing there and are read as
//! [`FormatVersion::UNANNOTATED`].

use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Schema version of a raw profile document
///
/// Ordered by the natural integer order; a larger number is a newer schema.
/// Deserializes from the same tags [`declared_version`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FormatVersion(u64);

impl<'de> Deserialize<'de> for FormatVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = Value::deserialize(deserializer)?;
        Self::from_tag(&tag).ok_or_else(|| {
            de::Error::custom(format!(
                "invalid format version {tag}: expected a non-negative whole number"
            ))
        })
    }
}

impl FormatVersion {
    /// Version assumed for documents without a version tag
    pub const UNANNOTATED: Self = Self(0);

    /// The only version consumers downstream of the upgrader understand
    pub const CURRENT: Self = Self(4);

    /// Create from a raw version number
    #[inline]
    #[must_use]
    pub const fn new(version: u64) -> Self {
        Self(version)
    }

    /// Raw version number
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The version directly after this one
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Whether this is the version assigned to untagged documents
    #[inline]
    #[must_use]
    pub const fn is_unannotated(self) -> bool {
        self.0 == Self::UNANNOTATED.0
    }

    /// Whether this is [`FormatVersion::CURRENT`]
    #[inline]
    #[must_use]
    pub const fn is_current(self) -> bool {
        self.0 == Self::CURRENT.0
    }

    /// Read a `meta.version` tag
    ///
    /// Integers are taken as is. Some writers emit whole numbers as floats
    /// (`3.0`), so those are accepted too.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn from_tag(tag: &Value) -> Option<Self> {
        if let Some(version) = tag.as_u64() {
            return Some(Self(version));
        }
        match tag.as_f64() {
            Some(v) if v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => Some(Self(v as u64)),
            _ => None,
        }
    }

    /// Every version in the half-open interval `(self, target]`, ascending
    ///
    /// Empty when `target <= self`.
    pub fn steps_to(self, target: Self) -> impl Iterator<Item = FormatVersion> {
        (self.0.saturating_add(1)..=target.0).map(Self)
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for FormatVersion {
    fn from(version: u64) -> Self {
        Self(version)
    }
}

/// The version every upgrade targets
#[inline]
#[must_use]
pub const fn current_version() -> FormatVersion {
    FormatVersion::CURRENT
}

/// Version declared by a raw document
///
/// Reads `meta.version`. A missing tag, or one that is not a non-negative
/// whole number, yields [`FormatVersion::UNANNOTATED`].
#[must_use]
pub fn declared_version(doc: &Value) -> FormatVersion {
    doc.get("meta")
        .and_then(|meta| meta.get("version"))
        .and_then(FormatVersion::from_tag)
        .unwrap_or(FormatVersion::UNANNOTATED)
}
