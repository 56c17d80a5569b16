//! Error types for profile upgrades
//!
//! Every failure is terminal for the upgrade attempt: the input is a fixed
//! document, so retrying without a code change cannot succeed. Callers are
//! expected to surface the message as a load failure and discard the
//! document.

use pfv_format::{DescriptorError, FormatVersion};

/// Errors during a profile upgrade
#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    /// Document was written by a newer producer than this build understands
    #[error(
        "unable to read a profile of format version {found}: the most recent version \
         this viewer understands is {current}; a newer viewer is required"
    )]
    TooNew {
        /// Version declared by the document
        found: FormatVersion,
        /// Version this build upgrades to
        current: FormatVersion,
    },

    /// No conversion was ever written out of this historical version
    #[error(
        "profile format version {} is too old to be upgraded: no conversion \
         to version {to} exists",
        version_label(.from)
    )]
    LegacyUnsupported {
        /// Version the document is at
        from: FormatVersion,
        /// Version the missing conversion would produce
        to: FormatVersion,
    },

    /// Library metadata matches neither legacy descriptor shape
    #[error("malformed library descriptor #{index}: {source}")]
    MalformedDescriptor {
        /// Position in the document's library list
        index: usize,
        /// What was wrong with it
        #[source]
        source: DescriptorError,
    },

    /// Document structure does not match the schema of its declared version
    #[error("malformed profile document: {0}")]
    MalformedDocument(String),
}

impl UpgradeError {
    /// Create too-new error
    #[inline]
    #[must_use]
    pub fn too_new(found: FormatVersion) -> Self {
        Self::TooNew {
            found,
            current: FormatVersion::CURRENT,
        }
    }

    /// Create legacy-unsupported error for the step out of `from`
    #[inline]
    #[must_use]
    pub fn legacy_unsupported(from: FormatVersion) -> Self {
        Self::LegacyUnsupported {
            from,
            to: from.next(),
        }
    }

    /// Create malformed-document error
    #[inline]
    pub fn malformed_document(reason: impl std::fmt::Display) -> Self {
        Self::MalformedDocument(reason.to_string())
    }

    /// Check if the document needs a newer viewer
    #[inline]
    #[must_use]
    pub fn is_too_new(&self) -> bool {
        matches!(self, Self::TooNew { .. })
    }

    /// Check if the document predates supported history
    #[inline]
    #[must_use]
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::LegacyUnsupported { .. })
    }

    /// Check if the document is internally inconsistent
    #[inline]
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedDescriptor { .. } | Self::MalformedDocument(_)
        )
    }
}

fn version_label(version: &FormatVersion) -> String {
    if version.is_unannotated() {
        format!("{version} (unversioned)")
    } else {
        version.to_string()
    }
}

/// Result type alias for upgrade operations
pub type UpgradeResult<T> = Result<T, UpgradeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pfv_format::DescriptorKind;

    #[test]
    fn too_new_display_names_both_versions() {
        let err = UpgradeError::too_new(FormatVersion::new(7));
        let message = err.to_string();
        assert!(message.contains("format version 7"));
        assert!(message.contains("understands is 4"));
        assert!(err.is_too_new());
    }

    #[test]
    fn legacy_display_names_source_version() {
        let err = UpgradeError::legacy_unsupported(FormatVersion::new(1));
        assert_eq!(
            err.to_string(),
            "profile format version 1 is too old to be upgraded: no conversion to version 2 exists"
        );
        assert!(err.is_legacy());
    }

    #[test]
    fn legacy_display_marks_unversioned() {
        let err = UpgradeError::legacy_unsupported(FormatVersion::UNANNOTATED);
        assert!(err.to_string().starts_with("profile format version 0 (unversioned)"));
    }

    #[test]
    fn descriptor_error_display() {
        let err = UpgradeError::MalformedDescriptor {
            index: 3,
            source: DescriptorError::MissingField {
                kind: DescriptorKind::Pdb,
                field: "pdbAge",
            },
        };
        assert_eq!(
            err.to_string(),
            "malformed library descriptor #3: pdb descriptor is missing required field 'pdbAge'"
        );
        assert!(err.is_malformed());
    }
}
