//! Upgrade driver
//!
//! Walks a raw document from its declared version up to
//! [`FormatVersion::CURRENT`], one registered step at a time.

use crate::error::{UpgradeError, UpgradeResult};
use crate::options::UpgradeOptions;
use crate::steps::{StepContext, UpgradeStep};
use pfv_format::{current_version, declared_version, FormatVersion, Profile};
use serde_json::Value;

/// Summary of one upgrade run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeReport {
    /// Version the document declared
    pub from: FormatVersion,
    /// Version the document ended at
    pub to: FormatVersion,
    /// Target versions whose step rewrote the document
    pub applied: Vec<FormatVersion>,
    /// Target versions with no registered step
    pub skipped: Vec<FormatVersion>,
    /// Embedded subprocess profiles rewritten along the way
    pub embedded_profiles: usize,
}

impl UpgradeReport {
    fn new(from: FormatVersion) -> Self {
        Self {
            from,
            to: current_version(),
            applied: Vec::new(),
            skipped: Vec::new(),
            embedded_profiles: 0,
        }
    }

    /// Check if the document was already current
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Upgrade a raw profile document in place with default options
///
/// A document already at [`FormatVersion::CURRENT`] is left exactly as it
/// was.
///
/// # Errors
/// - [`UpgradeError::TooNew`] if the document is newer than this build; the
///   document is not modified
/// - [`UpgradeError::LegacyUnsupported`] if the document predates the oldest
///   convertible version
/// - [`UpgradeError::MalformedDescriptor`] / [`UpgradeError::MalformedDocument`]
///   if the document does not match the schema of its version
///
/// On error the caller must discard the document.
pub fn migrate(doc: &mut Value) -> UpgradeResult<()> {
    migrate_with(doc, &UpgradeOptions::default()).map(|_| ())
}

/// Upgrade a raw profile document in place
///
/// # Errors
/// See [`migrate`].
pub fn migrate_with(doc: &mut Value, options: &UpgradeOptions) -> UpgradeResult<UpgradeReport> {
    let from = declared_version(doc);
    let current = current_version();
    let mut report = UpgradeReport::new(from);

    if from == current {
        tracing::debug!("Profile already at version {}", current);
        return Ok(report);
    }
    if from > current {
        return Err(UpgradeError::too_new(from));
    }

    tracing::info!("Upgrading profile from version {} to {}", from, current);

    let mut ctx = StepContext::new(options);
    for target in from.steps_to(current) {
        match UpgradeStep::for_target(target) {
            Some(step) => {
                tracing::debug!("Applying upgrade step to version {}", target);
                step.apply(doc, &mut ctx)?;
                report.applied.push(target);
            }
            None => {
                tracing::debug!("No upgrade step for version {}; skipping", target);
                report.skipped.push(target);
            }
        }
    }

    stamp_version(doc, current)?;
    report.embedded_profiles = ctx.embedded_profiles;

    tracing::info!(
        "Profile upgraded to version {} ({} steps, {} embedded subprocess profiles)",
        current,
        report.applied.len(),
        report.embedded_profiles
    );
    Ok(report)
}

/// Upgrade serialized profile text
///
/// # Errors
/// Returns [`UpgradeError::MalformedDocument`] if `text` is not JSON, and
/// otherwise the errors of [`migrate`].
pub fn upgrade_str(text: &str) -> UpgradeResult<String> {
    let mut doc: Value = serde_json::from_str(text)
        .map_err(|e| UpgradeError::malformed_document(format!("profile is not valid JSON: {e}")))?;
    migrate(&mut doc)?;
    serde_json::to_string(&doc).map_err(UpgradeError::malformed_document)
}

/// Upgrade a raw document and read it as a typed current-version profile
///
/// # Errors
/// Returns the errors of [`migrate`], or [`UpgradeError::MalformedDocument`]
/// if the upgraded document does not have the current shape.
pub fn upgrade_to_profile(mut doc: Value) -> UpgradeResult<Profile> {
    migrate(&mut doc)?;
    serde_json::from_value(doc).map_err(|e| {
        UpgradeError::malformed_document(format!("not a version {} profile: {e}", current_version()))
    })
}

/// Check if a document is older than the current version
#[inline]
#[must_use]
pub fn needs_upgrade(doc: &Value) -> bool {
    declared_version(doc) < current_version()
}

fn stamp_version(doc: &mut Value, version: FormatVersion) -> UpgradeResult<()> {
    let meta = doc
        .get_mut("meta")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| UpgradeError::malformed_document("profile has no meta object"))?;
    meta.insert("version".to_string(), Value::from(version.get()));
    Ok(())
}
