//! Library list normalization
//!
//! Turns the legacy JSON-encoded descriptor list into uniform
//! [`LibraryRecord`]s sorted by load address.

use crate::error::{UpgradeError, UpgradeResult};
use pfv_format::{DescriptorError, LegacyLibraryDescriptor, LibraryRecord};
use serde_json::Value;

/// Map a platform ABI token to an architecture tag
///
/// Only `x86_64-gcc3` is rewritten; every other token passes through.
#[inline]
#[must_use]
pub fn arch_from_abi(abi: &str) -> &str {
    match abi {
        "x86_64-gcc3" => "x86_64",
        other => other,
    }
}

/// Derive a breakpad identifier from Windows PDB identity fields
///
/// Braces and hyphens are dropped from the signature, the rest is
/// uppercased, and the age is appended as text.
#[must_use]
pub fn breakpad_id_from_pdb(signature: &str, age: &str) -> String {
    let mut id = signature
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '-'))
        .collect::<String>()
        .to_uppercase();
    id.push_str(age);
    id
}

/// Keys of [`LibraryRecord`] that are computed, never carried over
const RECORD_FIELDS: [&str; 6] = ["start", "debugName", "breakpadId", "path", "name", "arch"];

/// Normalizes legacy library descriptors for one document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LibraryNormalizer {
    arch: Option<String>,
}

impl LibraryNormalizer {
    /// Create normalizer for a document with the given `meta.abi`
    #[must_use]
    pub fn for_abi(abi: Option<&str>) -> Self {
        Self {
            arch: abi.map(|abi| arch_from_abi(abi).to_string()),
        }
    }

    /// Architecture tag stamped on every record
    #[inline]
    #[must_use]
    pub fn arch(&self) -> Option<&str> {
        self.arch.as_deref()
    }

    /// Convert one classified descriptor
    #[must_use]
    pub fn normalize(&self, descriptor: LegacyLibraryDescriptor) -> LibraryRecord {
        let (path, debug_name, breakpad_id, start, mut extra) = match descriptor {
            LegacyLibraryDescriptor::Breakpad {
                name,
                breakpad_id,
                start,
                extra,
            } => {
                let debug_name = file_name(&name).to_string();
                (name, debug_name, breakpad_id, start, extra)
            }
            LegacyLibraryDescriptor::Pdb {
                name,
                pdb_name,
                pdb_signature,
                pdb_age,
                start,
                extra,
            } => {
                let breakpad_id = breakpad_id_from_pdb(&pdb_signature, &pdb_age);
                (name, pdb_name, breakpad_id, start, extra)
            }
        };

        // derived fields win over stale copies left in the legacy entry
        for field in RECORD_FIELDS {
            extra.shift_remove(field);
        }

        let name = debug_name
            .strip_suffix(".pdb")
            .unwrap_or(&debug_name)
            .to_string();

        LibraryRecord {
            start,
            debug_name,
            breakpad_id,
            path,
            name,
            arch: self.arch.clone(),
            extra,
        }
    }

    /// Classify and convert one raw descriptor
    ///
    /// # Errors
    /// Returns error if the entry matches neither legacy shape
    pub fn normalize_raw(&self, raw: Value) -> Result<LibraryRecord, DescriptorError> {
        LegacyLibraryDescriptor::try_from(raw).map(|descriptor| self.normalize(descriptor))
    }

    /// Parse a JSON-encoded descriptor list and normalize every entry
    ///
    /// The result is stably sorted by `start`: entries with equal load
    /// addresses keep their original relative order.
    ///
    /// # Errors
    /// - [`UpgradeError::MalformedDocument`] if `libs` is not a JSON array
    /// - [`UpgradeError::MalformedDescriptor`] for the first bad entry
    pub fn normalize_all(&self, libs: &str) -> UpgradeResult<Vec<LibraryRecord>> {
        let entries: Vec<Value> = serde_json::from_str(libs).map_err(|e| {
            UpgradeError::malformed_document(format!("libs is not a JSON array: {e}"))
        })?;

        let mut records = entries
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                self.normalize_raw(raw)
                    .map_err(|source| UpgradeError::MalformedDescriptor { index, source })
            })
            .collect::<UpgradeResult<Vec<_>>>()?;

        records.sort_by_key(|record| record.start);
        Ok(records)
    }
}

/// Final `/`-separated segment of a module path
fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, tail)| tail)
}
