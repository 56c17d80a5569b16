//! Legacy profile shapes
//!
//! Before version 4 the library list was stored as a JSON *string* inside
//! the profile, each entry in one of two shapes depending on the platform
//! that captured it, and threads did not record which kind of process they
//! came from.

use crate::profile::ProcessType;
use crate::slot::{deserialize_slots, ThreadSlot};
use crate::ProfileMeta;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Profile document from before structured library lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyProfile {
    /// Document metadata
    pub meta: ProfileMeta,
    /// JSON-encoded array of library descriptors
    pub libs: String,
    /// Threads of this process and embedded subprocess profiles
    #[serde(deserialize_with = "deserialize_slots")]
    pub threads: Vec<ThreadSlot<LegacyThread>>,
    /// Untyped top-level fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Thread record that may predate `processType`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyThread {
    /// Thread name
    pub name: String,
    /// Kind of process, when the capturing tool already recorded it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_type: Option<ProcessType>,
    /// Untyped fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Which legacy descriptor shape an entry has
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    /// Carries `breakpadId` directly
    Breakpad,
    /// Carries Windows PDB identity fields
    Pdb,
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Breakpad => f.write_str("breakpad"),
            Self::Pdb => f.write_str("pdb"),
        }
    }
}

/// Errors classifying a legacy library descriptor
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    /// Entry of the library array is not an object
    #[error("library descriptor is not an object")]
    NotAnObject,

    /// Field required by the detected shape is absent
    #[error("{kind} descriptor is missing required field '{field}'")]
    MissingField {
        /// Detected shape
        kind: DescriptorKind,
        /// Field name
        field: &'static str,
    },

    /// Field is present but has the wrong JSON type
    #[error("{kind} descriptor field '{field}' must be {expected}")]
    InvalidField {
        /// Detected shape
        kind: DescriptorKind,
        /// Field name
        field: &'static str,
        /// Expected JSON type
        expected: &'static str,
    },
}

/// One entry of a legacy `libs` array
///
/// The shape is decided by whether a `breakpadId` field is present.
#[derive(Debug, Clone, PartialEq)]
pub enum LegacyLibraryDescriptor {
    /// Entry that already carries a breakpad identifier
    Breakpad {
        /// Full module path
        name: String,
        /// Debug identifier
        breakpad_id: String,
        /// Load address
        start: u64,
        /// Remaining fields
        extra: Map<String, Value>,
    },
    /// Windows entry identified by its PDB
    Pdb {
        /// Full module path
        name: String,
        /// PDB file name
        pdb_name: String,
        /// PDB GUID, usually braced and hyphenated
        pdb_signature: String,
        /// PDB age, as text
        pdb_age: String,
        /// Load address
        start: u64,
        /// Remaining fields
        extra: Map<String, Value>,
    },
}

impl LegacyLibraryDescriptor {
    /// Shape of this descriptor
    #[must_use]
    pub fn kind(&self) -> DescriptorKind {
        match self {
            Self::Breakpad { .. } => DescriptorKind::Breakpad,
            Self::Pdb { .. } => DescriptorKind::Pdb,
        }
    }

    /// Load address
    #[must_use]
    pub fn start(&self) -> u64 {
        match self {
            Self::Breakpad { start, .. } | Self::Pdb { start, .. } => *start,
        }
    }
}

impl TryFrom<Map<String, Value>> for LegacyLibraryDescriptor {
    type Error = DescriptorError;

    fn try_from(mut fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let kind = if fields.contains_key("breakpadId") {
            DescriptorKind::Breakpad
        } else {
            DescriptorKind::Pdb
        };

        let name = take_string(&mut fields, kind, "name")?;
        let start = take_address(&mut fields, kind, "start")?;

        match kind {
            DescriptorKind::Breakpad => {
                let breakpad_id = take_string(&mut fields, kind, "breakpadId")?;
                Ok(Self::Breakpad {
                    name,
                    breakpad_id,
                    start,
                    extra: fields,
                })
            }
            DescriptorKind::Pdb => {
                let pdb_name = take_string(&mut fields, kind, "pdbName")?;
                let pdb_signature = take_string(&mut fields, kind, "pdbSignature")?;
                let pdb_age = take_text(&mut fields, kind, "pdbAge")?;
                Ok(Self::Pdb {
                    name,
                    pdb_name,
                    pdb_signature,
                    pdb_age,
                    start,
                    extra: fields,
                })
            }
        }
    }
}

impl TryFrom<Value> for LegacyLibraryDescriptor {
    type Error = DescriptorError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Self::try_from(fields),
            _ => Err(DescriptorError::NotAnObject),
        }
    }
}

fn take_string(
    fields: &mut Map<String, Value>,
    kind: DescriptorKind,
    field: &'static str,
) -> Result<String, DescriptorError> {
    match fields.shift_remove(field) {
        Some(Value::String(text)) => Ok(text),
        Some(_) => Err(DescriptorError::InvalidField {
            kind,
            field,
            expected: "a string",
        }),
        None => Err(DescriptorError::MissingField { kind, field }),
    }
}

/// Like [`take_string`], but numbers are accepted and rendered as text
fn take_text(
    fields: &mut Map<String, Value>,
    kind: DescriptorKind,
    field: &'static str,
) -> Result<String, DescriptorError> {
    match fields.shift_remove(field) {
        Some(Value::String(text)) => Ok(text),
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(_) => Err(DescriptorError::InvalidField {
            kind,
            field,
            expected: "a string or number",
        }),
        None => Err(DescriptorError::MissingField { kind, field }),
    }
}

/// Missing addresses read as zero
fn take_address(
    fields: &mut Map<String, Value>,
    kind: DescriptorKind,
    field: &'static str,
) -> Result<u64, DescriptorError> {
    match fields.shift_remove(field) {
        None => Ok(0),
        Some(value) => value.as_u64().ok_or(DescriptorError::InvalidField {
            kind,
            field,
            expected: "a non-negative integer",
        }),
    }
}
