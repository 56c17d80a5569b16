//! Current-schema profile shapes
//!
//! These are the shapes every upgraded document has. Only the fields the
//! upgrader reads or writes are typed; the rest ride along in `extra`.

use crate::slot::{deserialize_slots, ThreadSlot};
use crate::version::FormatVersion;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Profile document in the current schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Document metadata
    pub meta: ProfileMeta,
    /// Shared libraries, sorted ascending by load address
    pub libs: Vec<LibraryRecord>,
    /// Threads of this process and embedded subprocess profiles
    #[serde(deserialize_with = "deserialize_slots")]
    pub threads: Vec<ThreadSlot<Thread>>,
    /// Untyped top-level fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    /// Check the library ordering invariant for this document
    ///
    /// Embedded subprocess documents are not inspected.
    #[must_use]
    pub fn libs_sorted(&self) -> bool {
        self.libs.windows(2).all(|pair| pair[0].start <= pair[1].start)
    }

    /// Iterate over thread records, skipping embedded subprocess slots
    pub fn thread_records(&self) -> impl Iterator<Item = &Thread> {
        self.threads.iter().filter_map(ThreadSlot::as_record)
    }
}

/// `meta` block shared by every schema version
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileMeta {
    /// Declared schema version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<FormatVersion>,
    /// Platform ABI token of the capturing build, e.g. `x86_64-gcc3`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<String>,
    /// Untyped metadata fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalized shared-library record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryRecord {
    /// Load address
    #[serde(default)]
    pub start: u64,
    /// File name of the debug information file
    pub debug_name: String,
    /// Normalized debug identifier
    pub breakpad_id: String,
    /// Full path of the module as recorded
    pub path: String,
    /// Display name
    pub name: String,
    /// Normalized architecture tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    /// Untyped fields such as `end` and `offset`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Thread record in the current schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    /// Thread name
    pub name: String,
    /// Kind of process the thread belongs to
    pub process_type: ProcessType,
    /// Untyped fields (samples, markers, string tables, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Kind of process a thread was sampled in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProcessType {
    /// Content (tab) process
    Tab,
    /// Plugin container process
    Plugin,
    /// Parent process
    Default,
    /// Any other kind the capturing tool reports
    Other(String),
}

impl ProcessType {
    /// Wire name of this process type
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Tab => "tab",
            Self::Plugin => "plugin",
            Self::Default => "default",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for ProcessType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "tab" => Self::Tab,
            "plugin" => Self::Plugin,
            "default" => Self::Default,
            _ => Self::Other(name),
        }
    }
}

impl From<ProcessType> for String {
    fn from(process_type: ProcessType) -> Self {
        match process_type {
            ProcessType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ProcessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
