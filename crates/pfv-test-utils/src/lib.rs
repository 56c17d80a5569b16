//! Testing utilities for PFV workspace
//!
//! Shared builders for raw profile documents at legacy and current versions.

#![allow(missing_docs)]

use pfv_format::FormatVersion;
use serde_json::{json, Value};

/// PDB signature used by every [`pdb_lib`] fixture
pub const PDB_SIGNATURE: &str = "{ABCDEF12-3456-7890-ABCD-EF1234567890}";
/// Breakpad identifier derived from [`PDB_SIGNATURE`] with age `1`
pub const PDB_BREAKPAD_ID: &str = "ABCDEF1234567890ABCDEF12345678901";

pub fn breakpad_lib(name: &str, breakpad_id: &str, start: u64) -> Value {
    json!({
        "name": name,
        "breakpadId": breakpad_id,
        "start": start,
        "end": start + 0x1000,
        "offset": 0
    })
}

pub fn pdb_lib(name: &str, pdb_name: &str, pdb_age: &str, start: u64) -> Value {
    json!({
        "name": name,
        "pdbName": pdb_name,
        "pdbSignature": PDB_SIGNATURE,
        "pdbAge": pdb_age,
        "start": start,
        "end": start + 0x1000,
        "offset": 0
    })
}

pub fn legacy_thread(name: &str) -> Value {
    json!({
        "name": name,
        "samples": {"schema": {"stack": 0, "time": 1}, "data": [[0, 1.5]]},
        "markers": {"schema": {"name": 0, "time": 1}, "data": []}
    })
}

/// Legacy document with `libs` encoded as a JSON string
pub fn legacy_profile(version: u64, abi: &str, libs: Vec<Value>, threads: Vec<Value>) -> Value {
    json!({
        "meta": {
            "version": version,
            "abi": abi,
            "interval": 1,
            "startTime": 1_460_221_352_723.438_f64
        },
        "libs": Value::Array(libs).to_string(),
        "threads": threads
    })
}

/// Thread slot holding `profile` serialized, as the capturing tool embeds
/// subprocess profiles
pub fn embedded(profile: &Value) -> Value {
    Value::String(profile.to_string())
}

/// Version 3 parent with one embedded version 3 subprocess
pub fn parent_with_subprocess() -> Value {
    let child = legacy_profile(
        3,
        "x86_64-gcc3",
        vec![
            breakpad_lib("/usr/lib/libxul.so", "XUL0", 0x7000),
            breakpad_lib("/usr/lib/libc.so.6", "LIBC0", 0x1000),
        ],
        vec![legacy_thread("Content"), legacy_thread("Compositor")],
    );

    legacy_profile(
        3,
        "x86-msvc",
        vec![
            pdb_lib("C:\\Program Files\\Mozilla Firefox\\xul.dll", "xul.pdb", "1", 0x6000_0000),
            pdb_lib("C:\\Windows\\System32\\ntdll.dll", "ntdll.pdb", "2", 0x1000_0000),
        ],
        vec![
            legacy_thread("GeckoMain"),
            embedded(&child),
            legacy_thread("Plugin"),
        ],
    )
}

/// Document already at the current version
pub fn current_profile() -> Value {
    json!({
        "meta": {
            "version": FormatVersion::CURRENT.get(),
            "abi": "x86_64-gcc3",
            "interval": 1
        },
        "libs": [{
            "start": 4096,
            "debugName": "libxul.so",
            "breakpadId": "XUL0",
            "path": "/usr/lib/libxul.so",
            "name": "libxul.so",
            "arch": "x86_64",
            "end": 8192,
            "offset": 0
        }],
        "threads": [{"name": "GeckoMain", "processType": "default", "samples": {"data": []}}]
    })
}
