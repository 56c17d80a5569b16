//! PFV Upgrade
//!
//! Rewrites a raw profile document captured at any historical schema
//! version into [`FormatVersion::CURRENT`], the only version the rest of the
//! viewer reads.
//!
//! # Core Operations
//!
//! - **Ledger**: read the declared version ([`declared_version`])
//! - **Steps**: one [`UpgradeStep`] per target version, applied in order
//! - **Libraries**: legacy descriptor lists become sorted [`pfv_format::LibraryRecord`]s
//! - **Subprocesses**: embedded child profiles get the same rewrite, recursively
//!
//! # Architecture
//!
//! ```text
//! raw JSON → declared_version → UpgradeStep(v+1) → … → UpgradeStep(CURRENT) → stamp meta.version
//!                                     │
//!                     LibraryNormalizer + subprocess walker
//! ```
//!
//! # Example
//!
//! ```rust
//! use pfv_upgrade::{migrate, UpgradeError};
//! use serde_json::json;
//!
//! let mut doc = json!({
//!     "meta": { "version": 3, "abi": "x86_64-gcc3" },
//!     "libs": "[{\"name\":\"/lib/libc.so\",\"breakpadId\":\"ABC0\",\"start\":4096}]",
//!     "threads": [{ "name": "Content" }]
//! });
//! migrate(&mut doc)?;
//!
//! assert_eq!(doc["meta"]["version"], 4);
//! assert_eq!(doc["libs"][0]["arch"], "x86_64");
//! assert_eq!(doc["threads"][0]["processType"], "tab");
//! # Ok::<(), UpgradeError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod libraries;
pub mod options;
pub mod steps;

mod driver;
mod subprocess;

pub use driver::{migrate, migrate_with, needs_upgrade, upgrade_str, upgrade_to_profile, UpgradeReport};
pub use error::{UpgradeError, UpgradeResult};
pub use libraries::{arch_from_abi, breakpad_id_from_pdb, LibraryNormalizer};
pub use options::UpgradeOptions;
pub use pfv_format::{current_version, declared_version, FormatVersion};
pub use steps::{backfill_process_type, UpgradeStep};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for upgrading profiles
    pub use crate::driver::{migrate, migrate_with, upgrade_to_profile, UpgradeReport};
    pub use crate::error::{UpgradeError, UpgradeResult};
    pub use crate::options::UpgradeOptions;
    pub use pfv_format::{FormatVersion, Profile};
}
