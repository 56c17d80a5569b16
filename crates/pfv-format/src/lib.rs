//! PFV Format
//!
//! Typed shapes of the raw profile document as written by the capturing
//! tool, at the schema versions the upgrader knows how to read.
//!
//! # Core Concepts
//!
//! - [`FormatVersion`]: schema version tag plus the ledger constants
//!   ([`FormatVersion::CURRENT`], [`FormatVersion::UNANNOTATED`])
//! - [`Profile`]: a document in the current schema
//! - [`LegacyProfile`]: a document from before library lists were structured
//! - [`ThreadSlot`]: a thread entry that is either a record or an embedded,
//!   still-serialized subprocess profile
//!
//! Fields the schema does not name are carried through untouched in each
//! type's `extra` map, so round-tripping a document never drops data.
//!
//! # Example
//!
//! ```rust
//! use pfv_format::{declared_version, FormatVersion};
//! use serde_json::json;
//!
//! let doc = json!({ "meta": { "version": 3 } });
//! assert_eq!(declared_version(&doc), FormatVersion::new(3));
//! assert!(declared_version(&json!({})).is_unannotated());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod legacy;
mod profile;
mod slot;
mod version;

pub use legacy::{DescriptorError, DescriptorKind, LegacyLibraryDescriptor, LegacyProfile, LegacyThread};
pub use profile::{LibraryRecord, ProcessType, Profile, ProfileMeta, Thread};
pub use slot::{EmbeddedProfile, ThreadSlot};
pub use version::{current_version, declared_version, FormatVersion};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
