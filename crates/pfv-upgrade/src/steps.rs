//! Upgrade steps
//!
//! Each step is keyed by the version it *produces*. The table is closed:
//! versions without an entry need no data changes and are skipped by the
//! driver.

use crate::error::{UpgradeError, UpgradeResult};
use crate::libraries::LibraryNormalizer;
use crate::options::UpgradeOptions;
use crate::subprocess;
use pfv_format::{FormatVersion, LegacyProfile, LegacyThread, ProcessType, Profile, Thread};
use serde::Deserialize;
use serde_json::Value;

/// One version transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpgradeStep {
    /// No conversion out of `from` was ever written; applying it always fails
    Unsupported {
        /// Version the conversion would start from
        from: FormatVersion,
    },
    /// 3 → 4: structured, address-sorted library list and a `processType`
    /// on every thread, applied through embedded subprocess profiles too
    StructuredLibraries,
}

impl UpgradeStep {
    /// Every registered step, ascending by target version
    pub const ALL: [UpgradeStep; 4] = [
        Self::Unsupported {
            from: FormatVersion::UNANNOTATED,
        },
        Self::Unsupported {
            from: FormatVersion::new(1),
        },
        Self::Unsupported {
            from: FormatVersion::new(2),
        },
        Self::StructuredLibraries,
    ];

    /// Version this step produces
    #[must_use]
    pub const fn target(self) -> FormatVersion {
        match self {
            Self::Unsupported { from } => from.next(),
            Self::StructuredLibraries => FormatVersion::new(4),
        }
    }

    /// Step producing `target`, if one is registered
    #[must_use]
    pub fn for_target(target: FormatVersion) -> Option<Self> {
        Self::ALL.into_iter().find(|step| step.target() == target)
    }

    /// Apply this step to a raw document
    ///
    /// The document is only replaced once the step has fully succeeded.
    pub(crate) fn apply(self, doc: &mut Value, ctx: &mut StepContext<'_>) -> UpgradeResult<()> {
        match self {
            Self::Unsupported { from } => Err(UpgradeError::legacy_unsupported(from)),
            Self::StructuredLibraries => {
                let legacy = LegacyProfile::deserialize(&*doc).map_err(|e| {
                    UpgradeError::malformed_document(format!("not a version 3 profile: {e}"))
                })?;
                let upgraded = upgrade_legacy_profile(legacy, ctx, 0)?;
                *doc = serde_json::to_value(&upgraded).map_err(UpgradeError::malformed_document)?;
                Ok(())
            }
        }
    }
}

/// State shared by every step of one upgrade run
#[derive(Debug)]
pub(crate) struct StepContext<'a> {
    pub(crate) options: &'a UpgradeOptions,
    /// Embedded subprocess profiles rewritten so far
    pub(crate) embedded_profiles: usize,
}

impl<'a> StepContext<'a> {
    pub(crate) fn new(options: &'a UpgradeOptions) -> Self {
        Self {
            options,
            embedded_profiles: 0,
        }
    }
}

/// Rewrite one legacy document, and every subprocess nested in it, into
/// the version 4 shape
///
/// `depth` is 0 for the top-level document.
pub(crate) fn upgrade_legacy_profile(
    legacy: LegacyProfile,
    ctx: &mut StepContext<'_>,
    depth: usize,
) -> UpgradeResult<Profile> {
    let LegacyProfile {
        mut meta,
        libs,
        threads,
        extra,
    } = legacy;

    let normalizer = LibraryNormalizer::for_abi(meta.abi.as_deref());
    let libs = normalizer.normalize_all(&libs)?;
    let threads = subprocess::walk_threads(threads, ctx, depth)?;
    meta.version = Some(UpgradeStep::StructuredLibraries.target());

    let profile = Profile {
        meta,
        libs,
        threads,
        extra,
    };

    if ctx.options.verify_library_order && !profile.libs_sorted() {
        return Err(UpgradeError::malformed_document(format!(
            "library list at nesting depth {depth} is not sorted by start address"
        )));
    }

    Ok(profile)
}

/// Give a legacy thread its `processType`
///
/// Threads that already carry one are untouched. Otherwise `Content` is
/// the main thread of a tab process and is renamed to `GeckoMain`,
/// `Plugin` is a plugin process, and anything else is the parent process.
#[must_use]
pub fn backfill_process_type(thread: LegacyThread) -> Thread {
    let LegacyThread {
        mut name,
        process_type,
        extra,
    } = thread;

    let process_type = match process_type {
        Some(process_type) => process_type,
        None => match name.as_str() {
            "Content" => {
                name = "GeckoMain".to_string();
                ProcessType::Tab
            }
            "Plugin" => ProcessType::Plugin,
            _ => ProcessType::Default,
        },
    };

    Thread {
        name,
        process_type,
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Map};

    fn legacy_thread(name: &str) -> LegacyThread {
        LegacyThread {
            name: name.to_string(),
            process_type: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn table_is_ordered_by_target() {
        let targets: Vec<_> = UpgradeStep::ALL.iter().map(|step| step.target().get()).collect();
        assert_eq!(targets, vec![1, 2, 3, 4]);
    }

    #[test]
    fn lookup_by_target() {
        assert_eq!(
            UpgradeStep::for_target(FormatVersion::new(2)),
            Some(UpgradeStep::Unsupported {
                from: FormatVersion::new(1)
            })
        );
        assert_eq!(
            UpgradeStep::for_target(FormatVersion::new(4)),
            Some(UpgradeStep::StructuredLibraries)
        );
        assert_eq!(UpgradeStep::for_target(FormatVersion::new(5)), None);
        assert_eq!(UpgradeStep::for_target(FormatVersion::UNANNOTATED), None);
    }

    #[test]
    fn unsupported_step_fails_without_touching_document() {
        let options = UpgradeOptions::default();
        let mut ctx = StepContext::new(&options);
        let mut doc = json!({"meta": {"version": 1}, "libs": "[]", "threads": []});
        let before = doc.clone();

        let err = UpgradeStep::for_target(FormatVersion::new(2))
            .unwrap()
            .apply(&mut doc, &mut ctx)
            .unwrap_err();

        assert!(matches!(
            err,
            UpgradeError::LegacyUnsupported { from, .. } if from == FormatVersion::new(1)
        ));
        assert_eq!(doc, before);
    }

    #[test]
    fn content_thread_becomes_tab_main_thread() {
        let thread = backfill_process_type(legacy_thread("Content"));
        assert_eq!(thread.name, "GeckoMain");
        assert_eq!(thread.process_type, ProcessType::Tab);
    }

    #[test]
    fn plugin_thread_keeps_name() {
        let thread = backfill_process_type(legacy_thread("Plugin"));
        assert_eq!(thread.name, "Plugin");
        assert_eq!(thread.process_type, ProcessType::Plugin);
    }

    #[test]
    fn other_threads_default() {
        let thread = backfill_process_type(legacy_thread("Compositor"));
        assert_eq!(thread.name, "Compositor");
        assert_eq!(thread.process_type, ProcessType::Default);
    }

    #[test]
    fn existing_process_type_is_kept() {
        let mut legacy = legacy_thread("Content");
        legacy.process_type = Some(ProcessType::Other("gpu".to_string()));

        let thread = backfill_process_type(legacy);
        assert_eq!(thread.name, "Content");
        assert_eq!(thread.process_type, ProcessType::Other("gpu".to_string()));
    }

    #[test]
    fn structured_libraries_step_rewrites_document() {
        let options = UpgradeOptions::default();
        let mut ctx = StepContext::new(&options);
        let libs = json!([
            {"name": "/b.so", "breakpadId": "B", "start": 20},
            {"name": "/a.so", "breakpadId": "A", "start": 10}
        ]);
        let mut doc = json!({
            "meta": {"version": 3, "abi": "x86_64-gcc3", "interval": 1},
            "libs": libs.to_string(),
            "threads": [{"name": "Content", "samples": []}]
        });

        UpgradeStep::StructuredLibraries.apply(&mut doc, &mut ctx).unwrap();

        assert_eq!(doc["meta"]["version"], 4);
        assert_eq!(doc["meta"]["interval"], 1);
        assert_eq!(doc["libs"][0]["debugName"], "a.so");
        assert_eq!(doc["libs"][0]["arch"], "x86_64");
        assert_eq!(doc["libs"][1]["debugName"], "b.so");
        assert_eq!(
            doc["threads"][0],
            json!({"name": "GeckoMain", "processType": "tab", "samples": []})
        );
    }

    #[test]
    fn structured_libraries_step_rejects_array_libs() {
        let options = UpgradeOptions::default();
        let mut ctx = StepContext::new(&options);
        let mut doc = json!({"meta": {"version": 3}, "libs": [], "threads": []});
        let before = doc.clone();

        let err = UpgradeStep::StructuredLibraries
            .apply(&mut doc, &mut ctx)
            .unwrap_err();

        assert!(matches!(err, UpgradeError::MalformedDocument(_)));
        assert_eq!(doc, before);
    }
}
