//! Embedded subprocess traversal
//!
//! A thread slot holding a string is a whole serialized child profile. It
//! is decoded, run through the same version 4 rewrite as its parent (not the
//! full driver loop: an embedded child is assumed to be at its parent's
//! version), re-serialized, and written back into the same slot.

use crate::error::{UpgradeError, UpgradeResult};
use crate::steps::{backfill_process_type, upgrade_legacy_profile, StepContext};
use pfv_format::{EmbeddedProfile, LegacyProfile, LegacyThread, Thread, ThreadSlot};

/// Rewrite every slot of a legacy `threads` array
///
/// Slot count and order are preserved. `depth` is the nesting depth of the
/// document that owns `slots`.
pub(crate) fn walk_threads(
    slots: Vec<ThreadSlot<LegacyThread>>,
    ctx: &mut StepContext<'_>,
    depth: usize,
) -> UpgradeResult<Vec<ThreadSlot<Thread>>> {
    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| match slot {
            ThreadSlot::Record(thread) => Ok(ThreadSlot::Record(backfill_process_type(thread))),
            ThreadSlot::Embedded(embedded) => {
                upgrade_embedded(&embedded, index, ctx, depth + 1).map(ThreadSlot::Embedded)
            }
        })
        .collect()
}

fn upgrade_embedded(
    embedded: &EmbeddedProfile,
    slot: usize,
    ctx: &mut StepContext<'_>,
    depth: usize,
) -> UpgradeResult<EmbeddedProfile> {
    if let Some(limit) = ctx.options.max_embedded_depth {
        if depth > limit {
            return Err(UpgradeError::malformed_document(format!(
                "embedded subprocess profile in thread slot {slot} is nested {depth} levels deep \
                 (limit {limit})"
            )));
        }
    }

    tracing::debug!(
        "Upgrading embedded subprocess profile in thread slot {} (depth {})",
        slot,
        depth
    );

    let child: LegacyProfile = embedded.decode().map_err(|e| {
        UpgradeError::malformed_document(format!(
            "embedded subprocess profile in thread slot {slot} is not a version 3 profile: {e}"
        ))
    })?;

    let upgraded = upgrade_legacy_profile(child, ctx, depth)?;
    ctx.embedded_profiles += 1;

    EmbeddedProfile::encode(&upgraded).map_err(UpgradeError::malformed_document)
}
