//! Upgrade configuration

use serde::{Deserialize, Serialize};

/// Options controlling an upgrade run
///
/// The target version is not configurable: every upgrade ends at
/// [`pfv_format::FormatVersion::CURRENT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeOptions {
    /// Re-check the library ordering invariant at every nesting level
    pub verify_library_order: bool,
    /// Maximum nesting of embedded subprocess profiles (`None` = unbounded)
    pub max_embedded_depth: Option<usize>,
}

impl UpgradeOptions {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With library order verification toggled
    #[inline]
    #[must_use]
    pub fn with_verify_library_order(mut self, verify: bool) -> Self {
        self.verify_library_order = verify;
        self
    }

    /// With a limit on embedded subprocess nesting
    #[inline]
    #[must_use]
    pub fn with_max_embedded_depth(mut self, depth: usize) -> Self {
        self.max_embedded_depth = Some(depth);
        self
    }
}

impl Default for UpgradeOptions {
    fn default() -> Self {
        Self {
            verify_library_order: true,
            max_embedded_depth: None,
        }
    }
}
